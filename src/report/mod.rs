//! Reports on where the user's money went.
//!
//! The reports page compares income with expenses for a month, breaks both
//! down by category, compares the last few months and lists account balances.
//! Every total is summed in SQL.

mod comparison;
mod page;

pub use page::get_reports_page;
