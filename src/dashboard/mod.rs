//! Dashboard module
//!
//! An overview of the current month: income and expenses, spending by
//! category, account balances, monthly payments, budget alerts and the most
//! recent transactions.

mod aggregation;
mod cards;
mod handlers;

pub use handlers::get_dashboard_page;

pub(crate) use aggregation::{
    CategoryTotal, MonthSummary, MonthlyTotals, get_category_totals, get_monthly_comparison,
    get_monthly_totals,
};
