//! Accounts that money moves in and out of.

mod core;
mod create;
mod delete;
mod edit;
mod list;

pub use core::{
    Account, AccountBalance, AccountId, AccountKind, create_account, create_account_table,
    get_account, get_account_balances, get_accounts, update_account, validate_account_id,
};
pub use create::{create_account_endpoint, get_new_account_page};
pub use delete::delete_account_endpoint;
pub use edit::{get_edit_account_page, update_account_endpoint};
pub use list::get_accounts_page;

pub(crate) use core::delete_account;
