//! Income, expenses and transfers recorded against the user's accounts.

mod core;
mod create;
mod delete;
mod edit;
mod form;
mod list;

pub use core::{
    Transaction, TransactionBuilder, TransactionFilter, TransactionId, TransactionKind,
    TransactionRow, create_transaction, create_transaction_table, delete_transaction,
    get_recent_transactions, get_transaction, get_transactions, update_transaction,
};
pub use create::{create_transaction_endpoint, get_new_transaction_page};
pub use delete::delete_transaction_endpoint;
pub use edit::{get_edit_transaction_page, update_transaction_endpoint};
pub use list::get_transactions_page;
