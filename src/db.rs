//! Creates the application's tables.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error,
    account::create_account_table,
    auth::create_user_table,
    budget::create_budget_table,
    category::create_category_table,
    monthly_payment::{create_monthly_payment_table, create_payment_tracking_table},
    settings::create_notification_preferences_table,
    transaction::create_transaction_table,
};

/// Create all of the application's tables if they do not already exist.
///
/// Foreign key enforcement is switched on for `connection` first, since
/// deletes rely on `ON DELETE` clauses and SQLite leaves it off by default.
///
/// # Errors
///
/// Returns an [Error::SqlError] if any of the tables could not be created.
/// The tables are created in one transaction, so either all of them exist
/// afterwards or none of the new ones do.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_account_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_monthly_payment_table(&transaction)?;
    create_payment_tracking_table(&transaction)?;
    create_notification_preferences_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
