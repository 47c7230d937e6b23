//! Account types and the queries that read and write them.

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::Deserialize;

use crate::{Error, auth::UserID};

/// The database ID of an account.
pub type AccountId = i64;

/// What sort of place the money is kept in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Notes and coins.
    Cash,
    /// An everyday bank account.
    Debit,
    /// A credit card.
    Credit,
    /// A bank account for saving money.
    Savings,
}

impl AccountKind {
    /// Every kind, in the order they are offered in forms.
    pub const ALL: [AccountKind; 4] = [
        AccountKind::Debit,
        AccountKind::Credit,
        AccountKind::Savings,
        AccountKind::Cash,
    ];

    /// The lowercase name used in forms and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Cash => "cash",
            AccountKind::Debit => "debit",
            AccountKind::Credit => "credit",
            AccountKind::Savings => "savings",
        }
    }

    /// The name shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            AccountKind::Cash => "Cash",
            AccountKind::Debit => "Debit",
            AccountKind::Credit => "Credit",
            AccountKind::Savings => "Savings",
        }
    }
}

impl ToSql for AccountKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AccountKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "cash" => Ok(AccountKind::Cash),
            "debit" => Ok(AccountKind::Debit),
            "credit" => Ok(AccountKind::Credit),
            "savings" => Ok(AccountKind::Savings),
            other => Err(FromSqlError::Other(
                format!("unknown account kind \"{other}\"").into(),
            )),
        }
    }
}

/// A bank account, credit card or wallet that transactions are drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The user that owns the account.
    pub user_id: UserID,
    /// The name of the account, unique per user.
    pub name: String,
    /// What sort of account it is.
    pub kind: AccountKind,
    /// The balance when the account was added to the app.
    pub initial_balance: f64,
}

/// An account and its current balance.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountBalance {
    /// The account the balance is for.
    pub account: Account,
    /// The initial balance plus income minus expenses.
    pub balance: f64,
}

/// Create the account table.
///
/// # Errors
///
/// Returns an error if the SQL query failed.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('cash', 'debit', 'credit', 'savings')),
            initial_balance REAL NOT NULL DEFAULT 0,
            UNIQUE(user_id, name)
        )",
        (),
    )?;

    Ok(())
}

/// Create an account for the user.
///
/// # Errors
///
/// Returns:
/// - [Error::EmptyAccountName] if `name` is empty or only whitespace,
/// - [Error::DuplicateAccountName] if the user already has an account called `name`.
pub fn create_account(
    user_id: UserID,
    name: &str,
    kind: AccountKind,
    initial_balance: f64,
    connection: &Connection,
) -> Result<Account, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::EmptyAccountName);
    }

    let id = connection
        .query_row(
            "INSERT INTO account (user_id, name, kind, initial_balance)
            VALUES (?1, ?2, ?3, ?4) RETURNING id",
            (user_id.as_i64(), name, kind, initial_balance),
            |row| row.get(0),
        )
        .map_err(|error| match error {
            // Handle unique account name constraint violation
            rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 2067 => {
                Error::DuplicateAccountName(name.to_owned())
            }
            error => error.into(),
        })?;

    Ok(Account {
        id,
        user_id,
        name: name.to_owned(),
        kind,
        initial_balance,
    })
}

/// Map a database row with the columns id, user_id, name, kind and initial_balance to an Account.
pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: row.get(2)?,
        kind: row.get(3)?,
        initial_balance: row.get(4)?,
    })
}

/// Get one of the user's accounts.
///
/// # Errors
///
/// Returns [Error::NotFound] if the account does not exist or belongs to another user.
pub fn get_account(
    user_id: UserID,
    account_id: AccountId,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .query_row(
            "SELECT id, user_id, name, kind, initial_balance FROM account
            WHERE id = ?1 AND user_id = ?2",
            (account_id, user_id.as_i64()),
            map_row_to_account,
        )
        .map_err(|error| error.into())
}

/// Rename one of the user's accounts and change its kind and initial balance.
///
/// # Errors
///
/// Returns:
/// - [Error::EmptyAccountName] if `name` is empty or only whitespace,
/// - [Error::DuplicateAccountName] if another of the user's accounts is called `name`,
/// - [Error::UpdateMissingAccount] if the account does not exist.
pub fn update_account(
    user_id: UserID,
    account_id: AccountId,
    name: &str,
    kind: AccountKind,
    initial_balance: f64,
    connection: &Connection,
) -> Result<Account, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::EmptyAccountName);
    }

    connection
        .query_row(
            "UPDATE account SET name = ?1, kind = ?2, initial_balance = ?3
            WHERE id = ?4 AND user_id = ?5
            RETURNING id, user_id, name, kind, initial_balance",
            (name, kind, initial_balance, account_id, user_id.as_i64()),
            map_row_to_account,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingAccount,
            rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 2067 => {
                Error::DuplicateAccountName(name.to_owned())
            }
            error => error.into(),
        })
}

/// Get the user's accounts ordered by name.
pub fn get_accounts(user_id: UserID, connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, kind, initial_balance FROM account
            WHERE user_id = ?1 ORDER BY name ASC",
        )?
        .query_map([user_id.as_i64()], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(|error| error.into()))
        .collect()
}

/// Get the current balance of each of the user's accounts.
///
/// Transfers do not change a balance since their destination account is not recorded.
pub fn get_account_balances(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<AccountBalance>, Error> {
    connection
        .prepare(
            "SELECT a.id, a.user_id, a.name, a.kind, a.initial_balance,
                a.initial_balance + COALESCE(SUM(
                    CASE t.kind
                        WHEN 'income' THEN t.amount
                        WHEN 'expense' THEN -t.amount
                        ELSE 0
                    END
                ), 0)
            FROM account a
            LEFT JOIN \"transaction\" t ON t.account_id = a.id
            WHERE a.user_id = ?1
            GROUP BY a.id
            ORDER BY a.name ASC",
        )?
        .query_map([user_id.as_i64()], |row| {
            Ok(AccountBalance {
                account: map_row_to_account(row)?,
                balance: row.get(5)?,
            })
        })?
        .map(|maybe_balance| maybe_balance.map_err(|error| error.into()))
        .collect()
}

/// Check that `account_id`, if given, refers to one of the user's accounts.
///
/// # Errors
///
/// Returns [Error::InvalidAccount] if the account does not exist or belongs to another user.
pub fn validate_account_id(
    user_id: UserID,
    account_id: Option<AccountId>,
    connection: &Connection,
) -> Result<(), Error> {
    let Some(id) = account_id else {
        return Ok(());
    };

    let count: i64 = connection.query_row(
        "SELECT COUNT(*) FROM account WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
        |row| row.get(0),
    )?;

    if count == 0 {
        Err(Error::InvalidAccount(account_id))
    } else {
        Ok(())
    }
}

/// Delete one of the user's accounts.
///
/// # Errors
///
/// Returns:
/// - [Error::AccountInUse] if any transaction refers to the account,
/// - [Error::DeleteMissingAccount] if the account does not exist.
pub fn delete_account(
    user_id: UserID,
    account_id: AccountId,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction_count: i64 = connection.query_row(
        "SELECT COUNT(*) FROM \"transaction\" WHERE account_id = ?1",
        [account_id],
        |row| row.get(0),
    )?;

    if transaction_count > 0 {
        return Err(Error::AccountInUse);
    }

    let rows_affected = connection.execute(
        "DELETE FROM account WHERE id = ?1 AND user_id = ?2",
        (account_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingAccount);
    }

    Ok(())
}
