//! The transaction model and the database queries for transactions.

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    account::{AccountId, validate_account_id},
    auth::UserID,
    category::{CategoryId, validate_category_id},
    html::format_currency,
    period::Period,
};

/// The database ID of a transaction.
pub type TransactionId = i64;

/// Which way the money moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming into an account.
    Income,
    /// Money going out of an account.
    Expense,
    /// Money moved between the user's own accounts.
    Transfer,
}

impl TransactionKind {
    /// Every kind, in the order they are offered in forms.
    pub const ALL: [TransactionKind; 3] = [
        TransactionKind::Expense,
        TransactionKind::Income,
        TransactionKind::Transfer,
    ];

    /// The lowercase name used in forms and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
            TransactionKind::Transfer => "transfer",
        }
    }

    /// The name shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
            TransactionKind::Transfer => "Transfer",
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            "transfer" => Ok(TransactionKind::Transfer),
            other => Err(FromSqlError::Other(
                format!("unknown transaction kind \"{other}\"").into(),
            )),
        }
    }
}

/// An event where money was earned, spent or moved.
///
/// To create a new `Transaction`, use [TransactionBuilder].
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that recorded the transaction.
    pub user_id: UserID,
    /// Whether the money came in, went out or moved between accounts.
    pub kind: TransactionKind,
    /// The amount of money, always greater than zero. The direction is given by `kind`.
    pub amount: f64,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The category the transaction belongs to, if any.
    pub category_id: Option<CategoryId>,
    /// The account the money moved in or out of.
    pub account_id: AccountId,
}

impl Transaction {
    /// The amount as currency, signed by the direction the money moved.
    ///
    /// Transfers are shown without a sign.
    pub fn formatted_amount(&self) -> String {
        match self.kind {
            TransactionKind::Income => format!("+{}", format_currency(self.amount)),
            TransactionKind::Expense => format_currency(-self.amount),
            TransactionKind::Transfer => format_currency(self.amount),
        }
    }
}

/// A builder for creating [Transaction]s.
///
/// The date defaults to today (UTC) and the description to an empty string.
///
/// # Examples
///
/// ```ignore
/// let builder = TransactionBuilder::new(TransactionKind::Expense, 45.99, account_id)
///     .date(date!(2025 - 01 - 15))
///     .description("Coffee beans")
///     .category_id(Some(groceries_id));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionBuilder {
    kind: TransactionKind,
    amount: f64,
    account_id: AccountId,
    date: Date,
    description: String,
    category_id: Option<CategoryId>,
}

impl TransactionBuilder {
    /// Start a transaction of `kind` for `amount` dollars against `account_id`.
    pub fn new(kind: TransactionKind, amount: f64, account_id: AccountId) -> Self {
        Self {
            kind,
            amount,
            account_id,
            date: OffsetDateTime::now_utc().date(),
            description: String::new(),
            category_id: None,
        }
    }

    /// Set the date the transaction happened.
    pub fn date(mut self, date: Date) -> Self {
        self.date = date;
        self
    }

    /// Set the description, surrounding whitespace is removed.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.trim().to_owned();
        self
    }

    /// Set the category, `None` leaves the transaction uncategorized.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }
}

/// A transaction with the names of its category and account for display.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    pub transaction: Transaction,
    /// `None` for uncategorized transactions.
    pub category_name: Option<String>,
    pub account_name: String,
}

/// Which of the user's transactions to list.
///
/// Fields left as `None` do not filter anything.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFilter {
    /// The month to list, this is always required.
    pub period: Period,
    pub kind: Option<TransactionKind>,
    pub category_id: Option<CategoryId>,
    pub account_id: Option<AccountId>,
    /// Matched anywhere in the description, ignoring ASCII case.
    pub search: Option<String>,
}

impl TransactionFilter {
    /// Every transaction in `period`.
    pub fn for_period(period: Period) -> Self {
        Self {
            period,
            kind: None,
            category_id: None,
            account_id: None,
            search: None,
        }
    }

    /// The search text as a LIKE pattern with the wildcards in it escaped.
    fn search_pattern(&self) -> Option<String> {
        self.search.as_deref().map(|search| {
            let escaped = search
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");

            format!("%{escaped}%")
        })
    }
}

fn validate_builder(
    user_id: UserID,
    builder: &TransactionBuilder,
    connection: &Connection,
) -> Result<(), Error> {
    if !builder.amount.is_finite() || builder.amount <= 0.0 {
        return Err(Error::NonPositiveAmount(builder.amount));
    }

    validate_category_id(user_id, builder.category_id, connection)?;
    validate_account_id(user_id, Some(builder.account_id), connection)
}

/// Create a new transaction for the user.
///
/// # Errors
///
/// This function will return a:
/// - [Error::NonPositiveAmount] if the amount is not a finite number greater than zero,
/// - [Error::InvalidCategory] if the category is not one of the user's categories,
/// - [Error::InvalidAccount] if the account is not one of the user's accounts,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    validate_builder(user_id, &builder, connection)?;

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\"
                (user_id, kind, amount, date, description, category_id, account_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id, user_id, kind, amount, date, description, category_id, account_id",
        )?
        .query_row(
            (
                user_id.as_i64(),
                builder.kind,
                builder.amount,
                builder.date,
                builder.description,
                builder.category_id,
                builder.account_id,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve one of the user's transactions by its `id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if `id` does not refer to one of the user's transactions.
pub fn get_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, user_id, kind, amount, date, description, category_id, account_id
            FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((id, user_id.as_i64()), map_transaction_row)?;

    Ok(transaction)
}

/// Replace one of the user's transactions with the values in `builder`.
///
/// Tracking records already paid by the transaction keep their link.
///
/// # Errors
///
/// This function will return a:
/// - [Error::NonPositiveAmount], [Error::InvalidCategory] or [Error::InvalidAccount]
///   for the same reasons as [create_transaction],
/// - [Error::UpdateMissingTransaction] if `id` is not one of the user's transactions,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    user_id: UserID,
    id: TransactionId,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    validate_builder(user_id, &builder, connection)?;

    connection
        .prepare(
            "UPDATE \"transaction\"
            SET kind = ?1, amount = ?2, date = ?3, description = ?4, category_id = ?5,
                account_id = ?6
            WHERE id = ?7 AND user_id = ?8
            RETURNING id, user_id, kind, amount, date, description, category_id, account_id",
        )?
        .query_row(
            (
                builder.kind,
                builder.amount,
                builder.date,
                builder.description,
                builder.category_id,
                builder.account_id,
                id,
                user_id.as_i64(),
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingTransaction,
            error => error.into(),
        })
}

/// The user's transactions that pass `filter`, newest first.
pub fn get_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<TransactionRow>, Error> {
    connection
        .prepare(
            "SELECT t.id, t.user_id, t.kind, t.amount, t.date, t.description, t.category_id,
                t.account_id, c.name, a.name
            FROM \"transaction\" t
            INNER JOIN account a ON a.id = t.account_id
            LEFT JOIN category c ON c.id = t.category_id
            WHERE t.user_id = ?1 AND t.date BETWEEN ?2 AND ?3
                AND (?4 IS NULL OR t.kind = ?4)
                AND (?5 IS NULL OR t.category_id = ?5)
                AND (?6 IS NULL OR t.account_id = ?6)
                AND (?7 IS NULL OR t.description LIKE ?7 ESCAPE '\\')
            ORDER BY t.date DESC, t.id DESC",
        )?
        .query_map(
            (
                user_id.as_i64(),
                filter.period.first_day(),
                filter.period.last_day(),
                filter.kind,
                filter.category_id,
                filter.account_id,
                filter.search_pattern(),
            ),
            map_row_with_names,
        )?
        .map(|maybe_row| maybe_row.map_err(|error| error.into()))
        .collect()
}

/// The user's `limit` most recent transactions, newest first.
pub fn get_recent_transactions(
    user_id: UserID,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<TransactionRow>, Error> {
    connection
        .prepare(
            "SELECT t.id, t.user_id, t.kind, t.amount, t.date, t.description, t.category_id,
                t.account_id, c.name, a.name
            FROM \"transaction\" t
            INNER JOIN account a ON a.id = t.account_id
            LEFT JOIN category c ON c.id = t.category_id
            WHERE t.user_id = ?1
            ORDER BY t.date DESC, t.id DESC
            LIMIT ?2",
        )?
        .query_map((user_id.as_i64(), limit), map_row_with_names)?
        .map(|maybe_row| maybe_row.map_err(|error| error.into()))
        .collect()
}

/// Delete one of the user's transactions.
///
/// Tracking records that were satisfied by the transaction stay paid but lose their link.
///
/// # Errors
///
/// Returns [Error::DeleteMissingTransaction] if the transaction does not exist.
pub fn delete_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            kind TEXT NOT NULL CHECK (kind IN ('income', 'expense', 'transfer')),
            amount REAL NOT NULL CHECK (amount > 0),
            date TEXT NOT NULL,
            description TEXT NOT NULL,
            category_id INTEGER REFERENCES category(id) ON DELETE SET NULL,
            account_id INTEGER NOT NULL REFERENCES account(id)
        )",
        (),
    )?;

    // Used by the monthly summaries on the dashboard and budget pages.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date)",
        (),
    )?;

    Ok(())
}

fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        kind: row.get(2)?,
        amount: row.get(3)?,
        date: row.get(4)?,
        description: row.get(5)?,
        category_id: row.get(6)?,
        account_id: row.get(7)?,
    })
}

fn map_row_with_names(row: &Row) -> Result<TransactionRow, rusqlite::Error> {
    Ok(TransactionRow {
        transaction: map_transaction_row(row)?,
        category_name: row.get(8)?,
        account_name: row.get(9)?,
    })
}
