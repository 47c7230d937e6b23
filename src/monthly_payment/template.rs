//! Recurring monthly payment templates, e.g. rent due on the 1st of every month.

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};

use crate::{
    Error,
    account::{AccountId, validate_account_id},
    auth::UserID,
    category::{CategoryId, validate_category_id},
    period::Period,
};

/// The database ID of a monthly payment.
pub type MonthlyPaymentId = i64;

/// The day of the month a payment is due, from 1 to 31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DayOfMonth(u8);

impl DayOfMonth {
    /// # Errors
    ///
    /// Returns [Error::InvalidDayOfMonth] if `day` is not between 1 and 31.
    pub fn new(day: i64) -> Result<Self, Error> {
        match u8::try_from(day) {
            Ok(day @ 1..=31) => Ok(Self(day)),
            _ => Err(Error::InvalidDayOfMonth(day)),
        }
    }

    /// The day as a number from 1 to 31.
    pub fn get(&self) -> u8 {
        self.0
    }
}

impl ToSql for DayOfMonth {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for DayOfMonth {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        DayOfMonth::new(value.as_i64()?).map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// An amount of money owed each month, always a finite number greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct PaymentAmount(f64);

impl PaymentAmount {
    /// # Errors
    ///
    /// Returns [Error::NonPositiveAmount] if `amount` is zero, negative or not finite.
    pub fn new(amount: f64) -> Result<Self, Error> {
        if amount.is_finite() && amount > 0.0 {
            Ok(Self(amount))
        } else {
            Err(Error::NonPositiveAmount(amount))
        }
    }

    /// The amount in dollars.
    pub fn get(&self) -> f64 {
        self.0
    }
}

impl ToSql for PaymentAmount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for PaymentAmount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        PaymentAmount::new(value.as_f64()?).map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A payment the user expects to make every month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyPayment {
    pub id: MonthlyPaymentId,
    pub user_id: UserID,
    pub description: String,
    pub amount: PaymentAmount,
    /// The day the payment falls due, clamped to shorter months.
    pub day_of_month: DayOfMonth,
    /// Only expenses in this category can be matched to the payment.
    pub category_id: Option<CategoryId>,
    pub account_id: Option<AccountId>,
    /// Inactive payments are kept for their history but are never due.
    pub active: bool,
    pub notes: Option<String>,
}

impl MonthlyPayment {
    /// The day the payment is due in `period`.
    ///
    /// Days past the end of a short month fall on its last day, e.g. a payment
    /// due on the 31st is due on the 28th of February 2025.
    pub fn due_day_in(&self, period: Period) -> u8 {
        self.day_of_month.get().min(period.days_in_month())
    }
}

/// The fields needed to create or update a [MonthlyPayment].
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyPaymentBuilder {
    description: String,
    amount: PaymentAmount,
    day_of_month: DayOfMonth,
    category_id: Option<CategoryId>,
    account_id: Option<AccountId>,
    active: bool,
    notes: Option<String>,
}

impl MonthlyPaymentBuilder {
    /// Start a payment of `amount` dollars due on `day_of_month`.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyDescription] if `description` is blank, or
    /// [Error::NonPositiveAmount] if `amount` is not greater than zero.
    pub fn new(description: &str, amount: f64, day_of_month: DayOfMonth) -> Result<Self, Error> {
        let description = description.trim();
        if description.is_empty() {
            return Err(Error::EmptyDescription);
        }

        Ok(Self {
            description: description.to_owned(),
            amount: PaymentAmount::new(amount)?,
            day_of_month,
            category_id: None,
            account_id: None,
            active: true,
            notes: None,
        })
    }

    /// Set the category expenses must have to pay for this payment.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Set the account the payment is usually made from.
    pub fn account_id(mut self, account_id: Option<AccountId>) -> Self {
        self.account_id = account_id;
        self
    }

    /// New payments are active unless this is set to false.
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Blank notes are stored as no notes.
    pub fn notes(mut self, notes: Option<&str>) -> Self {
        self.notes = notes
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
            .map(str::to_owned);
        self
    }
}

/// What happened to a monthly payment the user asked to delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The payment had no history and is gone.
    Deleted,
    /// The payment has been tracked before, so it was kept but made inactive.
    Deactivated,
}

/// Create the monthly payment table.
///
/// # Errors
///
/// Returns an error if the SQL query failed.
pub fn create_monthly_payment_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS monthly_payment (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            description TEXT NOT NULL CHECK (length(trim(description)) > 0),
            amount REAL NOT NULL CHECK (amount > 0),
            day_of_month INTEGER NOT NULL CHECK (day_of_month BETWEEN 1 AND 31),
            category_id INTEGER REFERENCES category(id) ON DELETE SET NULL,
            account_id INTEGER REFERENCES account(id) ON DELETE SET NULL,
            active INTEGER NOT NULL DEFAULT 1,
            notes TEXT
        )",
        (),
    )?;

    // The matcher looks up payments by category for every new expense.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_monthly_payment_user_category
        ON monthly_payment(user_id, category_id)",
        (),
    )?;

    Ok(())
}

const SELECT_COLUMNS: &str = "SELECT id, user_id, description, amount, day_of_month, \
    category_id, account_id, active, notes FROM monthly_payment";

fn map_row(row: &Row) -> Result<MonthlyPayment, rusqlite::Error> {
    Ok(MonthlyPayment {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        description: row.get(2)?,
        amount: row.get(3)?,
        day_of_month: row.get(4)?,
        category_id: row.get(5)?,
        account_id: row.get(6)?,
        active: row.get(7)?,
        notes: row.get(8)?,
    })
}

/// Create a monthly payment for the user.
///
/// # Errors
///
/// Returns [Error::InvalidCategory] or [Error::InvalidAccount] if the category
/// or account do not belong to the user.
pub fn create_monthly_payment(
    user_id: UserID,
    builder: MonthlyPaymentBuilder,
    connection: &Connection,
) -> Result<MonthlyPayment, Error> {
    validate_category_id(user_id, builder.category_id, connection)?;
    validate_account_id(user_id, builder.account_id, connection)?;

    let payment = connection.query_row(
        "INSERT INTO monthly_payment
            (user_id, description, amount, day_of_month, category_id, account_id, active, notes)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        RETURNING id, user_id, description, amount, day_of_month, category_id, account_id,
            active, notes",
        (
            user_id.as_i64(),
            builder.description,
            builder.amount,
            builder.day_of_month,
            builder.category_id,
            builder.account_id,
            builder.active,
            builder.notes,
        ),
        map_row,
    )?;

    Ok(payment)
}

/// # Errors
///
/// Returns [Error::NotFound] if the payment does not exist or belongs to another user.
pub fn get_monthly_payment(
    user_id: UserID,
    id: MonthlyPaymentId,
    connection: &Connection,
) -> Result<MonthlyPayment, Error> {
    let payment = connection.query_row(
        &format!("{SELECT_COLUMNS} WHERE id = ?1 AND user_id = ?2"),
        (id, user_id.as_i64()),
        map_row,
    )?;

    Ok(payment)
}

/// Replace every field of one of the user's monthly payments.
///
/// # Errors
///
/// Returns:
/// - [Error::UpdateMissingMonthlyPayment] if the payment does not exist,
/// - [Error::InvalidCategory] or [Error::InvalidAccount] if the category or
///   account do not belong to the user.
pub fn update_monthly_payment(
    user_id: UserID,
    id: MonthlyPaymentId,
    builder: MonthlyPaymentBuilder,
    connection: &Connection,
) -> Result<MonthlyPayment, Error> {
    validate_category_id(user_id, builder.category_id, connection)?;
    validate_account_id(user_id, builder.account_id, connection)?;

    connection
        .query_row(
            "UPDATE monthly_payment
            SET description = ?1, amount = ?2, day_of_month = ?3, category_id = ?4,
                account_id = ?5, active = ?6, notes = ?7
            WHERE id = ?8 AND user_id = ?9
            RETURNING id, user_id, description, amount, day_of_month, category_id, account_id,
                active, notes",
            (
                builder.description,
                builder.amount,
                builder.day_of_month,
                builder.category_id,
                builder.account_id,
                builder.active,
                builder.notes,
                id,
                user_id.as_i64(),
            ),
            map_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingMonthlyPayment,
            error => error.into(),
        })
}

fn query_payments(
    sql: &str,
    params: impl rusqlite::Params,
    connection: &Connection,
) -> Result<Vec<MonthlyPayment>, Error> {
    connection
        .prepare(sql)?
        .query_map(params, map_row)?
        .map(|maybe_payment| maybe_payment.map_err(|error| error.into()))
        .collect()
}

/// The user's active monthly payments ordered by due day.
pub fn get_active_monthly_payments(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<MonthlyPayment>, Error> {
    query_payments(
        &format!(
            "{SELECT_COLUMNS} WHERE user_id = ?1 AND active = 1 \
            ORDER BY day_of_month ASC, description ASC"
        ),
        [user_id.as_i64()],
        connection,
    )
}

/// The user's active monthly payments in one category.
pub fn get_active_monthly_payments_in_category(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Vec<MonthlyPayment>, Error> {
    query_payments(
        &format!(
            "{SELECT_COLUMNS} WHERE user_id = ?1 AND category_id = ?2 AND active = 1 \
            ORDER BY day_of_month ASC, description ASC"
        ),
        (user_id.as_i64(), category_id),
        connection,
    )
}

/// All of the user's monthly payments, active ones first.
pub fn get_all_monthly_payments(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<MonthlyPayment>, Error> {
    query_payments(
        &format!(
            "{SELECT_COLUMNS} WHERE user_id = ?1 \
            ORDER BY active DESC, day_of_month ASC, description ASC"
        ),
        [user_id.as_i64()],
        connection,
    )
}

/// Delete one of the user's monthly payments, or deactivate it if it has been tracked.
///
/// # Errors
///
/// Returns [Error::DeleteMissingMonthlyPayment] if the payment does not exist.
pub fn delete_or_deactivate_monthly_payment(
    user_id: UserID,
    id: MonthlyPaymentId,
    connection: &Connection,
) -> Result<Removal, Error> {
    let transaction = connection.unchecked_transaction()?;

    let owned: i64 = transaction.query_row(
        "SELECT COUNT(*) FROM monthly_payment WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
        |row| row.get(0),
    )?;

    if owned == 0 {
        return Err(Error::DeleteMissingMonthlyPayment);
    }

    let tracking_count: i64 = transaction.query_row(
        "SELECT COUNT(*) FROM payment_tracking WHERE payment_id = ?1",
        [id],
        |row| row.get(0),
    )?;

    let removal = if tracking_count > 0 {
        transaction.execute("UPDATE monthly_payment SET active = 0 WHERE id = ?1", [id])?;
        Removal::Deactivated
    } else {
        transaction.execute("DELETE FROM monthly_payment WHERE id = ?1", [id])?;
        Removal::Deleted
    };

    transaction.commit()?;

    Ok(removal)
}
