//! Whether each monthly payment has been paid in a given month.

use rusqlite::{Connection, Row, params_from_iter};
use time::Date;

use crate::{
    Error, monthly_payment::MonthlyPaymentId, period::Period, transaction::TransactionId,
};

/// The paid status of one monthly payment for one period.
///
/// There is at most one record per payment and period.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingRecord {
    pub id: i64,
    pub payment_id: MonthlyPaymentId,
    pub period: Period,
    pub paid: bool,
    /// Only set when `paid` is true.
    pub paid_date: Option<Date>,
    /// The transaction that paid for the payment, if it was matched automatically.
    pub transaction_id: Option<TransactionId>,
}

/// The new values for a [TrackingRecord].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingUpdate {
    paid: bool,
    paid_date: Option<Date>,
    transaction_id: Option<TransactionId>,
}

impl TrackingUpdate {
    /// Paid on `date` by the transaction `transaction_id`.
    pub fn paid_by_transaction(date: Date, transaction_id: TransactionId) -> Self {
        Self {
            paid: true,
            paid_date: Some(date),
            transaction_id: Some(transaction_id),
        }
    }

    /// Marked as paid on `date` by the user.
    pub fn paid_manually(date: Date) -> Self {
        Self {
            paid: true,
            paid_date: Some(date),
            transaction_id: None,
        }
    }

    /// Clear the paid flag and both the paid date and the transaction.
    pub fn unpaid() -> Self {
        Self {
            paid: false,
            paid_date: None,
            transaction_id: None,
        }
    }
}

/// Create the payment tracking table.
///
/// # Errors
///
/// Returns an error if the SQL query failed.
pub fn create_payment_tracking_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS payment_tracking (
            id INTEGER PRIMARY KEY,
            payment_id INTEGER NOT NULL REFERENCES monthly_payment(id) ON DELETE CASCADE,
            period TEXT NOT NULL,
            paid INTEGER NOT NULL DEFAULT 0,
            paid_date TEXT,
            transaction_id INTEGER REFERENCES \"transaction\"(id) ON DELETE SET NULL,
            UNIQUE(payment_id, period),
            CHECK (paid = 1 OR paid_date IS NULL)
        )",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<TrackingRecord, rusqlite::Error> {
    Ok(TrackingRecord {
        id: row.get(0)?,
        payment_id: row.get(1)?,
        period: row.get(2)?,
        paid: row.get(3)?,
        paid_date: row.get(4)?,
        transaction_id: row.get(5)?,
    })
}

/// Write the tracking record for `payment_id` in `period`, creating it if needed.
///
/// This is a single statement, concurrent writers to the same key leave one
/// record holding the values of the last write.
pub fn upsert_tracking_record(
    payment_id: MonthlyPaymentId,
    period: Period,
    update: TrackingUpdate,
    connection: &Connection,
) -> Result<TrackingRecord, Error> {
    let record = connection.query_row(
        "INSERT INTO payment_tracking (payment_id, period, paid, paid_date, transaction_id)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(payment_id, period) DO UPDATE SET
            paid = excluded.paid,
            paid_date = excluded.paid_date,
            transaction_id = excluded.transaction_id
        RETURNING id, payment_id, period, paid, paid_date, transaction_id",
        (
            payment_id,
            period,
            update.paid,
            update.paid_date,
            update.transaction_id,
        ),
        map_row,
    )?;

    Ok(record)
}

/// The tracking records in `period` for the given payments.
///
/// Payments that have not been touched in `period` have no record.
pub fn get_tracking_records(
    period: Period,
    payment_ids: &[MonthlyPaymentId],
    connection: &Connection,
) -> Result<Vec<TrackingRecord>, Error> {
    if payment_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; payment_ids.len()].join(", ");
    let sql = format!(
        "SELECT id, payment_id, period, paid, paid_date, transaction_id
        FROM payment_tracking
        WHERE period = ? AND payment_id IN ({placeholders})
        ORDER BY payment_id"
    );

    let period = period.to_string();
    let params = std::iter::once(&period as &dyn rusqlite::ToSql)
        .chain(payment_ids.iter().map(|id| id as &dyn rusqlite::ToSql));

    connection
        .prepare(&sql)?
        .query_map(params_from_iter(params), map_row)?
        .map(|maybe_record| maybe_record.map_err(|error| error.into()))
        .collect()
}
