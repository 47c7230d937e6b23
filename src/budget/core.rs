//! Monthly spending limits per category and how much of them has been used.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    auth::UserID,
    category::{CategoryId, validate_category_id},
    period::Period,
};

/// The database ID of a budget.
pub type BudgetId = i64;

/// A spending limit for one category in one month.
#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: BudgetId,
    pub user_id: UserID,
    pub category_id: CategoryId,
    /// The month the limit applies to.
    pub period: Period,
    /// The most the user wants to spend in the category that month.
    pub amount: f64,
}

/// A budget along with what has been spent against it.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetProgress {
    pub budget: Budget,
    pub category_name: String,
    /// The sum of the expenses in the budget's category and period.
    pub spent: f64,
}

impl BudgetProgress {
    /// Negative once the budget has been overspent.
    pub fn remaining(&self) -> f64 {
        self.budget.amount - self.spent
    }

    /// How much of the budget has been spent, as a percentage.
    pub fn percent_used(&self) -> f64 {
        if self.budget.amount <= 0.0 {
            return 0.0;
        }

        self.spent / self.budget.amount * 100.0
    }

    /// Whether the whole budget has been spent.
    pub fn is_exceeded(&self) -> bool {
        self.percent_used() >= 100.0
    }
}

pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            category_id INTEGER NOT NULL REFERENCES category(id) ON DELETE CASCADE,
            period TEXT NOT NULL,
            amount REAL NOT NULL CHECK (amount > 0),
            UNIQUE(user_id, category_id, period)
        )",
        (),
    )?;

    Ok(())
}

/// Set the budget for a category in a period, replacing the amount of an existing budget.
///
/// # Errors
///
/// Returns:
/// - [Error::NonPositiveAmount] if `amount` is not a positive, finite number,
/// - [Error::InvalidCategory] if the category does not belong to the user.
pub fn upsert_budget(
    user_id: UserID,
    category_id: CategoryId,
    period: Period,
    amount: f64,
    connection: &Connection,
) -> Result<Budget, Error> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::NonPositiveAmount(amount));
    }

    validate_category_id(user_id, Some(category_id), connection)?;

    let budget = connection.query_row(
        "INSERT INTO budget (user_id, category_id, period, amount)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(user_id, category_id, period) DO UPDATE SET amount = excluded.amount
        RETURNING id, user_id, category_id, period, amount",
        (user_id.as_i64(), category_id, period, amount),
        map_row,
    )?;

    Ok(budget)
}

/// The user's budgets for `period` with their spending, ordered by category name.
pub fn get_budgets_with_spending(
    user_id: UserID,
    period: Period,
    connection: &Connection,
) -> Result<Vec<BudgetProgress>, Error> {
    connection
        .prepare(
            "SELECT b.id, b.user_id, b.category_id, b.period, b.amount, c.name,
                COALESCE((
                    SELECT SUM(t.amount) FROM \"transaction\" t
                    WHERE t.user_id = b.user_id
                        AND t.category_id = b.category_id
                        AND t.kind = 'expense'
                        AND t.date BETWEEN ?3 AND ?4
                ), 0)
            FROM budget b
            INNER JOIN category c ON c.id = b.category_id
            WHERE b.user_id = ?1 AND b.period = ?2
            ORDER BY c.name ASC",
        )?
        .query_map(
            (
                user_id.as_i64(),
                period,
                period.first_day(),
                period.last_day(),
            ),
            |row| {
                Ok(BudgetProgress {
                    budget: map_row(row)?,
                    category_name: row.get(5)?,
                    spent: row.get(6)?,
                })
            },
        )?
        .map(|maybe_progress| maybe_progress.map_err(|error| error.into()))
        .collect()
}

/// Delete one of the user's budgets.
///
/// # Errors
///
/// Returns [Error::DeleteMissingBudget] if the budget doesn't exist.
pub fn delete_budget(user_id: UserID, id: BudgetId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingBudget);
    }

    Ok(())
}

fn map_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category_id: row.get(2)?,
        period: row.get(3)?,
        amount: row.get(4)?,
    })
}
