//! Income and expense totals for the dashboard and reports, summed in SQL.

use rusqlite::Connection;

use crate::{Error, auth::UserID, period::Period, transaction::TransactionKind};

/// Shown in place of a category name for transactions without a category.
pub(crate) const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// Income and expenses for one month. Transfers are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct MonthlyTotals {
    pub income: f64,
    pub expense: f64,
}

impl MonthlyTotals {
    pub fn balance(&self) -> f64 {
        self.income - self.expense
    }

    /// The share of income left over after expenses, as a percentage.
    ///
    /// Zero when there was no income.
    pub fn savings_rate(&self) -> f64 {
        if self.income <= 0.0 {
            return 0.0;
        }

        self.balance() / self.income * 100.0
    }
}

/// The total of one kind of transaction in one category.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CategoryTotal {
    pub category_name: String,
    pub total: f64,
}

/// The totals for one month of a comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MonthSummary {
    pub period: Period,
    pub totals: MonthlyTotals,
    /// False for months without any income or expenses.
    pub has_transactions: bool,
}

pub(crate) fn get_monthly_totals(
    user_id: UserID,
    period: Period,
    connection: &Connection,
) -> Result<MonthlyTotals, Error> {
    let totals = connection.query_row(
        "SELECT
            COALESCE(SUM(CASE WHEN kind = 'income' THEN amount END), 0),
            COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount END), 0)
        FROM \"transaction\"
        WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3",
        (user_id.as_i64(), period.first_day(), period.last_day()),
        |row| {
            Ok(MonthlyTotals {
                income: row.get(0)?,
                expense: row.get(1)?,
            })
        },
    )?;

    Ok(totals)
}

/// Totals of `kind` transactions per category in `period`, largest first.
pub(crate) fn get_category_totals(
    user_id: UserID,
    period: Period,
    kind: TransactionKind,
    connection: &Connection,
) -> Result<Vec<CategoryTotal>, Error> {
    connection
        .prepare(
            "SELECT c.name, SUM(t.amount) AS total
            FROM \"transaction\" t
            LEFT JOIN category c ON c.id = t.category_id
            WHERE t.user_id = ?1 AND t.kind = ?2 AND t.date BETWEEN ?3 AND ?4
            GROUP BY t.category_id
            ORDER BY total DESC, c.name ASC",
        )?
        .query_map(
            (user_id.as_i64(), kind, period.first_day(), period.last_day()),
            |row| {
                let name: Option<String> = row.get(0)?;

                Ok(CategoryTotal {
                    category_name: name.unwrap_or_else(|| UNCATEGORIZED_LABEL.to_owned()),
                    total: row.get(1)?,
                })
            },
        )?
        .map(|maybe_total| maybe_total.map_err(|error| error.into()))
        .collect()
}

/// Totals for each of the `months` months ending with `last`, oldest first.
///
/// Months without transactions are included with zero totals.
pub(crate) fn get_monthly_comparison(
    user_id: UserID,
    last: Period,
    months: u32,
    connection: &Connection,
) -> Result<Vec<MonthSummary>, Error> {
    let first = (1..months).fold(last, |period, _| period.previous());

    let mut month_totals = connection
        .prepare(
            "SELECT substr(date, 1, 7) AS month,
                COALESCE(SUM(CASE WHEN kind = 'income' THEN amount END), 0),
                COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount END), 0)
            FROM \"transaction\"
            WHERE user_id = ?1 AND kind != 'transfer' AND date BETWEEN ?2 AND ?3
            GROUP BY month
            ORDER BY month ASC",
        )?
        .query_map(
            (user_id.as_i64(), first.first_day(), last.last_day()),
            |row| {
                Ok((
                    row.get::<_, Period>(0)?,
                    MonthlyTotals {
                        income: row.get(1)?,
                        expense: row.get(2)?,
                    },
                ))
            },
        )?
        .collect::<Result<Vec<_>, rusqlite::Error>>()?
        .into_iter()
        .peekable();

    let mut summaries = Vec::with_capacity(months as usize);
    let mut period = first;

    for _ in 0..months {
        let totals = month_totals.next_if(|(month, _)| *month == period);

        summaries.push(MonthSummary {
            period,
            totals: totals.map(|(_, totals)| totals).unwrap_or_default(),
            has_transactions: totals.is_some(),
        });

        period = period.next();
    }

    Ok(summaries)
}
