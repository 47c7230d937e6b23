//! Averages and extremes over a run of months.

use crate::dashboard::MonthSummary;

/// The month counts offered for the monthly comparison.
pub(super) const MONTH_OPTIONS: [u32; 3] = [3, 6, 12];

/// The number of months compared when none is requested.
pub(super) const DEFAULT_MONTHS: u32 = 6;

/// Round `requested` up to the nearest offered month count, at most twelve.
pub(super) fn clamp_months(requested: Option<u32>) -> u32 {
    match requested {
        None => DEFAULT_MONTHS,
        Some(months) => MONTH_OPTIONS
            .into_iter()
            .find(|option| months <= *option)
            .unwrap_or(MONTH_OPTIONS[MONTH_OPTIONS.len() - 1]),
    }
}

/// Averages and the best and worst months over the months that had transactions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct ComparisonStats {
    pub average_income: f64,
    pub average_expense: f64,
    /// The month with the largest balance.
    pub best: MonthSummary,
    /// The month with the smallest balance.
    pub worst: MonthSummary,
}

impl ComparisonStats {
    /// `None` when none of `months` had transactions.
    pub fn new(months: &[MonthSummary]) -> Option<Self> {
        let active: Vec<&MonthSummary> = months.iter().filter(|month| month.has_transactions).collect();
        let count = active.len() as f64;

        let best = active
            .iter()
            .copied()
            .max_by(|a, b| a.totals.balance().total_cmp(&b.totals.balance()))?;
        let worst = active
            .iter()
            .copied()
            .min_by(|a, b| a.totals.balance().total_cmp(&b.totals.balance()))?;

        Some(Self {
            average_income: active.iter().map(|month| month.totals.income).sum::<f64>() / count,
            average_expense: active.iter().map(|month| month.totals.expense).sum::<f64>() / count,
            best: *best,
            worst: *worst,
        })
    }

    pub fn average_balance(&self) -> f64 {
        self.average_income - self.average_expense
    }
}
