//! Totals for the monthly payments in a period.

use time::Date;

use crate::{
    monthly_payment::{DueState, MonthlyPayment, TrackingRecord, classify},
    period::Period,
};

/// How the user's active payments stand for one period.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PaymentSummary {
    pub paid_count: usize,
    pub total_count: usize,
    /// The sum of the unpaid payments.
    pub pending_amount: f64,
    pub overdue_count: usize,
}

impl PaymentSummary {
    pub fn pending_count(&self) -> usize {
        self.total_count - self.paid_count
    }
}

/// The date to classify payments in `period` against.
///
/// Past periods are seen from their last day and future periods from their first day.
pub fn reference_date(period: Period, today: Date) -> Date {
    let current = Period::from_date(today);

    if period < current {
        period.last_day()
    } else if period > current {
        period.first_day()
    } else {
        today
    }
}

/// Summarize the active `payments` as of `date`.
///
/// `tracking` should hold the records for the period containing `date`.
pub fn summarize(payments: &[MonthlyPayment], tracking: &[TrackingRecord], date: Date) -> PaymentSummary {
    let mut summary = PaymentSummary::default();

    for payment in payments.iter().filter(|payment| payment.active) {
        let record = tracking.iter().find(|record| record.payment_id == payment.id);
        summary.total_count += 1;

        match classify(payment, record, date) {
            DueState::Paid { .. } => summary.paid_count += 1,
            DueState::Overdue { .. } => {
                summary.overdue_count += 1;
                summary.pending_amount += payment.amount.get();
            }
            DueState::DueSoon { .. } | DueState::Scheduled { .. } => {
                summary.pending_amount += payment.amount.get();
            }
        }
    }

    summary
}
