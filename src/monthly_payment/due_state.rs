//! Whether a monthly payment is paid, overdue, due soon or scheduled.

use std::fmt::Display;

use time::Date;

use crate::{
    monthly_payment::{MonthlyPayment, TrackingRecord},
    period::Period,
};

/// Payments due within this many days are due soon.
pub const DUE_SOON_DAYS: u8 = 3;

/// Where a monthly payment stands for the month containing "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueState {
    Paid { paid_date: Option<Date> },
    Overdue { days_late: u8 },
    DueSoon { days_remaining: u8 },
    Scheduled { due_day: u8 },
}

impl DueState {
    /// A short name used to style badges.
    pub fn as_str(&self) -> &'static str {
        match self {
            DueState::Paid { .. } => "paid",
            DueState::Overdue { .. } => "overdue",
            DueState::DueSoon { .. } => "due-soon",
            DueState::Scheduled { .. } => "scheduled",
        }
    }
}

fn plural_days(days: u8) -> &'static str {
    if days == 1 { "day" } else { "days" }
}

impl Display for DueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            DueState::Paid {
                paid_date: Some(date),
            } => write!(f, "Paid on {date}"),
            DueState::Paid { paid_date: None } => write!(f, "Paid"),
            DueState::Overdue { days_late } => {
                write!(f, "Overdue by {days_late} {}", plural_days(days_late))
            }
            DueState::DueSoon { days_remaining: 0 } => write!(f, "Due today"),
            DueState::DueSoon { days_remaining } => {
                write!(f, "Due in {days_remaining} {}", plural_days(days_remaining))
            }
            DueState::Scheduled { due_day } => write!(f, "Due on day {due_day}"),
        }
    }
}

/// Classify `payment` as of `today`.
///
/// A paid payment is always [DueState::Paid], whatever the date. A payment due
/// today is due soon, not overdue.
pub fn classify(
    payment: &MonthlyPayment,
    tracking: Option<&TrackingRecord>,
    today: Date,
) -> DueState {
    if let Some(tracking) = tracking.filter(|tracking| tracking.paid) {
        return DueState::Paid {
            paid_date: tracking.paid_date,
        };
    }

    let due_day = payment.due_day_in(Period::from_date(today));
    let day = today.day();

    if day > due_day {
        DueState::Overdue {
            days_late: day - due_day,
        }
    } else if due_day - day <= DUE_SOON_DAYS {
        DueState::DueSoon {
            days_remaining: due_day - day,
        }
    } else {
        DueState::Scheduled { due_day }
    }
}
