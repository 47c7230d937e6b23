//! Calendar months, written as `YYYY-MM`.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Deserialize;
use time::{Date, Duration, Month};

use crate::Error;

/// A calendar year and month, e.g. March 2025.
///
/// Budgets and monthly payment tracking are kept per period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    // Always the first day of the month.
    first_day: Date,
}

impl Period {
    /// The period that `date` falls in.
    pub fn from_date(date: Date) -> Self {
        Self {
            first_day: date - Duration::days(i64::from(date.day()) - 1),
        }
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    pub fn month(&self) -> Month {
        self.first_day.month()
    }

    /// The number of days in the month, accounting for leap years.
    pub fn days_in_month(&self) -> u8 {
        self.month().length(self.year())
    }

    /// The first day of the month.
    pub fn first_day(&self) -> Date {
        self.first_day
    }

    /// The last day of the month.
    pub fn last_day(&self) -> Date {
        self.first_day + Duration::days(i64::from(self.days_in_month()) - 1)
    }

    /// Whether `date` falls in this period.
    pub fn contains(&self, date: Date) -> bool {
        self.first_day <= date && date <= self.last_day()
    }

    /// The month before this one.
    ///
    /// The earliest representable month is its own predecessor.
    pub fn previous(&self) -> Self {
        match self.first_day.previous_day() {
            Some(date) => Self::from_date(date),
            None => *self,
        }
    }

    /// The month after this one.
    ///
    /// The latest representable month is its own successor.
    pub fn next(&self) -> Self {
        match self.last_day().next_day() {
            Some(date) => Self::from_date(date),
            None => *self,
        }
    }
}

impl FromStr for Period {
    type Err = Error;

    /// Parse a period in the format `YYYY-MM`, e.g. "2025-03".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidPeriod(s.to_owned());

        let (year, month) = s.split_once('-').ok_or_else(invalid)?;

        if year.len() != 4
            || month.len() != 2
            || !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;
        let month = Month::try_from(month).map_err(|_| invalid())?;
        let first_day = Date::from_calendar_date(year, month, 1).map_err(|_| invalid())?;

        Ok(Self { first_day })
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), u8::from(self.month()))
    }
}

impl ToSql for Period {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Period {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(error.to_string().into()))
    }
}

/// The query string for pages that show a single period, e.g. `?period=2025-03`.
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    /// The period as YYYY-MM, `None` means the current month.
    pub period: Option<String>,
}

impl PeriodQuery {
    /// The requested period, or the one containing `today` if none was given.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidPeriod] if the requested period cannot be parsed.
    pub fn period_or_current(&self, today: Date) -> Result<Period, Error> {
        match self.period.as_deref() {
            None | Some("") => Ok(Period::from_date(today)),
            Some(text) => text.parse(),
        }
    }
}

#[cfg(test)]
mod period_tests {
    use time::{Month, macros::date};

    use crate::Error;

    use super::{Period, PeriodQuery};

    #[test]
    fn from_date_uses_year_and_month() {
        let period = Period::from_date(date!(2025 - 03 - 07));

        assert_eq!(period.year(), 2025);
        assert_eq!(period.month(), Month::March);
        assert_eq!(period.to_string(), "2025-03");
    }

    #[test]
    fn parses_valid_period() {
        let period: Period = "2024-12".parse().unwrap();

        assert_eq!(period, Period::from_date(date!(2024 - 12 - 31)));
    }

    #[test]
    fn rejects_malformed_periods() {
        for text in ["2025-13", "2025-00", "2025-3", "25-03", "2025/03", "2025-03-01", "", "abcd-ef"] {
            assert_eq!(
                text.parse::<Period>(),
                Err(Error::InvalidPeriod(text.to_owned())),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(Period::from_date(date!(2024 - 02 - 10)).days_in_month(), 29);
        assert_eq!(Period::from_date(date!(2025 - 02 - 10)).days_in_month(), 28);
        assert_eq!(Period::from_date(date!(2025 - 04 - 10)).days_in_month(), 30);
        assert_eq!(Period::from_date(date!(2025 - 01 - 10)).days_in_month(), 31);
    }

    #[test]
    fn previous_and_next_cross_year_boundaries() {
        let january = Period::from_date(date!(2025 - 01 - 15));

        assert_eq!(january.previous().to_string(), "2024-12");
        assert_eq!(january.previous().next(), january);
        assert_eq!(
            Period::from_date(date!(2024 - 12 - 01)).next().to_string(),
            "2025-01"
        );
    }

    #[test]
    fn contains_only_dates_in_the_month() {
        let period = Period::from_date(date!(2025 - 02 - 01));

        assert!(period.contains(date!(2025 - 02 - 01)));
        assert!(period.contains(date!(2025 - 02 - 28)));
        assert!(!period.contains(date!(2025 - 03 - 01)));
        assert!(!period.contains(date!(2025 - 01 - 31)));
    }

    #[test]
    fn query_defaults_to_current_period() {
        let today = date!(2025 - 06 - 18);

        assert_eq!(
            PeriodQuery::default().period_or_current(today),
            Ok(Period::from_date(today))
        );
        assert_eq!(
            PeriodQuery {
                period: Some("2025-01".to_owned())
            }
            .period_or_current(today)
            .map(|period| period.to_string()),
            Ok("2025-01".to_owned())
        );
    }
}
