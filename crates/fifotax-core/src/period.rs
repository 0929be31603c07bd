//! Calendar month arithmetic.
//!
//! Price indices are published monthly, so index lookups are keyed by a
//! [`YearMonth`]. Stepping backwards rolls January into December of the
//! previous year.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A calendar month in a specific year.
///
/// # Examples
///
/// ```
/// use fifotax_core::YearMonth;
///
/// let jan = YearMonth::new(2024, 1).unwrap();
/// assert_eq!(jan.previous(), YearMonth::new(2023, 12).unwrap());
/// assert_eq!(jan.months_back(2), YearMonth::new(2023, 11).unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Create a year/month pair. Returns `None` unless `month` is in `1..=12`.
    #[must_use]
    pub const fn new(year: i32, month: u32) -> Option<Self> {
        if month >= 1 && month <= 12 {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The month containing `date`.
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Month number, 1 through 12.
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// The month before this one.
    #[must_use]
    pub const fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Step back `n` months.
    #[must_use]
    pub const fn months_back(self, n: u32) -> Self {
        // months since year 0, zero-based
        let total = self.year as i64 * 12 + (self.month as i64 - 1) - n as i64;
        Self {
            year: total.div_euclid(12) as i32,
            month: total.rem_euclid(12) as u32 + 1,
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
