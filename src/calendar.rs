//! Calendar and period utilities shared by every engine
//!
//! Pure date arithmetic: month stepping with day-of-month clamping, month
//! bucketing via [`YearMonth`], and day counts. Stepping never produces an
//! invalid calendar date (Jan 31 + 1 month lands on the last day of February).

use chrono::{Datelike, NaiveDate};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Calendar month bucket used as the key for all monthly series.
///
/// Ordered chronologically; serializes as `"YYYY-MM"` so it can key the
/// published monthly mappings directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        debug_assert!((1..=12).contains(&month));
        Self { year, month }
    }

    /// Bucket for the month containing `date`
    pub fn from_date(date: NaiveDate) -> Self {
        Self { year: date.year(), month: date.month() }
    }

    /// The following calendar month
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    /// First day of this month
    pub fn first_day(self) -> NaiveDate {
        // Month is validated at construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("YearMonth holds a valid month")
    }

    /// Inclusive iterator from `self` through `end`
    pub fn range_inclusive(self, end: YearMonth) -> impl Iterator<Item = YearMonth> {
        let mut current = self;
        std::iter::from_fn(move || {
            if current > end {
                None
            } else {
                let ym = current;
                current = current.next();
                Some(ym)
            }
        })
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got `{s}`"))?;
        let year: i32 = year.parse().map_err(|_| format!("bad year in `{s}`"))?;
        let month: u32 = month.parse().map_err(|_| format!("bad month in `{s}`"))?;
        if !(1..=12).contains(&month) {
            return Err(format!("month out of range in `{s}`"));
        }
        Ok(Self { year, month })
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// First day of the month containing `date`
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    YearMonth::from_date(date).first_day()
}

/// Number of days in the given month
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match next {
        Some(d) => d.pred_opt().map(|p| p.day()).unwrap_or(28),
        None => 28,
    }
}

/// Calendar-correct month step, clamping the day to the target month's length.
///
/// `step_months(2025-01-31, 1)` is `2025-02-28`, never an invalid date.
pub fn step_months(date: NaiveDate, months: i32) -> NaiveDate {
    let total = date.year() * 12 + date.month() as i32 - 1 + months;
    let year = total.div_euclid(12);
    let month = (total.rem_euclid(12) + 1) as u32;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).expect("clamped day is valid")
}

/// Last day of the month containing `date`
pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    let day = days_in_month(date.year(), date.month());
    NaiveDate::from_ymd_opt(date.year(), date.month(), day).expect("month length is valid")
}

/// Same date in another year, falling back to day 28 when the original
/// day does not exist there (Feb 29 anniversaries).
pub fn anniversary_in_year(date: NaiveDate, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
        .expect("day 28 exists in every month")
}
