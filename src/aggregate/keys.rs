//! Calendar bucket keys
//!
//! - `MonthKey`: a calendar month, displayed `YYYY-M`
//! - `week_in_month`: `ceil(day / 7)`, a display convenience rather than an ISO week

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::AggregateError;

/// A calendar month
///
/// Orders chronologically. `Display` omits the zero padding (`2024-5`),
/// [`MonthKey::iso`] keeps it (`2024-05`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    /// Create a key, rejecting months outside 1..=12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// The month containing `date`
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Zero padded `YYYY-MM` form
    pub fn iso(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// The following month
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Check if a date falls in this month
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AggregateError::InvalidMonthKey(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        MonthKey::new(year, month).ok_or_else(invalid)
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for MonthKey {
    type Error = AggregateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Week-in-month index: `ceil(day_of_month / 7)`, always in 1..=5
pub fn week_in_month(date: NaiveDate) -> u8 {
    date.day().div_ceil(7) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_in_month_boundaries() {
        assert_eq!(week_in_month(date(2024, 5, 1)), 1);
        assert_eq!(week_in_month(date(2024, 5, 7)), 1);
        assert_eq!(week_in_month(date(2024, 5, 8)), 2);
        assert_eq!(week_in_month(date(2024, 5, 28)), 4);
        assert_eq!(week_in_month(date(2024, 5, 29)), 5);
        assert_eq!(week_in_month(date(2024, 5, 31)), 5);
    }

    #[test]
    fn test_week_in_month_range_for_whole_year() {
        let mut day = date(2024, 1, 1);
        while day.year() == 2024 {
            let week = week_in_month(day);
            assert!((1..=5).contains(&week));
            assert_eq!(week as u32, (day.day() as f64 / 7.0).ceil() as u32);
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_month_key_display_and_parse() {
        let key = MonthKey::new(2024, 5).unwrap();
        assert_eq!(key.to_string(), "2024-5");
        assert_eq!(key.iso(), "2024-05");
        assert_eq!("2024-5".parse::<MonthKey>().unwrap(), key);
        assert_eq!("2024-05".parse::<MonthKey>().unwrap(), key);
        assert!("2024-13".parse::<MonthKey>().is_err());
        assert!("May 2024".parse::<MonthKey>().is_err());
    }

    #[test]
    fn test_month_key_ordering_and_next() {
        let dec = MonthKey::new(2023, 12).unwrap();
        let jan = MonthKey::new(2024, 1).unwrap();
        assert!(dec < jan);
        assert_eq!(dec.next(), jan);
        assert!(jan.contains(date(2024, 1, 31)));
        assert!(!jan.contains(date(2024, 2, 1)));
    }

    #[test]
    fn test_month_key_serde_as_string() {
        let key = MonthKey::new(2024, 5).unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"2024-5\"");
        let parsed: MonthKey = serde_json::from_str("\"2024-05\"").unwrap();
        assert_eq!(parsed, key);
    }
}
