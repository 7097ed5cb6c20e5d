//! Time-Bucketing Aggregator
//!
//! Groups a flat sequence of (timestamp, value) readings into calendar
//! months, week-in-month buckets and days, keeping running totals at every
//! level in a single pass.
//!
//! ## Invariants
//!
//! - Every reading lands in exactly one month bucket and exactly one week
//!   bucket of that month.
//! - Week totals sum to the month total, day totals sum to the week total.
//! - Duplicate timestamps accumulate; nothing is deduplicated.
//!
//! ## Example
//!
//! ```rust
//! use daya::aggregate::{Aggregator, AggregatorConfig, MonthKey};
//!
//! let aggregator = Aggregator::new(AggregatorConfig::default());
//! let aggregation = aggregator
//!     .aggregate(
//!         &["2024-05-01T08:00:00".to_string(), "2024-05-08T08:00:00".to_string()],
//!         &[10.0, 20.0],
//!     )
//!     .unwrap();
//!
//! let may = aggregation.month(MonthKey::new(2024, 5).unwrap()).unwrap();
//! assert_eq!(may.total, 30.0);
//! assert_eq!(may.week_keys(), vec![1, 2]);
//! ```

mod error;
mod keys;
mod locale;

pub use error::AggregateError;
pub use keys::{week_in_month, MonthKey};
pub use locale::{
    DisplayLocale, DAY_COMPACT_FORMAT, DAY_LABEL_FORMAT, MONTH_NAME_FORMAT,
    READING_COMPACT_FORMAT, READING_LABEL_FORMAT,
};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Default display offset (UTC+7, Asia/Jakarta)
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;

/// Aggregator settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatorConfig {
    /// Locale for month names and labels
    pub locale: DisplayLocale,
    /// Offset that zoned timestamps are converted into before bucketing
    pub utc_offset: FixedOffset,
}

impl AggregatorConfig {
    /// Build a config from a whole-hour UTC offset
    pub fn new(locale: DisplayLocale, utc_offset_hours: i32) -> Result<Self, AggregateError> {
        if !(-23..=23).contains(&utc_offset_hours) {
            return Err(AggregateError::InvalidOffset(utc_offset_hours));
        }
        let utc_offset = FixedOffset::east_opt(utc_offset_hours * 3600)
            .ok_or(AggregateError::InvalidOffset(utc_offset_hours))?;
        Ok(Self { locale, utc_offset })
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            locale: DisplayLocale::default(),
            utc_offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_HOURS * 3600)
                .unwrap_or_else(|| Utc.fix()),
        }
    }
}

/// One measurement at a local wall-clock time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    /// Local wall-clock time
    pub timestamp: NaiveDateTime,
    /// Measured value (kWh or W)
    pub value: f64,
    /// Timestamp exactly as supplied
    pub label: String,
}

impl Reading {
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn month(&self) -> MonthKey {
        MonthKey::of(self.timestamp.date())
    }

    pub fn week(&self) -> u8 {
        week_in_month(self.timestamp.date())
    }
}

/// Running totals for one week-in-month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekBucket {
    pub week: u8,
    pub total: f64,
    pub reading_count: usize,
    /// Per-day running totals inside this week
    pub days: BTreeMap<NaiveDate, f64>,
}

impl WeekBucket {
    fn new(week: u8) -> Self {
        Self {
            week,
            total: 0.0,
            reading_count: 0,
            days: BTreeMap::new(),
        }
    }
}

/// Running totals for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBucket {
    pub key: MonthKey,
    /// Localized display name (`Mei 2024`)
    pub name: String,
    pub total: f64,
    pub reading_count: usize,
    pub weeks: BTreeMap<u8, WeekBucket>,
    /// Per-day running totals for the whole month
    pub days: BTreeMap<NaiveDate, f64>,
}

impl MonthBucket {
    fn new(key: MonthKey, name: String) -> Self {
        Self {
            key,
            name,
            total: 0.0,
            reading_count: 0,
            weeks: BTreeMap::new(),
            days: BTreeMap::new(),
        }
    }

    fn record(&mut self, reading: &Reading) {
        let day = reading.day();
        let week = self
            .weeks
            .entry(reading.week())
            .or_insert_with(|| WeekBucket::new(reading.week()));

        week.total += reading.value;
        week.reading_count += 1;
        *week.days.entry(day).or_insert(0.0) += reading.value;

        self.total += reading.value;
        self.reading_count += 1;
        *self.days.entry(day).or_insert(0.0) += reading.value;
    }

    pub fn week(&self, week: u8) -> Option<&WeekBucket> {
        self.weeks.get(&week)
    }

    /// Week keys in ascending order
    pub fn week_keys(&self) -> Vec<u8> {
        self.weeks.keys().copied().collect()
    }

    /// Sum of the per-week totals
    pub fn weekly_total(&self) -> f64 {
        self.weeks.values().map(|w| w.total).sum()
    }
}

/// Result of bucketing a full set of readings
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Aggregation {
    months: BTreeMap<MonthKey, MonthBucket>,
    readings: Vec<Reading>,
    #[serde(skip)]
    locale: DisplayLocale,
}

impl Aggregation {
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Readings in input order
    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn locale(&self) -> DisplayLocale {
        self.locale
    }

    pub fn month(&self, key: MonthKey) -> Option<&MonthBucket> {
        self.months.get(&key)
    }

    /// Month buckets, oldest first
    pub fn months(&self) -> impl Iterator<Item = &MonthBucket> {
        self.months.values()
    }

    /// Month keys, newest first
    pub fn month_keys_newest_first(&self) -> Vec<MonthKey> {
        self.months.keys().rev().copied().collect()
    }

    pub fn latest_month(&self) -> Option<&MonthBucket> {
        self.months.values().next_back()
    }

    /// Sum of every reading
    pub fn total(&self) -> f64 {
        self.readings.iter().map(|r| r.value).sum()
    }
}

/// Validates readings and builds an [`Aggregation`]
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    config: AggregatorConfig,
}

impl Aggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Aggregate parallel timestamp and value arrays
    ///
    /// Lengths, timestamp parseability and value finiteness are all checked
    /// before any bucket is built.
    pub fn aggregate(
        &self,
        timestamps: &[String],
        values: &[f64],
    ) -> Result<Aggregation, AggregateError> {
        if timestamps.len() != values.len() {
            return Err(AggregateError::LengthMismatch {
                timestamps: timestamps.len(),
                values: values.len(),
            });
        }

        let readings = timestamps
            .iter()
            .zip(values)
            .enumerate()
            .map(|(index, (raw, &value))| {
                if !value.is_finite() {
                    return Err(AggregateError::InvalidValue { index, value });
                }
                let timestamp = parse_timestamp(raw, self.config.utc_offset).ok_or_else(|| {
                    AggregateError::InvalidTimestamp {
                        index,
                        value: raw.clone(),
                    }
                })?;
                Ok(Reading {
                    timestamp,
                    value,
                    label: raw.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.bucket(readings))
    }

    /// Aggregate from the two JSON-encoded host attributes
    /// (`data-labels` and `data-data`)
    pub fn from_json_attributes(
        &self,
        labels_json: &str,
        data_json: &str,
    ) -> Result<Aggregation, AggregateError> {
        let timestamps: Vec<String> = parse_attribute("labels", labels_json)?;
        let values: Vec<f64> = parse_attribute("data", data_json)?;
        self.aggregate(&timestamps, &values)
    }

    /// Bucket already validated readings
    pub fn bucket(&self, readings: Vec<Reading>) -> Aggregation {
        let locale = self.config.locale;
        let mut months: BTreeMap<MonthKey, MonthBucket> = BTreeMap::new();

        for reading in &readings {
            let key = reading.month();
            months
                .entry(key)
                .or_insert_with(|| MonthBucket::new(key, month_name(key, locale)))
                .record(reading);
        }

        tracing::debug!(
            readings = readings.len(),
            months = months.len(),
            "Aggregated readings"
        );

        Aggregation {
            months,
            readings,
            locale,
        }
    }
}

/// An empty attribute counts as an empty array
fn parse_attribute<T: serde::de::DeserializeOwned>(
    attribute: &str,
    json: &str,
) -> Result<Vec<T>, AggregateError> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(json).map_err(|e| AggregateError::Json {
        attribute: attribute.to_string(),
        error: e.to_string(),
    })
}

fn month_name(key: MonthKey, locale: DisplayLocale) -> String {
    match key.first_day().and_then(|d| d.and_hms_opt(0, 0, 0)) {
        Some(at) => locale.format(at, MONTH_NAME_FORMAT),
        None => key.to_string(),
    }
}

/// Parse a timestamp into local wall-clock time
///
/// RFC 3339 input is converted into `offset`; input without a zone is taken
/// as already local. Accepts `T` or space separators, optional seconds and
/// fractions, and bare dates (midnight).
pub fn parse_timestamp(raw: &str, offset: FixedOffset) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(zoned) = DateTime::parse_from_rfc3339(raw) {
        return Some(zoned.with_timezone(&offset).naive_local());
    }

    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for format in FORMATS {
        if let Ok(at) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(at);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn english() -> Aggregator {
        Aggregator::new(AggregatorConfig::new(DisplayLocale::EnglishUs, 7).unwrap())
    }

    #[test]
    fn test_two_readings_in_consecutive_weeks() {
        let aggregation = Aggregator::default()
            .aggregate(
                &strings(&["2024-05-01T08:00:00", "2024-05-08T08:00:00"]),
                &[10.0, 20.0],
            )
            .unwrap();

        let key: MonthKey = "2024-5".parse().unwrap();
        let may = aggregation.month(key).unwrap();
        assert_eq!(may.key.to_string(), "2024-5");
        assert_eq!(may.total, 30.0);
        assert_eq!(may.week_keys(), vec![1, 2]);
        assert_eq!(may.week(1).unwrap().total, 10.0);
        assert_eq!(may.week(2).unwrap().total, 20.0);
    }

    #[test]
    fn test_empty_input() {
        let aggregation = Aggregator::default().aggregate(&[], &[]).unwrap();
        assert!(aggregation.is_empty());
        assert!(aggregation.latest_month().is_none());
        assert_eq!(aggregation.total(), 0.0);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = Aggregator::default()
            .aggregate(&strings(&["2024-05-01"]), &[1.0, 2.0])
            .unwrap_err();
        assert_eq!(
            err,
            AggregateError::LengthMismatch {
                timestamps: 1,
                values: 2
            }
        );
    }

    #[test]
    fn test_malformed_timestamp_rejected() {
        let err = Aggregator::default()
            .aggregate(&strings(&["2024-05-01", "not a date"]), &[1.0, 2.0])
            .unwrap_err();
        assert_eq!(
            err,
            AggregateError::InvalidTimestamp {
                index: 1,
                value: "not a date".to_string()
            }
        );
    }

    #[test]
    fn test_non_finite_value_rejected() {
        let err = Aggregator::default()
            .aggregate(&strings(&["2024-05-01"]), &[f64::NAN])
            .unwrap_err();
        assert!(matches!(err, AggregateError::InvalidValue { index: 0, .. }));
    }

    #[test]
    fn test_totals_are_preserved_per_month() {
        let timestamps = strings(&[
            "2024-04-29T10:00:00",
            "2024-04-30T10:00:00",
            "2024-05-01T00:00:00",
            "2024-05-01T12:30:00",
            "2024-05-15 09:00:00",
            "2024-05-31T23:59:59",
            "2024-06-02",
        ]);
        let values = [1.5, 2.5, 3.0, 4.0, 5.25, 6.0, 7.0];
        let aggregation = english().aggregate(&timestamps, &values).unwrap();

        for month in aggregation.months() {
            let raw: f64 = aggregation
                .readings()
                .iter()
                .filter(|r| r.month() == month.key)
                .map(|r| r.value)
                .sum();
            assert!((month.weekly_total() - raw).abs() < 1e-9);
            assert!((month.total - raw).abs() < 1e-9);
            for week in month.weeks.values() {
                let day_sum: f64 = week.days.values().sum();
                assert!((week.total - day_sum).abs() < 1e-9);
            }
        }

        let total: f64 = aggregation.months().map(|m| m.total).sum();
        assert!((total - values.iter().sum::<f64>()).abs() < 1e-9);
    }

    #[test]
    fn test_duplicates_accumulate_per_day() {
        let aggregation = english()
            .aggregate(
                &strings(&["2024-05-01T08:00:00", "2024-05-01T08:00:00", "2024-05-01T09:00:00"]),
                &[1.0, 1.0, 2.0],
            )
            .unwrap();
        let may = aggregation.latest_month().unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(may.days[&day], 4.0);
        assert_eq!(may.reading_count, 3);
    }

    #[test]
    fn test_month_names_and_order() {
        let aggregation = english()
            .aggregate(&strings(&["2024-06-03", "2024-04-10", "2024-05-20"]), &[1.0, 1.0, 1.0])
            .unwrap();
        let keys: Vec<String> = aggregation
            .month_keys_newest_first()
            .iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(keys, vec!["2024-6", "2024-5", "2024-4"]);
        assert_eq!(aggregation.latest_month().unwrap().name, "June 2024");
        // input order is kept for the unfiltered view
        assert_eq!(aggregation.readings()[0].label, "2024-06-03");
    }

    #[test]
    fn test_zoned_timestamps_use_configured_offset() {
        // 2024-05-31T20:00Z is already June 1st at UTC+7
        let aggregation = english()
            .aggregate(&strings(&["2024-05-31T20:00:00Z"]), &[1.0])
            .unwrap();
        let reading = &aggregation.readings()[0];
        assert_eq!(reading.month().to_string(), "2024-6");
        assert_eq!(reading.week(), 1);
    }

    #[test]
    fn test_from_json_attributes() {
        let aggregation = english()
            .from_json_attributes(r#"["2024-05-01T08:00:00"]"#, "[2.5]")
            .unwrap();
        assert_eq!(aggregation.total(), 2.5);

        let empty = english().from_json_attributes("", "").unwrap();
        assert!(empty.is_empty());

        let err = english().from_json_attributes("[oops", "[]").unwrap_err();
        assert!(matches!(err, AggregateError::Json { ref attribute, .. } if attribute == "labels"));
    }

    #[test]
    fn test_invalid_offset() {
        assert!(matches!(
            AggregatorConfig::new(DisplayLocale::Indonesian, 30),
            Err(AggregateError::InvalidOffset(30))
        ));
    }
}
