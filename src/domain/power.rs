//! Power samples and usage history
//!
//! Meters post one watt reading per sample interval. Energy per sample is
//! `watts / 1000 * interval_secs / 3600` kWh.

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::rooms::Room;
use super::{
    round_to, store_timestamp, DomainConfig, DomainError, DomainResult, Page, POWER_SAMPLES, ROOMS,
};
use crate::aggregate::MonthKey;
use crate::sdk::{Direction, DocumentStore, FieldFilter, Fields, Query};

const UNKNOWN_ROOM: &str = "unknown";

/// Energy of one sample
pub fn kwh(watts: f64, interval_secs: f64) -> f64 {
    watts / 1000.0 * interval_secs / 3600.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerSample {
    #[serde(default)]
    pub id: String,
    pub room_id: String,
    pub watts: f64,
    pub timestamp: DateTime<Utc>,
}

/// Chart input: parallel timestamp labels and kWh values
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UsageSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// History filters; a date takes precedence over a month
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoryFilter {
    pub room_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub month: Option<MonthKey>,
    pub page: usize,
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("none"))
}

impl HistoryFilter {
    /// Build from form values, where `""` means unset
    pub fn parse(
        room_id: Option<&str>,
        date: Option<&str>,
        month: Option<&str>,
        page: Option<usize>,
    ) -> DomainResult<Self> {
        let date = present(date)
            .map(|d| {
                NaiveDate::parse_from_str(d, "%Y-%m-%d")
                    .map_err(|_| DomainError::Validation(format!("invalid date: {}", d)))
            })
            .transpose()?;
        let month = present(month)
            .map(|m| {
                m.parse::<MonthKey>()
                    .map_err(|_| DomainError::Validation(format!("invalid month: {}", m)))
            })
            .transpose()?;

        Ok(Self {
            room_id: present(room_id).map(str::to_string),
            date,
            month,
            page: page.unwrap_or(1).max(1),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub room_id: String,
    pub room_number: String,
    /// Local time, `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,
    pub kwh: f64,
    pub kwh_over_limit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomSummary {
    pub room_id: String,
    pub room_number: String,
    pub total_kwh: f64,
    pub total_kwh_over: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPage {
    pub rows: Page<HistoryRow>,
    /// Totals over every matching row, not just this page
    pub summary: Vec<RoomSummary>,
}

impl HistoryPage {
    /// A page with no rows
    pub fn empty(page: usize) -> Self {
        Self {
            rows: Page::of(&[], page, 1),
            summary: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct PowerService {
    store: Arc<dyn DocumentStore>,
    config: DomainConfig,
}

impl PowerService {
    pub fn new(store: Arc<dyn DocumentStore>, config: DomainConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &DomainConfig {
        &self.config
    }

    /// Store one meter reading; `at` defaults to now
    pub async fn record(
        &self,
        room_id: &str,
        watts: f64,
        at: Option<DateTime<Utc>>,
    ) -> DomainResult<PowerSample> {
        if !watts.is_finite() || watts < 0.0 {
            return Err(DomainError::Validation(format!("invalid watts: {}", watts)));
        }
        if self.store.get(ROOMS, room_id).await?.is_none() {
            return Err(DomainError::NotFound(format!("room {}", room_id)));
        }

        let timestamp = at.unwrap_or_else(Utc::now).trunc_subsecs(0);
        let mut fields = Fields::new();
        fields.insert("room_id".to_string(), Value::String(room_id.to_string()));
        fields.insert("watts".to_string(), Value::from(watts));
        fields.insert("timestamp".to_string(), Value::String(store_timestamp(timestamp)));
        let id = self.store.add(POWER_SAMPLES, fields).await?;

        tracing::debug!(room_id = %room_id, watts, "Power sample recorded");
        Ok(PowerSample {
            id,
            room_id: room_id.to_string(),
            watts,
            timestamp,
        })
    }

    /// Samples in `[start, end)`, chronological
    pub async fn samples(
        &self,
        room_id: Option<&str>,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
        direction: Direction,
    ) -> DomainResult<Vec<PowerSample>> {
        let mut query = Query::collection(POWER_SAMPLES).order_by("timestamp", direction);
        if let Some(room) = room_id {
            query = query.where_eq("room_id", room);
        }
        if let Some((start, end)) = range {
            query = query
                .filter(FieldFilter::gte("timestamp", store_timestamp(start)))
                .filter(FieldFilter::lt("timestamp", store_timestamp(end)));
        }

        self.store
            .query(&query)
            .await?
            .iter()
            .map(|doc| doc.decode().map_err(DomainError::from))
            .collect()
    }

    /// kWh a room used during a local month
    pub async fn month_kwh(&self, room_id: &str, month: MonthKey) -> DomainResult<f64> {
        let range = self.month_range(month)?;
        let samples = self
            .samples(Some(room_id), Some(range), Direction::Ascending)
            .await?;
        Ok(samples
            .iter()
            .map(|s| kwh(s.watts, self.config.sample_interval_secs))
            .sum())
    }

    /// Chart series for a room, optionally limited to one month
    pub async fn usage_series(&self, room_id: &str, month: Option<MonthKey>) -> DomainResult<UsageSeries> {
        let range = month.map(|m| self.month_range(m)).transpose()?;
        let samples = self.samples(Some(room_id), range, Direction::Ascending).await?;
        Ok(self.series(&samples))
    }

    /// The last `count` samples of a room, oldest first
    pub async fn recent(&self, room_id: &str, count: usize) -> DomainResult<UsageSeries> {
        let mut samples = self
            .samples(Some(room_id), None, Direction::Descending)
            .await?;
        samples.truncate(count);
        samples.reverse();
        Ok(self.series(&samples))
    }

    /// Filtered, paginated history with per-room totals
    pub async fn history(&self, filter: &HistoryFilter) -> DomainResult<HistoryPage> {
        let (rows, summary) = self.history_rows(filter).await?;
        Ok(HistoryPage {
            rows: Page::of(&rows, filter.page, self.config.page_size),
            summary,
        })
    }

    /// Every matching history row as CSV
    pub async fn export_csv(&self, filter: &HistoryFilter) -> DomainResult<String> {
        let (rows, _) = self.history_rows(filter).await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in &rows {
            writer.serialize(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| DomainError::Export(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| DomainError::Export(e.to_string()))
    }

    async fn history_rows(
        &self,
        filter: &HistoryFilter,
    ) -> DomainResult<(Vec<HistoryRow>, Vec<RoomSummary>)> {
        let rooms: HashMap<String, Room> = self
            .store
            .query(&Query::collection(ROOMS))
            .await?
            .iter()
            .map(|doc| doc.decode::<Room>().map(|r| (r.id.clone(), r)))
            .collect::<Result<_, _>>()?;

        let samples = self
            .samples(filter.room_id.as_deref(), None, Direction::Descending)
            .await?;

        let mut rows = Vec::new();
        let mut totals: BTreeMap<String, RoomSummary> = BTreeMap::new();

        for sample in samples {
            let local_date = self.config.local_date(sample.timestamp);
            if let Some(date) = filter.date {
                if local_date != date {
                    continue;
                }
            } else if let Some(month) = filter.month {
                if !month.contains(local_date) {
                    continue;
                }
            }

            let room = rooms.get(&sample.room_id);
            let room_number = room.map_or(UNKNOWN_ROOM, |r| r.number.as_str()).to_string();
            let limit = room.map_or(0.0, |r| r.limit_kwh);
            let energy = round_to(kwh(sample.watts, self.config.sample_interval_secs), 6);
            let over = (energy - limit).max(0.0);

            let summary = totals
                .entry(sample.room_id.clone())
                .or_insert_with(|| RoomSummary {
                    room_id: sample.room_id.clone(),
                    room_number: room_number.clone(),
                    total_kwh: 0.0,
                    total_kwh_over: 0.0,
                });
            summary.total_kwh += energy;
            summary.total_kwh_over += over;

            rows.push(HistoryRow {
                room_id: sample.room_id,
                room_number,
                timestamp: sample
                    .timestamp
                    .with_timezone(&self.config.utc_offset)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
                kwh: energy,
                kwh_over_limit: over,
            });
        }

        let mut summary: Vec<RoomSummary> = totals
            .into_values()
            .map(|mut s| {
                s.total_kwh = round_to(s.total_kwh, 6);
                s.total_kwh_over = round_to(s.total_kwh_over, 6);
                s
            })
            .collect();
        summary.sort_by(|a, b| a.room_number.cmp(&b.room_number));

        Ok((rows, summary))
    }

    fn series(&self, samples: &[PowerSample]) -> UsageSeries {
        let interval = self.config.sample_interval_secs;
        UsageSeries {
            labels: samples
                .iter()
                .map(|s| {
                    s.timestamp
                        .with_timezone(&self.config.utc_offset)
                        .to_rfc3339_opts(SecondsFormat::Secs, false)
                })
                .collect(),
            values: samples.iter().map(|s| kwh(s.watts, interval)).collect(),
        }
    }

    fn month_range(&self, month: MonthKey) -> DomainResult<(DateTime<Utc>, DateTime<Utc>)> {
        self.config
            .month_range(month)
            .ok_or_else(|| DomainError::Validation(format!("invalid month: {}", month)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{Aggregator, AggregatorConfig, DisplayLocale};
    use crate::domain::fixtures::{services, utc};
    use crate::domain::RoomInput;

    fn room(number: &str, limit_kwh: f64) -> RoomInput {
        RoomInput {
            number: number.to_string(),
            tariff_per_kwh: 1400.0,
            limit_kwh,
        }
    }

    #[test]
    fn test_kwh() {
        assert_eq!(kwh(3_600_000.0, 1.0), 1.0);
        assert_eq!(kwh(1000.0, 3600.0), 1.0);
        assert_eq!(kwh(0.0, 1.0), 0.0);
    }

    #[tokio::test]
    async fn test_record_validates() {
        let (_, rooms, power, _) = services();
        let r = rooms.create(room("101", 0.0)).await.unwrap();

        assert!(matches!(power.record(&r.id, -5.0, None).await, Err(DomainError::Validation(_))));
        assert!(matches!(power.record(&r.id, f64::NAN, None).await, Err(DomainError::Validation(_))));
        assert!(matches!(power.record("missing", 5.0, None).await, Err(DomainError::NotFound(_))));

        let sample = power.record(&r.id, 120.0, Some(utc("2024-05-01T01:00:00.9Z"))).await.unwrap();
        assert_eq!(sample.timestamp, utc("2024-05-01T01:00:00Z"));
    }

    #[tokio::test]
    async fn test_usage_series_feeds_aggregator() {
        let (_, rooms, power, _) = services();
        let r = rooms.create(room("101", 0.0)).await.unwrap();
        power.record(&r.id, 3_600_000.0, Some(utc("2024-05-08T01:00:00Z"))).await.unwrap();
        power.record(&r.id, 7_200_000.0, Some(utc("2024-05-01T01:00:00Z"))).await.unwrap();
        power.record(&r.id, 1_800_000.0, Some(utc("2024-04-10T01:00:00Z"))).await.unwrap();

        let series = power.usage_series(&r.id, None).await.unwrap();
        assert_eq!(series.labels[0], "2024-04-10T08:00:00+07:00");
        assert_eq!(series.values, vec![0.5, 2.0, 1.0]);

        let may = power.usage_series(&r.id, Some(MonthKey::new(2024, 5).unwrap())).await.unwrap();
        assert_eq!(may.values, vec![2.0, 1.0]);

        let config = AggregatorConfig::new(DisplayLocale::EnglishUs, 7).unwrap();
        let aggregation = Aggregator::new(config).aggregate(&may.labels, &may.values).unwrap();
        let bucket = aggregation.month(MonthKey::new(2024, 5).unwrap()).unwrap();
        assert_eq!(bucket.week_keys(), vec![1, 2]);

        let recent = power.recent(&r.id, 2).await.unwrap();
        assert_eq!(recent.values, vec![2.0, 1.0]);
    }

    #[tokio::test]
    async fn test_month_kwh_uses_local_month() {
        let (_, rooms, power, _) = services();
        let r = rooms.create(room("101", 0.0)).await.unwrap();
        // 18:00 UTC on 30 April is 1 May in UTC+7
        power.record(&r.id, 3_600_000.0, Some(utc("2024-04-30T18:00:00Z"))).await.unwrap();
        power.record(&r.id, 3_600_000.0, Some(utc("2024-04-30T16:00:00Z"))).await.unwrap();

        let may = power.month_kwh(&r.id, MonthKey::new(2024, 5).unwrap()).await.unwrap();
        assert_eq!(may, 1.0);
    }

    #[tokio::test]
    async fn test_history_filters_and_summary() {
        let (_, rooms, power, _) = services();
        let a = rooms.create(room("101", 0.5)).await.unwrap();
        let b = rooms.create(room("102", 0.0)).await.unwrap();
        power.record(&a.id, 3_600_000.0, Some(utc("2024-05-01T01:00:00Z"))).await.unwrap();
        power.record(&a.id, 1_800_000.0, Some(utc("2024-05-02T01:00:00Z"))).await.unwrap();
        power.record(&b.id, 3_600_000.0, Some(utc("2024-05-02T02:00:00Z"))).await.unwrap();
        power.record(&b.id, 3_600_000.0, Some(utc("2024-06-02T02:00:00Z"))).await.unwrap();

        let filter = HistoryFilter::parse(None, None, Some("2024-05"), None).unwrap();
        let page = power.history(&filter).await.unwrap();
        assert_eq!(page.rows.total_items, 3);
        // newest first
        assert_eq!(page.rows.items[0].room_number, "102");
        assert_eq!(page.rows.items[0].timestamp, "2024-05-02 09:00:00");

        assert_eq!(page.summary.len(), 2);
        assert_eq!(page.summary[0].room_number, "101");
        assert_eq!(page.summary[0].total_kwh, 1.5);
        assert_eq!(page.summary[0].total_kwh_over, 0.5);

        let filter = HistoryFilter::parse(Some(&a.id), Some("2024-05-02"), Some("2024-06"), None).unwrap();
        let page = power.history(&filter).await.unwrap();
        assert_eq!(page.rows.total_items, 1);
        assert_eq!(page.rows.items[0].kwh, 0.5);
    }

    #[tokio::test]
    async fn test_history_pagination() {
        let (_, rooms, power, _) = services();
        let r = rooms.create(room("101", 0.0)).await.unwrap();
        for minute in 0..20 {
            let at = utc("2024-05-01T01:00:00Z") + chrono::Duration::minutes(minute);
            power.record(&r.id, 100.0, Some(at)).await.unwrap();
        }

        let filter = HistoryFilter::parse(None, None, None, Some(2)).unwrap();
        let page = power.history(&filter).await.unwrap();
        assert_eq!(page.rows.items.len(), 5);
        assert_eq!(page.rows.total_pages, 2);
        assert_eq!(page.rows.items[4].timestamp, "2024-05-01 08:00:00");
    }

    #[tokio::test]
    async fn test_export_csv() {
        let (_, rooms, power, _) = services();
        let r = rooms.create(room("101", 0.0)).await.unwrap();
        power.record(&r.id, 3_600_000.0, Some(utc("2024-05-01T01:00:00Z"))).await.unwrap();

        let csv = power.export_csv(&HistoryFilter::default()).await.unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("room_id,room_number,timestamp,kwh,kwh_over_limit"));
        assert!(lines.next().unwrap().ends_with(",101,2024-05-01 08:00:00,1.0,1.0"));
    }

    #[test]
    fn test_filter_parse() {
        let filter = HistoryFilter::parse(Some(""), Some("None"), Some(" "), Some(0)).unwrap();
        assert_eq!(filter, HistoryFilter { page: 1, ..HistoryFilter::default() });
        assert!(HistoryFilter::parse(None, Some("01/05/2024"), None, None).is_err());
        assert!(HistoryFilter::parse(None, None, Some("May"), None).is_err());
    }
}
