//! Power Monitoring Domain
//!
//! Users, rooms, power samples and monthly bills on top of the
//! [`DocumentStore`](crate::sdk::DocumentStore). Every service is cheap to
//! clone and shares the store handle.
//!
//! Timestamps are stored as RFC 3339 UTC strings truncated to whole seconds,
//! so string comparison in store queries is chronological. Dates and months
//! are evaluated in [`DomainConfig::utc_offset`].

pub mod billing;
pub mod power;
pub mod rooms;
pub mod users;

pub use billing::{Bill, BillFilter, BillingService, PaymentStatus, RATE_PER_KWH};
pub use power::{
    kwh, HistoryFilter, HistoryPage, HistoryRow, PowerSample, PowerService, RoomSummary,
    UsageSeries,
};
pub use rooms::{Room, RoomInput, RoomService};
pub use users::{Role, UserProfile, UserService};

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, SubsecRound, TimeZone, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::aggregate::{AggregateError, MonthKey, DEFAULT_UTC_OFFSET_HOURS};
use crate::sdk::SdkError;

pub const USERS: &str = "users";
pub const ROOMS: &str = "rooms";
pub const POWER_SAMPLES: &str = "power_samples";
pub const BILLS: &str = "bills";

/// Domain errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Uniqueness rule broken (room number, tenant, bill month)
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error(transparent)]
    Sdk(#[from] SdkError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

impl From<csv::Error> for DomainError {
    fn from(err: csv::Error) -> Self {
        DomainError::Export(err.to_string())
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Billing and history settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainConfig {
    pub rate_per_kwh: f64,
    /// Seconds covered by one watt sample
    pub sample_interval_secs: f64,
    pub page_size: usize,
    pub utc_offset: FixedOffset,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            rate_per_kwh: RATE_PER_KWH,
            sample_interval_secs: 1.0,
            page_size: 15,
            utc_offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_HOURS * 3600)
                .unwrap_or_else(|| Utc.fix()),
        }
    }
}

impl DomainConfig {
    /// Local calendar date of an instant
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.utc_offset).date_naive()
    }

    pub fn local_month(&self, at: DateTime<Utc>) -> MonthKey {
        MonthKey::of(self.local_date(at))
    }

    /// `[start, end)` of a local month, in UTC
    pub fn month_range(&self, month: MonthKey) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.local_midnight(month.first_day()?)?;
        let end = self.local_midnight(month.next().first_day()?)?;
        Some((start, end))
    }

    fn local_midnight(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        let naive = date.and_hms_opt(0, 0, 0)?;
        self.utc_offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Stored form of an instant
pub fn store_timestamp(at: DateTime<Utc>) -> String {
    at.trunc_subsecs(0)
        .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Round half away from zero to `places` decimals
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T: Clone> Page<T> {
    /// Slice `page` (1-based, clamped to at least 1) out of `all`
    pub fn of(all: &[T], page: usize, page_size: usize) -> Self {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let total_items = all.len();
        let start = (page - 1).saturating_mul(page_size);
        let items = all
            .iter()
            .skip(start)
            .take(page_size)
            .cloned()
            .collect();

        Self {
            items,
            page,
            total_pages: total_items.div_ceil(page_size),
            total_items,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use super::*;
    use crate::sdk::{Sdk, SdkConfig};

    pub fn sdk() -> Sdk {
        Sdk::bootstrap(&SdkConfig::in_memory()).unwrap()
    }

    pub fn services() -> (UserService, RoomService, PowerService, BillingService) {
        let sdk = sdk();
        let config = DomainConfig::default();
        let store = Arc::clone(sdk.store());
        (
            UserService::new(Arc::clone(sdk.auth()), Arc::clone(&store)),
            RoomService::new(Arc::clone(&store)),
            PowerService::new(Arc::clone(&store), config),
            BillingService::new(store, config),
        )
    }

    pub fn utc(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::utc;
    use super::*;

    #[test]
    fn test_default_offset_is_western_indonesia() {
        let config = DomainConfig::default();
        assert_eq!(config.utc_offset.local_minus_utc(), 7 * 3600);
        assert_eq!(config.page_size, 15);
    }

    #[test]
    fn test_month_range_is_local() {
        let config = DomainConfig::default();
        let (start, end) = config.month_range(MonthKey::new(2024, 5).unwrap()).unwrap();
        assert_eq!(store_timestamp(start), "2024-04-30T17:00:00Z");
        assert_eq!(store_timestamp(end), "2024-05-31T17:00:00Z");

        // 20:00 UTC on 30 April is already May in UTC+7
        assert_eq!(
            config.local_month(utc("2024-04-30T20:00:00Z")),
            MonthKey::new(2024, 5).unwrap()
        );
    }

    #[test]
    fn test_store_timestamp_truncates() {
        assert_eq!(store_timestamp(utc("2024-05-01T08:00:00.750Z")), "2024-05-01T08:00:00Z");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 3), 1.235);
        assert_eq!(round_to(2.5, 0), 3.0);
    }

    #[test]
    fn test_page() {
        let all: Vec<u32> = (1..=32).collect();
        let page = Page::of(&all, 3, 15);
        assert_eq!(page.items, vec![31, 32]);
        assert_eq!(page.total_pages, 3);

        let page = Page::of(&all, 0, 15);
        assert_eq!(page.page, 1);
        assert_eq!(page.items.len(), 15);
        assert!(Page::of(&all, 9, 15).items.is_empty());
        assert_eq!(Page::<u32>::of(&[], 1, 15).total_pages, 0);
    }
}
