//! Bill Scheduler
//!
//! Runs monthly bill generation on a fixed interval. Generation is
//! idempotent per room and month, so running it daily only issues each bill
//! once.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::{BillingService, DomainResult};

/// Outcome of the last run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Success { bills_created: usize },
    Failed { error: String },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScheduleStatus {
    pub last_run: Option<DateTime<Utc>>,
    pub last_status: Option<RunStatus>,
    pub error_count: u32,
}

pub struct BillScheduler {
    billing: BillingService,
    interval: Option<Duration>,
    status: Arc<RwLock<ScheduleStatus>>,
    running: Arc<RwLock<bool>>,
}

impl BillScheduler {
    /// `interval_hours = 0` disables the background task
    pub fn new(billing: BillingService, interval_hours: u64) -> Self {
        Self {
            billing,
            interval: (interval_hours > 0).then(|| Duration::from_secs(interval_hours * 3600)),
            status: Arc::new(RwLock::new(ScheduleStatus::default())),
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.interval.is_some()
    }

    pub async fn status(&self) -> ScheduleStatus {
        self.status.read().await.clone()
    }

    /// Generate bills for the month containing `now` and record the outcome
    pub async fn run_once(&self, now: DateTime<Utc>) -> DomainResult<usize> {
        let result = self.billing.generate_monthly_bills(now).await;

        let mut status = self.status.write().await;
        status.last_run = Some(now);
        match &result {
            Ok(created) => {
                tracing::info!(bills_created = created, "Scheduled bill generation finished");
                status.last_status = Some(RunStatus::Success {
                    bills_created: *created,
                });
                status.error_count = 0;
            }
            Err(e) => {
                tracing::error!(error = %e, "Scheduled bill generation failed");
                status.last_status = Some(RunStatus::Failed {
                    error: e.to_string(),
                });
                status.error_count += 1;
            }
        }

        result
    }

    /// Start the background task; `None` when disabled
    pub fn start(self: Arc<Self>) -> Option<tokio::task::JoinHandle<()>> {
        let period = self.interval?;
        let scheduler = Arc::clone(&self);

        Some(tokio::spawn(async move {
            *scheduler.running.write().await = true;
            tracing::info!(interval_secs = period.as_secs(), "Bill scheduler started");

            // the first tick completes immediately
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;

                if !*scheduler.running.read().await {
                    break;
                }

                // failures are recorded in the status
                let _ = scheduler.run_once(Utc::now()).await;
            }

            tracing::info!("Bill scheduler stopped");
        }))
    }

    /// Stop after the current tick
    pub async fn stop(&self) {
        *self.running.write().await = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{services, utc};
    use crate::domain::RoomInput;

    #[tokio::test]
    async fn test_run_once_records_status() {
        let (_, rooms, power, billing) = services();
        let room = rooms
            .create(RoomInput {
                number: "101".to_string(),
                tariff_per_kwh: 1400.0,
                limit_kwh: 0.0,
            })
            .await
            .unwrap();
        power
            .record(&room.id, 3_600_000.0, Some(utc("2024-05-03T01:00:00Z")))
            .await
            .unwrap();

        let scheduler = BillScheduler::new(billing, 24);
        assert!(scheduler.is_enabled());
        assert_eq!(scheduler.run_once(utc("2024-05-20T00:00:00Z")).await.unwrap(), 1);

        let status = scheduler.status().await;
        assert_eq!(status.last_status, Some(RunStatus::Success { bills_created: 1 }));
        assert_eq!(status.last_run, Some(utc("2024-05-20T00:00:00Z")));

        // same month again creates nothing
        assert_eq!(scheduler.run_once(utc("2024-05-21T00:00:00Z")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_zero_interval_disables() {
        let (.., billing) = services();
        let scheduler = Arc::new(BillScheduler::new(billing, 0));
        assert!(!scheduler.is_enabled());
        assert!(scheduler.start().is_none());
    }
}
