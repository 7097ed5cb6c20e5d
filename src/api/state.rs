//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::aggregate::{AggregateError, Aggregator};
use crate::config::{ApiConfig, Config};
use crate::dashboard::DashboardConfig;
use crate::domain::{BillingService, DomainConfig, PowerService, RoomService, UserService};
use crate::sdk::Sdk;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Auth and document store handles
    pub sdk: Sdk,
    pub users: UserService,
    pub rooms: RoomService,
    pub power: PowerService,
    pub billing: BillingService,
    /// Server-side dashboard aggregation
    pub aggregator: Aggregator,
    pub dashboard: DashboardConfig,
    pub toast_ttl_ms: u64,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Wire every service onto one SDK
    pub fn new(sdk: Sdk, config: &Config) -> Result<Self, AggregateError> {
        let aggregator = Aggregator::new(config.dashboard.aggregator()?);
        let mut state = Self::with_domain(sdk, config.domain()?, config.api.clone());
        state.aggregator = aggregator;
        state.dashboard = config.dashboard.dashboard();
        state.toast_ttl_ms = config.dashboard.toast_ttl_ms;
        Ok(state)
    }

    /// State with default dashboard settings
    pub fn with_domain(sdk: Sdk, domain: DomainConfig, api: ApiConfig) -> Self {
        let store = Arc::clone(sdk.store());
        Self {
            users: UserService::new(Arc::clone(sdk.auth()), Arc::clone(&store)),
            rooms: RoomService::new(Arc::clone(&store)),
            power: PowerService::new(Arc::clone(&store), domain),
            billing: BillingService::new(store, domain),
            aggregator: Aggregator::default(),
            dashboard: DashboardConfig::default(),
            toast_ttl_ms: crate::notify::DEFAULT_TOAST_TTL_MS,
            config: Arc::new(api),
            start_time: Instant::now(),
            sdk,
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
