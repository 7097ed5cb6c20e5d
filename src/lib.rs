//! # Daya
//!
//! Power usage monitoring for rented rooms. Per-second watt samples are
//! bucketed into months, weeks and days and charted on a dashboard with
//! month/week filters; owners manage rooms and generate monthly bills for
//! usage above each room's limit.
//!
//! ## Modules
//!
//! - [`aggregate`]: Time bucketing of readings into months, weeks and days
//! - [`dashboard`]: Filter controls, chart state and the dashboard controller
//! - [`notify`]: Toast queue and flash messages
//! - [`toggle`]: Navigation drawer and dropdown toggles
//!
//! With the `server` feature (default):
//!
//! - [`sdk`]: Auth and document store back ends (Firebase or local SQLite)
//! - [`domain`]: Users, rooms, power history and billing
//! - [`api`]: REST API server with Axum
//! - [`scheduler`]: Periodic bill generation
//!
//! ## Quick Start
//!
//! ```rust
//! use daya::aggregate::{Aggregator, AggregatorConfig, DisplayLocale};
//! use daya::dashboard::{DashboardConfig, DashboardController, WeekChoice};
//!
//! let timestamps = vec![
//!     "2024-05-01T08:00:00".to_string(),
//!     "2024-05-08T08:00:00".to_string(),
//! ];
//! let config = AggregatorConfig::new(DisplayLocale::EnglishUs, 7).unwrap();
//! let aggregation = Aggregator::new(config)
//!     .aggregate(&timestamps, &[10.0, 20.0])
//!     .unwrap();
//!
//! let mut dashboard = DashboardController::mount(aggregation, DashboardConfig::default(), 1024.0);
//! let week_two = dashboard.select_week(WeekChoice::Week(2)).unwrap();
//! assert_eq!(week_two.values, vec![20.0]);
//! ```

pub mod aggregate;
pub mod dashboard;
pub mod notify;
pub mod toggle;

#[cfg(feature = "server")]
pub mod api;
#[cfg(feature = "server")]
pub mod config;
#[cfg(feature = "server")]
pub mod domain;
#[cfg(feature = "server")]
pub mod scheduler;
#[cfg(feature = "server")]
pub mod sdk;

// Re-export top-level types for convenience
pub use aggregate::{
    AggregateError, Aggregation, Aggregator, AggregatorConfig, DisplayLocale, MonthBucket,
    MonthKey, Reading, WeekBucket,
};

pub use dashboard::{
    breakpoint_config, BreakpointConfig, ChartError, ChartSeries, ChartState, DashboardConfig,
    DashboardController, FilterControls, FilterError, FilterLabels, MonthChoice, WeekChoice,
};

pub use notify::{FlashMessage, Severity, Toast, ToastQueue};

pub use toggle::{Dropdown, NavDrawer};

#[cfg(feature = "server")]
pub use api::{build_router, serve, ApiError, AppState};

#[cfg(feature = "server")]
pub use config::{Config, ConfigError};

#[cfg(feature = "server")]
pub use domain::{Bill, DomainError, PaymentStatus, PowerSample, Role, Room, UserProfile};

#[cfg(feature = "server")]
pub use sdk::{AuthProvider, DocumentStore, ProjectConfig, Sdk, SdkConfig, SdkError};
