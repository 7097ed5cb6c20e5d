//! Dashboard
//!
//! Presentation state for the power usage chart: month/week filter
//! controls, the chart series and viewport sizing, and the controller that
//! ties them to an [`Aggregation`](crate::aggregate::Aggregation).

pub mod chart;
pub mod controller;
pub mod filter;

pub use chart::{
    breakpoint_config, BreakpointConfig, ChartError, ChartSeries, ChartState, LegendPosition,
    BREAKPOINT_PX, DEFAULT_DATASET_LABEL,
};
pub use controller::{DashboardConfig, DashboardController};
pub use filter::{
    FilterControls, FilterError, FilterLabels, MonthChoice, SelectOption, WeekChoice,
    ALL_WEEKS_VALUE,
};
