//! UI Components
//!
//! Reusable Leptos components for the dashboard.

pub mod chart;
pub mod filter;
pub mod loading;
pub mod nav;
pub mod toast;

pub use chart::Chart;
pub use filter::FilterBar;
pub use loading::Loading;
pub use nav::Nav;
pub use toast::Toast;
