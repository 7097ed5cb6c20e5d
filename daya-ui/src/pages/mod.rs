//! Page Components

pub mod bills;
pub mod dashboard;
pub mod login;
pub mod settings;

pub use bills::Bills;
pub use dashboard::Dashboard;
pub use login::Login;
pub use settings::Settings;
