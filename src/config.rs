//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `DAYA_*` environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::aggregate::{AggregateError, AggregatorConfig, DisplayLocale, DEFAULT_UTC_OFFSET_HOURS};
use crate::dashboard::{DashboardConfig, FilterLabels, DEFAULT_DATASET_LABEL};
use crate::domain::DomainConfig;
use crate::notify::DEFAULT_TOAST_TTL_MS;
use crate::sdk::{BackendKind, ProjectConfig, SdkConfig};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub dashboard: DashboardSettings,

    #[serde(default)]
    pub billing: BillingConfig,

    #[serde(default)]
    pub power: PowerConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub firebase: ProjectConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![
                "http://localhost:8084".to_string(),
                "http://127.0.0.1:8084".to_string(),
            ],
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Chart and toast presentation
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardSettings {
    #[serde(default)]
    pub locale: DisplayLocale,

    #[serde(default = "default_utc_offset")]
    pub utc_offset_hours: i32,

    #[serde(default = "default_toast_ttl")]
    pub toast_ttl_ms: u64,

    #[serde(default = "default_dataset_label")]
    pub dataset_label: String,

    #[serde(default)]
    pub labels: FilterLabels,
}

fn default_utc_offset() -> i32 {
    DEFAULT_UTC_OFFSET_HOURS
}

fn default_toast_ttl() -> u64 {
    DEFAULT_TOAST_TTL_MS
}

fn default_dataset_label() -> String {
    DEFAULT_DATASET_LABEL.to_string()
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            locale: DisplayLocale::default(),
            utc_offset_hours: default_utc_offset(),
            toast_ttl_ms: default_toast_ttl(),
            dataset_label: default_dataset_label(),
            labels: FilterLabels::default(),
        }
    }
}

impl DashboardSettings {
    pub fn aggregator(&self) -> Result<AggregatorConfig, AggregateError> {
        AggregatorConfig::new(self.locale, self.utc_offset_hours)
    }

    pub fn dashboard(&self) -> DashboardConfig {
        DashboardConfig {
            labels: self.labels.clone(),
            dataset_label: self.dataset_label.clone(),
        }
    }
}

/// Monthly billing
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Price of one kWh above the room limit
    #[serde(default = "default_rate")]
    pub rate_per_kwh: f64,

    /// How often the bill generator runs (hours, 0 disables it)
    #[serde(default = "default_schedule_interval")]
    pub schedule_interval_hours: u64,
}

fn default_rate() -> f64 {
    1400.0
}

fn default_schedule_interval() -> u64 {
    24
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            rate_per_kwh: default_rate(),
            schedule_interval_hours: default_schedule_interval(),
        }
    }
}

/// Power sample handling
#[derive(Debug, Clone, Deserialize)]
pub struct PowerConfig {
    /// Seconds covered by one watt sample
    #[serde(default = "default_sample_interval")]
    pub sample_interval_secs: f64,

    /// History rows per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_sample_interval() -> f64 {
    1.0
}

fn default_page_size() -> usize {
    15
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            sample_interval_secs: default_sample_interval(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,

    #[serde(default = "default_sdk_timeout")]
    pub request_timeout_ms: u64,

    /// bcrypt work factor for local accounts
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_sqlite_path() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("daya").join("daya.db").to_string_lossy().to_string())
        .unwrap_or_else(|| "./daya_data/daya.db".to_string())
}

fn default_sdk_timeout() -> u64 {
    10_000
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            sqlite_path: default_sqlite_path(),
            request_timeout_ms: default_sdk_timeout(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("daya").join("config.toml")),
            Some(PathBuf::from("/etc/daya/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Back-end settings for [`Sdk::bootstrap`](crate::sdk::Sdk::bootstrap)
    pub fn sdk(&self) -> SdkConfig {
        SdkConfig {
            backend: self.backend.kind,
            project: self.firebase.clone(),
            sqlite_path: self.backend.sqlite_path.clone(),
            request_timeout_ms: self.backend.request_timeout_ms,
            bcrypt_cost: self.backend.bcrypt_cost,
        }
    }

    /// Billing and history settings for the domain services
    pub fn domain(&self) -> Result<DomainConfig, AggregateError> {
        Ok(DomainConfig {
            rate_per_kwh: self.billing.rate_per_kwh,
            sample_interval_secs: self.power.sample_interval_secs,
            page_size: self.power.page_size,
            utc_offset: self.dashboard.aggregator()?.utc_offset,
        })
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(host) = var("DAYA_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("DAYA_API_PORT").and_then(|p| p.parse().ok()) {
            self.api.port = port;
        }

        if let Some(locale) = var("DAYA_LOCALE").and_then(|l| l.parse().ok()) {
            self.dashboard.locale = locale;
        }
        if let Some(offset) = var("DAYA_UTC_OFFSET_HOURS").and_then(|o| o.parse().ok()) {
            self.dashboard.utc_offset_hours = offset;
        }

        if let Some(rate) = var("DAYA_BILLING_RATE").and_then(|r| r.parse().ok()) {
            self.billing.rate_per_kwh = rate;
        }

        match var("DAYA_BACKEND").as_deref() {
            Some("firebase") => self.backend.kind = BackendKind::Firebase,
            Some("local") => self.backend.kind = BackendKind::Local,
            _ => {}
        }
        if let Some(path) = var("DAYA_SQLITE_PATH") {
            self.backend.sqlite_path = path;
        }

        if let Some(key) = var("DAYA_FIREBASE_API_KEY") {
            self.firebase.api_key = key;
        }
        if let Some(project) = var("DAYA_FIREBASE_PROJECT_ID") {
            self.firebase.project_id = project;
        }

        if let Some(level) = var("DAYA_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("DAYA_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Daya Configuration
#
# Environment variables override these settings:
# - DAYA_API_HOST, DAYA_API_PORT
# - DAYA_LOCALE, DAYA_UTC_OFFSET_HOURS
# - DAYA_BILLING_RATE
# - DAYA_BACKEND (local | firebase), DAYA_SQLITE_PATH
# - DAYA_FIREBASE_API_KEY, DAYA_FIREBASE_PROJECT_ID
# - DAYA_LOG_LEVEL, DAYA_LOG_FORMAT

[api]
host = "0.0.0.0"
port = 8082
cors_origins = ["http://localhost:8084", "http://127.0.0.1:8084"]
request_timeout_secs = 30

[dashboard]
# Locale for month and weekday names: id_ID, en_US, en_GB, nl_NL, de_DE, fr_FR, ja_JP
locale = "id_ID"

# Offset that zoned timestamps are shown in
utc_offset_hours = 7

# How long a toast stays visible (ms)
toast_ttl_ms = 3000

dataset_label = "Daya (kWh)"

[dashboard.labels]
all_months = "Semua Data"
all_weeks = "Semua Minggu"
week = "Minggu"
month_caption = "Bulan:"
week_caption = "Minggu:"

[billing]
# Price per kWh above the room limit
rate_per_kwh = 1400.0

# Bill generator interval in hours (0 disables it)
schedule_interval_hours = 24

[power]
# Seconds covered by one watt sample
sample_interval_secs = 1.0

# History rows per page
page_size = 15

[backend]
# local (SQLite + bcrypt) or firebase (identity toolkit + Firestore)
kind = "local"
sqlite_path = "./daya_data/daya.db"
request_timeout_ms = 10000
bcrypt_cost = 12

[firebase]
api_key = ""
auth_domain = ""
project_id = ""
storage_bucket = ""
messaging_sender_id = ""
app_id = ""
measurement_id = ""

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
