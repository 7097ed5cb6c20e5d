//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dashboard::{BreakpointConfig, ChartSeries, FilterControls};
use crate::domain::{Bill, Role, Room, UserProfile};
use crate::notify::FlashMessage;

// ============================================
// COMMON
// ============================================

/// Result of a mutating call: the changed resource plus the notice the UI
/// shows as a toast
#[derive(Debug, Serialize)]
pub struct Notice<T> {
    pub data: T,
    pub flash: FlashMessage,
}

impl<T> Notice<T> {
    pub fn new(data: T, flash: FlashMessage) -> Self {
        Self { data, flash }
    }
}

// ============================================
// AUTH DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Defaults to tenant
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Tenant
}

#[derive(Debug, Deserialize)]
pub struct PasswordRequest {
    pub new_password: String,
    /// Must repeat `new_password` when given
    #[serde(default)]
    pub confirm_password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserProfile,
    /// Room the tenant occupies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<Room>,
}

// ============================================
// ROOM DTOs
// ============================================

#[derive(Debug, Serialize)]
pub struct RoomListResponse {
    pub rooms: Vec<Room>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    /// Empty or missing empties the room
    #[serde(default)]
    pub tenant_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RelayRequest {
    pub on: bool,
}

#[derive(Debug, Serialize)]
pub struct TenantListResponse {
    pub tenants: Vec<UserProfile>,
}

// ============================================
// POWER DTOs
// ============================================

/// One meter reading
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub room_id: String,
    pub watts: f64,
    /// Defaults to now
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UsageQuery {
    /// `YYYY-MM`
    #[serde(default)]
    pub month: Option<String>,
    /// Only the newest `recent` samples
    #[serde(default)]
    pub recent: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub room_id: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub date: Option<String>,
    /// `YYYY-MM`
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
}

// ============================================
// BILL DTOs
// ============================================

#[derive(Debug, Default, Deserialize)]
pub struct BillsQuery {
    #[serde(default)]
    pub room_id: Option<String>,
    /// `YYYY-MM`
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub created: usize,
    pub flash: FlashMessage,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub accept: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProofRequest {
    pub proof_url: String,
}

// ============================================
// DASHBOARD DTOs
// ============================================

/// Raw chart data plus the select values, as the page carries them
#[derive(Debug, Deserialize)]
pub struct AggregateRequest {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
    /// Missing selects start on the newest month
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub week: Option<String>,
    /// Viewport width in CSS pixels
    #[serde(default = "default_width")]
    pub width: f64,
}

fn default_width() -> f64 {
    1024.0
}

#[derive(Debug, Serialize)]
pub struct AggregateResponse {
    pub controls: FilterControls,
    pub series: ChartSeries,
    pub dataset_label: String,
    pub chart: BreakpointConfig,
    /// Indices of the x labels that get drawn
    pub ticks: Vec<usize>,
    pub total_kwh: f64,
}

/// A room with its most recent bill
#[derive(Debug, Serialize)]
pub struct RoomOverview {
    pub room: Room,
    pub latest_bill: Option<Bill>,
}

/// Landing data for either role
#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum OverviewResponse {
    Owner {
        rooms: Vec<RoomOverview>,
        tenants: Vec<UserProfile>,
    },
    Tenant {
        room: Option<RoomOverview>,
        /// Newest samples, oldest first
        recent_usage: ChartSeries,
        #[serde(skip_serializing_if = "Option::is_none")]
        flash: Option<FlashMessage>,
    },
}

// ============================================
// HEALTH DTOs
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy"
    pub status: String,
    pub auth: String,
    pub store: String,
    pub store_status: String,
    pub uptime_seconds: u64,
    pub version: String,
}
