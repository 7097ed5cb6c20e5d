//! HTTP API Client
//!
//! Calls into the Daya REST API. Every authenticated call carries the
//! session's bearer token.

use chrono::{DateTime, Utc};
use daya::{ChartSeries, FlashMessage};
use gloo_net::http::{Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Default API base URL
pub const DEFAULT_API_BASE: &str = "http://localhost:8082/api/v1";

const API_URL_KEY: &str = "daya_api_url";

/// Get the API base URL from local storage or use default
pub fn get_api_base() -> String {
    let stored = web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .and_then(|s| s.get_item(API_URL_KEY).ok().flatten());
    normalize_base(stored.as_deref().unwrap_or(DEFAULT_API_BASE))
}

/// Set the API base URL in local storage
pub fn set_api_base(url: &str) {
    if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
        let _ = storage.set_item(API_URL_KEY, &normalize_base(url));
    }
}

fn normalize_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

// ============ Response Types ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Tenant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Room {
    pub id: String,
    pub number: String,
    pub tariff_per_kwh: f64,
    #[serde(default)]
    pub limit_kwh: f64,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub relay_on: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Bill {
    pub id: String,
    pub room_id: String,
    pub month: String,
    pub kwh_over_limit: f64,
    pub total: f64,
    /// `unpaid`, `pending`, `paid` or `rejected`
    pub status: String,
    #[serde(default)]
    pub proof_url: Option<String>,
    #[serde(default)]
    pub proof_uploaded_at: Option<DateTime<Utc>>,
}

impl Bill {
    /// Tenants may (re)submit proof until the bill is paid
    pub fn accepts_proof(&self) -> bool {
        self.status != "paid"
    }

    pub fn status_label(&self) -> &'static str {
        match self.status.as_str() {
            "paid" => "Lunas",
            "pending" => "Menunggu verifikasi",
            "rejected" => "Ditolak",
            _ => "Belum dibayar",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Parallel timestamp labels and kWh values, as fed to the aggregator
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Mutation result plus the flash to toast
#[derive(Debug, Deserialize)]
pub struct Notice<T> {
    pub data: T,
    pub flash: FlashMessage,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub created: usize,
    pub flash: FlashMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomOverview {
    pub room: Room,
    #[serde(default)]
    pub latest_bill: Option<Bill>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Overview {
    Owner {
        rooms: Vec<RoomOverview>,
        tenants: Vec<UserProfile>,
    },
    Tenant {
        room: Option<RoomOverview>,
        recent_usage: ChartSeries,
        #[serde(default)]
        flash: Option<FlashMessage>,
    },
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

// ============ Plumbing ============

fn url(path: &str) -> String {
    format!("{}{}", get_api_base(), path)
}

fn authorized(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => builder.header("Authorization", &format!("Bearer {}", token)),
        None => builder,
    }
}

/// Turn a response into `T`, or the server's error message
async fn read<T: DeserializeOwned>(response: Response) -> Result<T, String> {
    if !response.ok() {
        let status = response.status();
        return Err(match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => envelope.error.message,
            Err(_) => format!("HTTP {}", status),
        });
    }

    response
        .json()
        .await
        .map_err(|e| format!("Parse error: {}", e))
}

async fn get<T: DeserializeOwned>(path: &str, token: Option<&str>) -> Result<T, String> {
    let response = authorized(Request::get(&url(path)), token)
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;
    read(response).await
}

async fn post<B: Serialize, T: DeserializeOwned>(
    path: &str,
    body: &B,
    token: Option<&str>,
) -> Result<T, String> {
    let response = authorized(Request::post(&url(path)), token)
        .json(body)
        .map_err(|e| format!("Request build error: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;
    read(response).await
}

// ============ API Functions ============

pub async fn login(email: &str, password: &str) -> Result<Notice<LoginResponse>, String> {
    #[derive(Serialize)]
    struct LoginRequest<'a> {
        email: &'a str,
        password: &'a str,
    }

    post("/auth/login", &LoginRequest { email, password }, None).await
}

pub async fn logout(token: &str) -> Result<FlashMessage, String> {
    post("/auth/logout", &serde_json::json!({}), Some(token)).await
}

pub async fn fetch_overview(token: &str) -> Result<Overview, String> {
    get("/dashboard/overview", Some(token)).await
}

/// Usage series for a room; `month` is `YYYY-MM`, `None` for everything
pub async fn fetch_usage(
    token: &str,
    room_id: &str,
    month: Option<&str>,
) -> Result<UsageSeries, String> {
    let path = match month {
        Some(month) => format!("/rooms/{}/usage?month={}", room_id, month),
        None => format!("/rooms/{}/usage", room_id),
    };
    get(&path, Some(token)).await
}

pub async fn fetch_bills(token: &str, page: usize) -> Result<Page<Bill>, String> {
    get(&format!("/bills?page={}", page.max(1)), Some(token)).await
}

pub async fn generate_bills(token: &str) -> Result<GenerateResponse, String> {
    post("/bills/generate", &serde_json::json!({}), Some(token)).await
}

pub async fn verify_payment(token: &str, bill_id: &str, accept: bool) -> Result<Notice<Bill>, String> {
    post(
        &format!("/bills/{}/verify", bill_id),
        &serde_json::json!({ "accept": accept }),
        Some(token),
    )
    .await
}

pub async fn upload_proof(token: &str, bill_id: &str, proof_url: &str) -> Result<Notice<Bill>, String> {
    post(
        &format!("/bills/{}/proof", bill_id),
        &serde_json::json!({ "proof_url": proof_url }),
        Some(token),
    )
    .await
}

pub async fn set_relay(token: &str, room_id: &str, on: bool) -> Result<Notice<Room>, String> {
    post(
        &format!("/rooms/{}/relay", room_id),
        &serde_json::json!({ "on": on }),
        Some(token),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base() {
        assert_eq!(normalize_base(" http://host:8082/api/v1/ "), "http://host:8082/api/v1");
    }

    #[test]
    fn test_overview_tags() {
        let raw = r#"{
            "role": "tenant",
            "room": null,
            "recent_usage": {"labels": [], "compact_labels": [], "values": []},
            "flash": {"category": "warning", "message": "Kamu belum terdaftar di kamar mana pun."}
        }"#;
        match serde_json::from_str::<Overview>(raw).unwrap() {
            Overview::Tenant { room, flash, .. } => {
                assert!(room.is_none());
                assert_eq!(flash.unwrap().category, "warning");
            }
            Overview::Owner { .. } => panic!("expected tenant overview"),
        }
    }

    #[test]
    fn test_bill_status_labels() {
        let bill: Bill = serde_json::from_str(
            r#"{"id":"b1","room_id":"r1","month":"2024-05","kwh_over_limit":1.5,"total":2100.0,"status":"paid"}"#,
        )
        .unwrap();
        assert_eq!(bill.status_label(), "Lunas");
        assert!(!bill.accepts_proof());
    }
}
