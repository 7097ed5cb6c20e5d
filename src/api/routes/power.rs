//! Power Routes
//!
//! - GET /api/v1/rooms/:id/usage - Chart series for a room
//! - POST /api/v1/power - Record a meter sample
//! - GET /api/v1/history - Paginated usage history with per-room summary
//! - GET /api/v1/history/export - The same history as CSV
//!
//! Tenants only ever see their own room.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::api::auth::AuthUser;
use crate::api::dto::{HistoryQuery, IngestRequest, UsageQuery};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::aggregate::MonthKey;
use crate::domain::{HistoryFilter, HistoryPage, PowerSample, Role, UsageSeries};

/// GET /api/v1/rooms/:id/usage
pub async fn room_usage(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Query(query): Query<UsageQuery>,
) -> ApiResult<Json<UsageSeries>> {
    ensure_room_visible(&state, &user, &id).await?;
    state.rooms.get(&id).await?;

    let series = match query.recent {
        Some(count) => state.power.recent(&id, count).await?,
        None => {
            let month = query
                .month
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(|m| {
                    m.parse::<MonthKey>()
                        .map_err(|_| ApiError::Validation(format!("invalid month: {}", m)))
                })
                .transpose()?;
            state.power.usage_series(&id, month).await?
        }
    };

    Ok(Json(series))
}

/// POST /api/v1/power
pub async fn ingest_sample(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<IngestRequest>,
) -> ApiResult<(StatusCode, Json<PowerSample>)> {
    user.require_owner()?;
    let sample = state.power.record(&req.room_id, req.watts, req.timestamp).await?;
    Ok((StatusCode::CREATED, Json(sample)))
}

/// GET /api/v1/history
pub async fn history(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryPage>> {
    let filter = scoped_filter(&state, &user, &query).await?;
    let page = match filter {
        Some(filter) => state.power.history(&filter).await?,
        None => HistoryPage::empty(query.page.unwrap_or(1)),
    };
    Ok(Json(page))
}

/// GET /api/v1/history/export
pub async fn export_history(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Response> {
    let csv = match scoped_filter(&state, &user, &query).await? {
        Some(filter) => state.power.export_csv(&filter).await?,
        None => String::new(),
    };

    let filename = format!(
        "histori_daya_{}.csv",
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    )
        .into_response())
}

/// History filter limited to what `user` may see
///
/// `None` means a tenant without a room, who sees nothing.
async fn scoped_filter(
    state: &AppState,
    user: &AuthUser,
    query: &HistoryQuery,
) -> ApiResult<Option<HistoryFilter>> {
    let mut filter = HistoryFilter::parse(
        query.room_id.as_deref(),
        query.date.as_deref(),
        query.month.as_deref(),
        query.page,
    )?;

    if user.profile().role == Role::Tenant {
        match state.rooms.room_of_tenant(user.uid()).await? {
            Some(room) => filter.room_id = Some(room.id),
            None => return Ok(None),
        }
    }
    Ok(Some(filter))
}

async fn ensure_room_visible(state: &AppState, user: &AuthUser, room_id: &str) -> ApiResult<()> {
    if user.profile().role == Role::Owner {
        return Ok(());
    }
    match state.rooms.room_of_tenant(user.uid()).await? {
        Some(room) if room.id == room_id => Ok(()),
        _ => Err(ApiError::Forbidden("room belongs to another tenant".to_string())),
    }
}
