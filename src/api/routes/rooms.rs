//! Room Routes
//!
//! Owner-only room management.
//!
//! - GET /api/v1/rooms - List rooms
//! - POST /api/v1/rooms - Create a room
//! - PUT /api/v1/rooms/:id - Edit a room
//! - DELETE /api/v1/rooms/:id - Delete a room
//! - POST /api/v1/rooms/:id/assign - Assign or unassign the tenant
//! - POST /api/v1/rooms/:id/relay - Switch the relay
//! - GET /api/v1/tenants - Tenants available for assignment

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::auth::AuthUser;
use crate::api::dto::{AssignRequest, Notice, RelayRequest, RoomListResponse, TenantListResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::domain::{Room, RoomInput};
use crate::notify::FlashMessage;

/// GET /api/v1/rooms
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<RoomListResponse>> {
    user.require_owner()?;
    let rooms = state.rooms.list().await?;
    Ok(Json(RoomListResponse {
        total: rooms.len(),
        rooms,
    }))
}

/// POST /api/v1/rooms
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<RoomInput>,
) -> ApiResult<(StatusCode, Json<Notice<Room>>)> {
    user.require_owner()?;
    let room = state.rooms.create(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(Notice::new(room, FlashMessage::success("Kamar berhasil ditambahkan!"))),
    ))
}

/// PUT /api/v1/rooms/:id
pub async fn update_room(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<RoomInput>,
) -> ApiResult<Json<Notice<Room>>> {
    user.require_owner()?;
    let room = state.rooms.update(&id, req).await?;
    Ok(Json(Notice::new(room, FlashMessage::success("Kamar berhasil diupdate!"))))
}

/// DELETE /api/v1/rooms/:id
pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Notice<Room>>> {
    user.require_owner()?;
    let room = state.rooms.delete(&id).await?;
    Ok(Json(Notice::new(room, FlashMessage::success("Kamar berhasil dihapus!"))))
}

/// POST /api/v1/rooms/:id/assign
pub async fn assign_tenant(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<AssignRequest>,
) -> ApiResult<Json<Notice<Room>>> {
    user.require_owner()?;
    let room = state.rooms.assign(&id, req.tenant_id.as_deref()).await?;

    let flash = match room.tenant_id {
        Some(_) => FlashMessage::success("Penghuni berhasil di-assign ke kamar."),
        None => FlashMessage::info("Penghuni berhasil di-unassign dari kamar."),
    };
    Ok(Json(Notice::new(room, flash)))
}

/// POST /api/v1/rooms/:id/relay
pub async fn set_relay(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<RelayRequest>,
) -> ApiResult<Json<Notice<Room>>> {
    user.require_owner()?;
    let room = state.rooms.set_relay(&id, req.on).await?;

    let flash = FlashMessage::success(format!(
        "Status relay Kamar {} diperbarui menjadi {}.",
        room.number,
        if room.relay_on { "ON" } else { "OFF" }
    ));
    Ok(Json(Notice::new(room, flash)))
}

/// GET /api/v1/tenants
pub async fn list_tenants(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<TenantListResponse>> {
    user.require_owner()?;
    Ok(Json(TenantListResponse {
        tenants: state.users.tenants().await?,
    }))
}
