//! Auth Routes
//!
//! - POST /api/v1/auth/login - Exchange email and password for a token
//! - POST /api/v1/auth/register - Create an account
//! - GET /api/v1/auth/me - Current profile and room
//! - POST /api/v1/auth/password - Change own password
//! - POST /api/v1/auth/logout - End the current session

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

use crate::api::auth::{bearer_token, AuthUser};
use crate::api::dto::{LoginRequest, LoginResponse, MeResponse, Notice, PasswordRequest, RegisterRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::domain::{DomainError, Role, UserProfile};
use crate::notify::FlashMessage;
use crate::sdk::SdkError;

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<Notice<LoginResponse>>> {
    let (session, user) = match state.users.login(&req.email, &req.password).await {
        Ok(found) => found,
        Err(DomainError::Sdk(SdkError::InvalidCredentials)) => {
            return Err(ApiError::Unauthorized("Email atau password salah!".to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(uid = %user.uid, role = user.role.as_str(), "User logged in");

    let flash = FlashMessage::success(format!("Selamat datang, {}!", user.name));
    Ok(Json(Notice::new(
        LoginResponse {
            token: session.token,
            expires_at: session.expires_at,
            user,
        },
        flash,
    )))
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Notice<UserProfile>>)> {
    let user = state
        .users
        .register(&req.name, &req.email, &req.password, req.role)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Notice::new(user, FlashMessage::success("Registrasi berhasil!"))),
    ))
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<MeResponse>> {
    let room = match user.profile().role {
        Role::Tenant => state.rooms.room_of_tenant(user.uid()).await?,
        Role::Owner => None,
    };

    Ok(Json(MeResponse { user: user.0, room }))
}

/// POST /api/v1/auth/password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<PasswordRequest>,
) -> ApiResult<Json<FlashMessage>> {
    if let Some(confirm) = &req.confirm_password {
        if confirm != &req.new_password {
            return Err(ApiError::Validation("password confirmation does not match".to_string()));
        }
    }

    state
        .users
        .change_password(user.uid(), &req.new_password)
        .await
        .map_err(|e| match e {
            DomainError::Sdk(SdkError::WeakPassword(m)) => {
                ApiError::Validation(format!("Gagal mengubah password: {}", m))
            }
            other => other.into(),
        })?;

    Ok(Json(FlashMessage::success("Password berhasil diperbarui.")))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    headers: HeaderMap,
) -> ApiResult<Json<FlashMessage>> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

    state.users.logout(token).await?;
    tracing::info!(uid = %user.uid(), "User logged out");

    Ok(Json(FlashMessage::success("Berhasil keluar.")))
}
