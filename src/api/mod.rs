//! Daya REST API
//!
//! HTTP API layer, built with Axum. Every route except login, register,
//! dashboard aggregation and health needs an `Authorization: Bearer` token.
//!
//! # Endpoints
//!
//! ## Auth
//! - `POST /api/v1/auth/login` - Sign in
//! - `POST /api/v1/auth/register` - Create an account
//! - `GET /api/v1/auth/me` - Current profile
//! - `POST /api/v1/auth/password` - Change password
//! - `POST /api/v1/auth/logout` - End the session
//!
//! ## Rooms (owner)
//! - `GET /api/v1/rooms` - List rooms
//! - `POST /api/v1/rooms` - Create a room
//! - `PUT /api/v1/rooms/:id` - Edit a room
//! - `DELETE /api/v1/rooms/:id` - Delete a room
//! - `POST /api/v1/rooms/:id/assign` - Assign or unassign a tenant
//! - `POST /api/v1/rooms/:id/relay` - Switch the relay
//! - `GET /api/v1/tenants` - List tenants
//!
//! ## Power
//! - `GET /api/v1/rooms/:id/usage` - Chart series
//! - `POST /api/v1/power` - Record a sample
//! - `GET /api/v1/history` - Usage history
//! - `GET /api/v1/history/export` - Usage history as CSV
//!
//! ## Bills
//! - `GET /api/v1/bills` - List bills
//! - `POST /api/v1/bills/generate` - Issue this month's bills
//! - `POST /api/v1/bills/:id/verify` - Accept or reject a payment
//! - `POST /api/v1/bills/:id/proof` - Upload a payment proof
//!
//! ## Dashboard
//! - `POST /api/v1/dashboard/aggregate` - Filtered chart series
//! - `GET /api/v1/dashboard/overview` - Landing data
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status

pub mod auth;
pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use auth::AuthUser;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Auth routes
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/me", get(routes::auth::me))
        .route("/auth/password", post(routes::auth::change_password))
        .route("/auth/logout", post(routes::auth::logout))
        // Room routes
        .route(
            "/rooms",
            get(routes::rooms::list_rooms).post(routes::rooms::create_room),
        )
        .route(
            "/rooms/:id",
            put(routes::rooms::update_room).delete(routes::rooms::delete_room),
        )
        .route("/rooms/:id/assign", post(routes::rooms::assign_tenant))
        .route("/rooms/:id/relay", post(routes::rooms::set_relay))
        .route("/tenants", get(routes::rooms::list_tenants))
        // Power routes
        .route("/rooms/:id/usage", get(routes::power::room_usage))
        .route("/power", post(routes::power::ingest_sample))
        .route("/history", get(routes::power::history))
        .route("/history/export", get(routes::power::export_history))
        // Bill routes
        .route("/bills", get(routes::bills::list_bills))
        .route("/bills/generate", post(routes::bills::generate_bills))
        .route("/bills/:id/verify", post(routes::bills::verify_payment))
        .route("/bills/:id/proof", post(routes::bills::upload_proof))
        // Dashboard routes
        .route("/dashboard/aggregate", post(routes::dashboard::aggregate))
        .route("/dashboard/overview", get(routes::dashboard::overview));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.cors_origins);
    let timeout = Duration::from_secs(state.config.request_timeout_secs.max(1));
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// CORS for the configured front-end origins; none configured allows any
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        return CorsLayer::permissive();
    }
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server
pub async fn serve(state: AppState) -> Result<(), ApiError> {
    let addr = state.config.addr();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Daya API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Daya API shut down gracefully");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
