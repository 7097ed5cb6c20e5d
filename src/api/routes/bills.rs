//! Bill Routes
//!
//! - GET /api/v1/bills - Bills visible to the caller, newest month first
//! - POST /api/v1/bills/generate - Issue this month's bills (owner)
//! - POST /api/v1/bills/:id/verify - Accept or reject a payment proof (owner)
//! - POST /api/v1/bills/:id/proof - Upload a payment proof (tenant)

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::auth::AuthUser;
use crate::api::dto::{BillsQuery, GenerateResponse, Notice, ProofRequest, VerifyRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::domain::{Bill, BillFilter, Page};
use crate::notify::FlashMessage;

/// GET /api/v1/bills
pub async fn list_bills(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<BillsQuery>,
) -> ApiResult<Json<Page<Bill>>> {
    let month = query
        .month
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| {
            m.parse()
                .map_err(|_| ApiError::Validation(format!("invalid month: {}", m)))
        })
        .transpose()?;

    let filter = BillFilter {
        room_id: query.room_id.filter(|r| !r.trim().is_empty()),
        month,
        page: query.page.unwrap_or(1),
    };
    Ok(Json(state.billing.list(user.profile(), &filter).await?))
}

/// POST /api/v1/bills/generate
pub async fn generate_bills(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<GenerateResponse>> {
    user.require_owner()?;
    let created = state.billing.generate_monthly_bills(chrono::Utc::now()).await?;

    let flash = if created > 0 {
        FlashMessage::success(format!("{} tagihan berhasil dibuat untuk bulan ini.", created))
    } else {
        FlashMessage::warning(
            "Tidak ada tagihan yang dibuat. Semua kamar berada di bawah batas kWh atau tagihan sudah dibuat.",
        )
    };
    Ok(Json(GenerateResponse { created, flash }))
}

/// POST /api/v1/bills/:id/verify
pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<VerifyRequest>,
) -> ApiResult<Json<Notice<Bill>>> {
    user.require_owner()?;
    let bill = state.billing.verify(&id, req.accept).await?;

    let flash = if req.accept {
        FlashMessage::success("Pembayaran berhasil dikonfirmasi.")
    } else {
        FlashMessage::warning("Pembayaran ditolak. Penghuni dapat mengunggah ulang bukti.")
    };
    Ok(Json(Notice::new(bill, flash)))
}

/// POST /api/v1/bills/:id/proof
pub async fn upload_proof(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<ProofRequest>,
) -> ApiResult<Json<Notice<Bill>>> {
    user.require_tenant()?;
    let bill = state
        .billing
        .upload_proof(&id, user.uid(), &req.proof_url)
        .await?;

    Ok(Json(Notice::new(
        bill,
        FlashMessage::success("Bukti pembayaran berhasil diunggah."),
    )))
}
