//! Dashboard Routes
//!
//! - POST /api/v1/dashboard/aggregate - Bucket raw chart data and apply the
//!   month/week selects
//! - GET /api/v1/dashboard/overview - Landing data for the caller's role

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::auth::AuthUser;
use crate::api::dto::{AggregateRequest, AggregateResponse, OverviewResponse, RoomOverview};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::dashboard::{ChartSeries, DashboardController};
use crate::domain::Role;
use crate::notify::FlashMessage;

/// Samples shown on a tenant's landing chart
const RECENT_SAMPLES: usize = 7;

/// POST /api/v1/dashboard/aggregate
///
/// Runs the same controller the browser mounts, so both render identical
/// series.
pub async fn aggregate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AggregateRequest>,
) -> ApiResult<Json<AggregateResponse>> {
    let aggregation = state.aggregator.aggregate(&req.labels, &req.data)?;
    let mut controller = DashboardController::mount(aggregation, state.dashboard.clone(), req.width);

    if req.month.is_some() || req.week.is_some() {
        controller.apply_query(req.month.as_deref(), req.week.as_deref())?;
    }

    let chart = controller.chart();
    let response = AggregateResponse {
        controls: controller.controls().clone(),
        series: chart.series().clone(),
        dataset_label: chart.dataset_label().to_string(),
        chart: *chart.config(),
        ticks: chart.tick_indices(),
        total_kwh: chart.series().total(),
    };
    controller.teardown();

    Ok(Json(response))
}

/// GET /api/v1/dashboard/overview
pub async fn overview(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<OverviewResponse>> {
    let response = match user.profile().role {
        Role::Owner => {
            let mut rooms = Vec::new();
            for room in state.rooms.list().await? {
                let latest_bill = state.billing.latest(&room.id).await?;
                rooms.push(RoomOverview { room, latest_bill });
            }
            OverviewResponse::Owner {
                rooms,
                tenants: state.users.tenants().await?,
            }
        }
        Role::Tenant => match state.rooms.room_of_tenant(user.uid()).await? {
            Some(room) => {
                let usage = state.power.recent(&room.id, RECENT_SAMPLES).await?;
                let latest_bill = state.billing.latest(&room.id).await?;
                OverviewResponse::Tenant {
                    room: Some(RoomOverview { room, latest_bill }),
                    recent_usage: ChartSeries::new(usage.labels, usage.values)?,
                    flash: None,
                }
            }
            None => OverviewResponse::Tenant {
                room: None,
                recent_usage: ChartSeries::default(),
                flash: Some(FlashMessage::warning("Kamu belum terdaftar di kamar mana pun.")),
            },
        },
    };

    Ok(Json(response))
}
