use crate::infra::{deserialize_optional_date, AppState};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use lettings::error::AppError;
use lettings::occupancy::{occupancy_router, LeaseCalculator, LeaseExpiry, RentalCoordinator};

#[derive(Debug, Deserialize)]
pub(crate) struct LeaseReportRequest {
    #[serde(default = "default_days_ahead")]
    pub(crate) days_ahead: u32,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
}

fn default_days_ahead() -> u32 {
    60
}

#[derive(Debug, Serialize)]
pub(crate) struct LeaseReportResponse {
    pub(crate) today: NaiveDate,
    pub(crate) days_ahead: u32,
    pub(crate) expiring: Vec<LeaseExpiry>,
    pub(crate) expired: Vec<LeaseExpiry>,
}

pub(crate) fn with_occupancy_routes(
    coordinator: Arc<RentalCoordinator>,
    lease: Arc<LeaseCalculator>,
) -> axum::Router {
    occupancy_router(coordinator)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/leases/report",
            axum::routing::post(move |payload| lease_report_endpoint(lease.clone(), payload)),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn lease_report_endpoint(
    lease: Arc<LeaseCalculator>,
    Json(payload): Json<LeaseReportRequest>,
) -> Result<Json<LeaseReportResponse>, AppError> {
    let LeaseReportRequest { days_ahead, today } = payload;
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    let expiring = lease.list_expiring(days_ahead, today)?;
    let expired = lease.list_expired(today)?;

    Ok(Json(LeaseReportResponse {
        today,
        days_ahead,
        expiring,
        expired,
    }))
}
