use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::coordinator::{CreationOutcome, DeclineKind, NewDailyBooking, RentalCoordinator};
use super::domain::{DateRange, PropertyId, RentalMode, RequestId, UserId};
use super::requests::{RequestError, SubmitRentalRequest};

/// Router builder exposing the availability, booking, and rental-request
/// endpoints. Dates are ISO calendar dates with no time component.
pub fn occupancy_router(coordinator: Arc<RentalCoordinator>) -> Router {
    Router::new()
        .route("/api/v1/availability/check", post(check_availability_handler))
        .route("/api/v1/bookings", post(create_booking_handler))
        .route("/api/v1/rental-requests", post(submit_request_handler))
        .route(
            "/api/v1/rental-requests/:request_id/response",
            post(respond_handler),
        )
        .with_state(coordinator)
}

#[derive(Debug, Deserialize)]
pub(crate) struct AvailabilityCheckRequest {
    property_id: String,
    start: NaiveDate,
    end: NaiveDate,
    mode: RentalMode,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateBookingRequest {
    property_id: String,
    guest_id: String,
    start: NaiveDate,
    #[serde(default)]
    end: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitRequestPayload {
    property_id: String,
    user_id: String,
    proposed_start: NaiveDate,
    proposed_end: NaiveDate,
    lease_duration_months: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RequestResponsePayload {
    approved: bool,
    #[serde(default)]
    note: Option<String>,
}

pub(crate) async fn check_availability_handler(
    State(coordinator): State<Arc<RentalCoordinator>>,
    axum::Json(payload): axum::Json<AvailabilityCheckRequest>,
) -> Response {
    let range = match DateRange::new(payload.start, payload.end) {
        Ok(range) => range,
        Err(err) => {
            let body = json!({ "error": err.to_string() });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(body)).into_response();
        }
    };

    let report = coordinator.check_availability(
        &PropertyId(payload.property_id),
        &range,
        payload.mode,
    );
    (StatusCode::OK, axum::Json(report)).into_response()
}

pub(crate) async fn create_booking_handler(
    State(coordinator): State<Arc<RentalCoordinator>>,
    axum::Json(payload): axum::Json<CreateBookingRequest>,
) -> Response {
    let outcome = coordinator.create_daily_booking(NewDailyBooking {
        property_id: PropertyId(payload.property_id),
        guest_id: UserId(payload.guest_id),
        start: payload.start,
        end: payload.end,
    });

    match outcome {
        CreationOutcome::Created(booking) => {
            (StatusCode::CREATED, axum::Json(booking)).into_response()
        }
        CreationOutcome::Declined { kind, reason } => declined_response(kind, reason),
    }
}

pub(crate) async fn submit_request_handler(
    State(coordinator): State<Arc<RentalCoordinator>>,
    axum::Json(payload): axum::Json<SubmitRequestPayload>,
) -> Response {
    let submission = SubmitRentalRequest {
        property_id: PropertyId(payload.property_id),
        user_id: UserId(payload.user_id),
        proposed_start: payload.proposed_start,
        proposed_end: payload.proposed_end,
        lease_duration_months: payload.lease_duration_months,
    };

    match coordinator.create_annual_request(submission, Local::now().date_naive()) {
        CreationOutcome::Created(request) => {
            (StatusCode::ACCEPTED, axum::Json(request.status_view())).into_response()
        }
        CreationOutcome::Declined { kind, reason } => declined_response(kind, reason),
    }
}

pub(crate) async fn respond_handler(
    State(coordinator): State<Arc<RentalCoordinator>>,
    Path(request_id): Path<String>,
    axum::Json(payload): axum::Json<RequestResponsePayload>,
) -> Response {
    let id = RequestId(request_id);
    let today = Local::now().date_naive();

    match coordinator.respond_to_request(&id, payload.approved, payload.note, today) {
        Ok(request) => (StatusCode::OK, axum::Json(request.status_view())).into_response(),
        Err(RequestError::NotFound) => {
            let body = json!({ "error": "rental request not found", "request_id": id.0 });
            (StatusCode::NOT_FOUND, axum::Json(body)).into_response()
        }
        Err(err @ RequestError::AlreadyResolved(_)) => {
            let body = json!({ "error": err.to_string() });
            (StatusCode::CONFLICT, axum::Json(body)).into_response()
        }
        Err(RequestError::Store(err)) => {
            let body = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
        }
        Err(other) => {
            let body = json!({ "error": other.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(body)).into_response()
        }
    }
}

fn declined_response(kind: DeclineKind, reason: String) -> Response {
    let status = match kind {
        DeclineKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        DeclineKind::Conflict => StatusCode::CONFLICT,
        DeclineKind::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = json!({ "error": reason });
    (status, axum::Json(body)).into_response()
}
