use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use crate::workflows::accounts::{ChildId, ChildRepository};

use super::repository::RegisterRepository;
use super::service::{AttendanceError, AttendanceService};

/// Router builder for the daily register. Mounted behind the
/// staff-authenticated scope; idempotency comes from the single-open-entry
/// invariant, not from request keys.
pub fn attendance_router<R, C>(service: Arc<AttendanceService<R, C>>) -> Router
where
    R: RegisterRepository + 'static,
    C: ChildRepository + 'static,
{
    Router::new()
        .route("/api/v1/register", get(register_handler::<R, C>))
        .route(
            "/api/v1/register/:child_id/clock-in",
            post(clock_in_handler::<R, C>),
        )
        .route(
            "/api/v1/register/:child_id/clock-out",
            post(clock_out_handler::<R, C>),
        )
        .with_state(service)
}

pub(crate) async fn register_handler<R, C>(
    State(service): State<Arc<AttendanceService<R, C>>>,
) -> Response
where
    R: RegisterRepository + 'static,
    C: ChildRepository + 'static,
{
    match service.register_view() {
        Ok(rows) => (StatusCode::OK, axum::Json(rows)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn clock_in_handler<R, C>(
    State(service): State<Arc<AttendanceService<R, C>>>,
    Path(child_id): Path<u64>,
) -> Response
where
    R: RegisterRepository + 'static,
    C: ChildRepository + 'static,
{
    match service.clock_in(ChildId(child_id)) {
        Ok(entry) => (StatusCode::CREATED, axum::Json(entry)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn clock_out_handler<R, C>(
    State(service): State<Arc<AttendanceService<R, C>>>,
    Path(child_id): Path<u64>,
) -> Response
where
    R: RegisterRepository + 'static,
    C: ChildRepository + 'static,
{
    match service.clock_out(ChildId(child_id)) {
        Ok(entry) => (StatusCode::OK, axum::Json(entry)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: AttendanceError) -> Response {
    let status = match &error {
        AttendanceError::NotFound => StatusCode::NOT_FOUND,
        AttendanceError::AlreadyClockedIn | AttendanceError::NotClockedIn => StatusCode::CONFLICT,
        AttendanceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = axum::Json(json!({ "error": error.to_string() }));
    (status, body).into_response()
}
