use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::notify::Notifier;
use crate::workflows::client_ip;

use super::domain::{Guardian, GuardianId};
use super::repository::{ChildRepository, GuardianRepository};
use super::service::{AccountsError, AccountsService, NewGuardian};

/// Router builder for account provisioning and activation. Mounted behind
/// the staff-authenticated scope for provisioning; activation and reset are
/// public, gated by the token collaborator.
pub fn accounts_router<G, C, N>(service: Arc<AccountsService<G, C, N>>) -> Router
where
    G: GuardianRepository + 'static,
    C: ChildRepository + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route("/api/v1/guardians", post(provision_handler::<G, C, N>))
        .route(
            "/api/v1/guardians/:guardian_id/activate",
            post(activate_handler::<G, C, N>),
        )
        .route(
            "/api/v1/password-reset",
            post(password_reset_handler::<G, C, N>),
        )
        .route("/api/v1/children", post(enrol_child_handler::<G, C, N>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActivateRequest {
    pub(crate) token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PasswordResetRequest {
    pub(crate) email: String,
}

/// Sanitized representation of a guardian for API responses.
#[derive(Debug, Serialize)]
pub struct GuardianView {
    pub id: u64,
    pub full_name: String,
    pub email: String,
    pub active: bool,
}

impl From<&Guardian> for GuardianView {
    fn from(guardian: &Guardian) -> Self {
        Self {
            id: guardian.id.0,
            full_name: guardian.full_name(),
            email: guardian.email.clone(),
            active: guardian.is_active(),
        }
    }
}

pub(crate) async fn provision_handler<G, C, N>(
    State(service): State<Arc<AccountsService<G, C, N>>>,
    axum::Json(payload): axum::Json<NewGuardian>,
) -> Response
where
    G: GuardianRepository + 'static,
    C: ChildRepository + 'static,
    N: Notifier + 'static,
{
    match service.provision_guardian(payload) {
        Ok(guardian) => {
            (StatusCode::CREATED, axum::Json(GuardianView::from(&guardian))).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn activate_handler<G, C, N>(
    State(service): State<Arc<AccountsService<G, C, N>>>,
    Path(guardian_id): Path<u64>,
    headers: HeaderMap,
    axum::Json(payload): axum::Json<ActivateRequest>,
) -> Response
where
    G: GuardianRepository + 'static,
    C: ChildRepository + 'static,
    N: Notifier + 'static,
{
    let source_ip = client_ip(&headers);
    match service.activate_guardian(GuardianId(guardian_id), &payload.token, source_ip) {
        Ok(guardian) => {
            (StatusCode::OK, axum::Json(GuardianView::from(&guardian))).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn password_reset_handler<G, C, N>(
    State(service): State<Arc<AccountsService<G, C, N>>>,
    axum::Json(payload): axum::Json<PasswordResetRequest>,
) -> Response
where
    G: GuardianRepository + 'static,
    C: ChildRepository + 'static,
    N: Notifier + 'static,
{
    match service.request_password_reset(&payload.email) {
        Ok(()) => {
            let payload = json!({
                "status": "accepted",
                "detail": "if an account with this email exists, a reset link has been sent",
            });
            (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn enrol_child_handler<G, C, N>(
    State(service): State<Arc<AccountsService<G, C, N>>>,
    axum::Json(payload): axum::Json<super::service::NewChild>,
) -> Response
where
    G: GuardianRepository + 'static,
    C: ChildRepository + 'static,
    N: Notifier + 'static,
{
    match service.add_child(payload) {
        Ok(child) => {
            let view = json!({
                "id": child.id.0,
                "full_name": child.full_name(),
                "contracted_days": child.contracted_days_display(),
                "contract_start_date": child.contract_start_date_display(),
            });
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn error_response(error: AccountsError) -> Response {
    let status = match &error {
        AccountsError::NotFound => StatusCode::NOT_FOUND,
        AccountsError::Forbidden => StatusCode::FORBIDDEN,
        AccountsError::InvalidToken => StatusCode::BAD_REQUEST,
        AccountsError::AlreadyActive => StatusCode::CONFLICT,
        AccountsError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AccountsError::Delivery(_) => StatusCode::BAD_GATEWAY,
        AccountsError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = axum::Json(json!({ "error": error.to_string() }));
    (status, body).into_response()
}
