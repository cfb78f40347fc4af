use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::notify::Notifier;
use crate::workflows::accounts::{Child, ChildRepository, GuardianId, GuardianRepository};
use crate::workflows::client_ip;

use super::domain::{
    ConsentSubmission, ContractSubmission, Document, DocumentKind, RecordSubmission,
};
use super::repository::DocumentRepository;
use super::service::{DocumentError, DocumentService};

/// Router builder for the guardian-facing document endpoints. The fronting
/// auth layer resolves the session and forwards the account in
/// `X-Guardian-Id`; the client address arrives in `X-Real-IP`.
pub fn documents_router<D, C, G, N>(service: Arc<DocumentService<D, C, G, N>>) -> Router
where
    D: DocumentRepository + 'static,
    C: ChildRepository + 'static,
    G: GuardianRepository + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/children/:child_id",
            get(child_detail_handler::<D, C, G, N>),
        )
        .route(
            "/api/v1/children/:child_id/contract",
            post(create_contract_handler::<D, C, G, N>),
        )
        .route(
            "/api/v1/children/:child_id/consent",
            post(create_consent_handler::<D, C, G, N>),
        )
        .route(
            "/api/v1/children/:child_id/record",
            post(create_record_handler::<D, C, G, N>),
        )
        .with_state(service)
}

/// Response for a successful document creation.
#[derive(Debug, Serialize)]
pub struct DocumentCreatedView {
    pub kind: DocumentKind,
    pub child_id: u64,
    pub parent_signed_at: DateTime<Utc>,
}

impl From<&Document> for DocumentCreatedView {
    fn from(document: &Document) -> Self {
        Self {
            kind: document.kind(),
            child_id: document.child().0,
            parent_signed_at: document.signatures().parent_signed_at,
        }
    }
}

/// Child detail for the guardian dashboard: display fields plus which of
/// the three documents are in place.
#[derive(Debug, Serialize)]
pub struct ChildDetailView {
    pub id: u64,
    pub full_name: String,
    pub date_of_birth: String,
    pub contracted_days: String,
    pub contract_start_date: String,
    pub contract_in_place: bool,
    pub consent_in_place: bool,
    pub record_in_place: bool,
}

impl ChildDetailView {
    fn build(child: &Child, documents: &[Document]) -> Self {
        let has = |kind: DocumentKind| documents.iter().any(|doc| doc.kind() == kind);
        Self {
            id: child.id.0,
            full_name: child.full_name(),
            date_of_birth: child.dob.format("%d/%m/%Y").to_string(),
            contracted_days: child.contracted_days_display(),
            contract_start_date: child.contract_start_date_display(),
            contract_in_place: has(DocumentKind::Contract),
            consent_in_place: has(DocumentKind::Consent),
            record_in_place: has(DocumentKind::Record),
        }
    }
}

fn authenticated_guardian(headers: &HeaderMap) -> Option<GuardianId> {
    headers
        .get("x-guardian-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .map(GuardianId)
}

fn unauthenticated() -> Response {
    let body = axum::Json(json!({ "error": "no authenticated guardian on this request" }));
    (StatusCode::UNAUTHORIZED, body).into_response()
}

pub(crate) async fn create_contract_handler<D, C, G, N>(
    State(service): State<Arc<DocumentService<D, C, G, N>>>,
    Path(child_id): Path<u64>,
    headers: HeaderMap,
    axum::Json(submission): axum::Json<ContractSubmission>,
) -> Response
where
    D: DocumentRepository + 'static,
    C: ChildRepository + 'static,
    G: GuardianRepository + 'static,
    N: Notifier + 'static,
{
    let Some(guardian) = authenticated_guardian(&headers) else {
        return unauthenticated();
    };
    let result = service.create_contract(
        guardian,
        crate::workflows::accounts::ChildId(child_id),
        submission,
        client_ip(&headers),
    );
    created_response(result)
}

pub(crate) async fn create_consent_handler<D, C, G, N>(
    State(service): State<Arc<DocumentService<D, C, G, N>>>,
    Path(child_id): Path<u64>,
    headers: HeaderMap,
    axum::Json(submission): axum::Json<ConsentSubmission>,
) -> Response
where
    D: DocumentRepository + 'static,
    C: ChildRepository + 'static,
    G: GuardianRepository + 'static,
    N: Notifier + 'static,
{
    let Some(guardian) = authenticated_guardian(&headers) else {
        return unauthenticated();
    };
    let result = service.create_consent(
        guardian,
        crate::workflows::accounts::ChildId(child_id),
        submission,
        client_ip(&headers),
    );
    created_response(result)
}

pub(crate) async fn create_record_handler<D, C, G, N>(
    State(service): State<Arc<DocumentService<D, C, G, N>>>,
    Path(child_id): Path<u64>,
    headers: HeaderMap,
    axum::Json(submission): axum::Json<RecordSubmission>,
) -> Response
where
    D: DocumentRepository + 'static,
    C: ChildRepository + 'static,
    G: GuardianRepository + 'static,
    N: Notifier + 'static,
{
    let Some(guardian) = authenticated_guardian(&headers) else {
        return unauthenticated();
    };
    let result = service.create_record(
        guardian,
        crate::workflows::accounts::ChildId(child_id),
        submission,
        client_ip(&headers),
    );
    created_response(result)
}

pub(crate) async fn child_detail_handler<D, C, G, N>(
    State(service): State<Arc<DocumentService<D, C, G, N>>>,
    Path(child_id): Path<u64>,
    headers: HeaderMap,
) -> Response
where
    D: DocumentRepository + 'static,
    C: ChildRepository + 'static,
    G: GuardianRepository + 'static,
    N: Notifier + 'static,
{
    let Some(guardian) = authenticated_guardian(&headers) else {
        return unauthenticated();
    };
    match service.documents_for(guardian, crate::workflows::accounts::ChildId(child_id)) {
        Ok((child, documents)) => {
            let view = ChildDetailView::build(&child, &documents);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn created_response(result: Result<Document, DocumentError>) -> Response {
    match result {
        Ok(document) => (
            StatusCode::CREATED,
            axum::Json(DocumentCreatedView::from(&document)),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: DocumentError) -> Response {
    let status = match &error {
        DocumentError::NotFound => StatusCode::NOT_FOUND,
        DocumentError::Forbidden => StatusCode::FORBIDDEN,
        DocumentError::AlreadyExists(_) => StatusCode::CONFLICT,
        DocumentError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DocumentError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        DocumentError::Render(_) | DocumentError::Delivery(_) => StatusCode::BAD_GATEWAY,
    };

    let body = match &error {
        // The document is durable at this point; only the fan-out failed.
        DocumentError::Render(_) | DocumentError::Delivery(_) => axum::Json(json!({
            "error": "something went wrong sending your copy; the document was recorded",
        })),
        other => axum::Json(json!({ "error": other.to_string() })),
    };

    (status, body).into_response()
}
