use axum::http::StatusCode;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::documents::router::documents_router;

async fn read_json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

fn contract_request(guardian: Option<&str>) -> axum::http::Request<axum::body::Body> {
    let payload = json!({
        "parent1_name": "jo bloggs",
        "parent1_address": "12 Duck Lane, Pondham",
        "authorised_collectors": "Granny Bloggs, 3 Pond Row",
        "collection_password": "quackers",
        "parent_signature": "Jo Bloggs",
    });

    let mut builder = axum::http::Request::post("/api/v1/children/7/contract")
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .header("x-real-ip", "203.0.113.9");
    if let Some(id) = guardian {
        builder = builder.header("x-guardian-id", id);
    }
    builder
        .body(axum::body::Body::from(
            serde_json::to_vec(&payload).unwrap(),
        ))
        .unwrap()
}

#[tokio::test]
async fn contract_route_creates_then_conflicts() {
    let (service, _, notifier) = build_service();
    let router = documents_router(service);

    let response = router
        .clone()
        .oneshot(contract_request(Some("11")))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("kind"), Some(&json!("contract")));
    assert_eq!(payload.get("child_id"), Some(&json!(7)));
    assert_eq!(notifier.messages().len(), 2);

    let response = router
        .oneshot(contract_request(Some("11")))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert!(payload
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .contains("already in place"));
}

#[tokio::test]
async fn missing_guardian_header_is_unauthorized() {
    let (service, documents, _) = build_service();
    let router = documents_router(service);

    let response = router
        .oneshot(contract_request(None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(documents.count(), 0);
}

#[tokio::test]
async fn wrong_guardian_is_forbidden() {
    let (service, documents, _) = build_service();
    let router = documents_router(service);

    let response = router
        .oneshot(contract_request(Some("12")))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(documents.count(), 0);
}

#[tokio::test]
async fn missing_required_field_is_unprocessable() {
    let (service, _, _) = build_service();
    let router = documents_router(service);

    let payload = json!({ "parent1_name": "jo bloggs" });
    let request = axum::http::Request::post("/api/v1/children/7/contract")
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .header("x-guardian-id", "11")
        .body(axum::body::Body::from(
            serde_json::to_vec(&payload).unwrap(),
        ))
        .unwrap();

    let response = router.oneshot(request).await.expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .contains("required field"));
}

#[tokio::test]
async fn child_detail_reports_documents_in_place() {
    let (service, _, _) = build_service();
    let router = documents_router(service.clone());

    service
        .create_consent(GUARDIAN, CHILD, consent_submission(), None)
        .expect("consent created");

    let request = axum::http::Request::get("/api/v1/children/7")
        .header("x-guardian-id", "11")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("full_name"), Some(&json!("Maya Bloggs")));
    assert_eq!(payload.get("consent_in_place"), Some(&json!(true)));
    assert_eq!(payload.get("contract_in_place"), Some(&json!(false)));
    assert_eq!(payload.get("record_in_place"), Some(&json!(false)));
    assert_eq!(
        payload.get("contracted_days"),
        Some(&json!("Monday, Tuesday, Thursday"))
    );
}
