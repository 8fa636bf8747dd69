use std::sync::Arc;

use api_adapters::{router, AppState, AuthPorts};
use auth_adapters::{Argon2SecretHasher, JwtTokenService, LogMailer, UuidCodeGenerator};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use storage_adapters::MemoryStore;
use tower::ServiceExt;

fn app() -> Router {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(
        store.clone(),
        store.clone(),
        store,
        AuthPorts {
            codes: Arc::new(UuidCodeGenerator),
            hasher: Arc::new(Argon2SecretHasher::new()),
            tokens: Arc::new(JwtTokenService::new("route-tests", chrono::Duration::hours(1))),
            mailer: Arc::new(LogMailer::new("noreply@yamdb.test")),
        },
    );
    router(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn anonymous_reads_are_open() {
    let response = app()
        .oneshot(Request::get("/api/v1/categories/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn anonymous_write_is_unauthenticated() {
    let response = app()
        .oneshot(
            Request::post("/api/v1/genres/")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"name":"Drama","slug":"drama"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_json(response).await["detail"].is_string());
}

#[tokio::test]
async fn garbage_bearer_token_is_rejected() {
    let response = app()
        .oneshot(
            Request::get("/api/v1/titles/")
                .header(header::AUTHORIZATION, "Bearer not-a-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn metrics_are_exposed() {
    let response = app()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("yamdb_signups_total"));
}
