//! Integration tests for the health endpoint

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, create_test_router};
use tower::ServiceExt;

/// Verify that the health endpoint returns 200 with a JSON status
#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    // Arrange
    let app = create_test_router();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    // Act
    let response = app.oneshot(request).await.unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(
        content_type.contains("application/json"),
        "Content-Type should be application/json, got: {content_type}"
    );

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["triggers"], 3);
}

/// Verify that the health endpoint only answers GET
#[tokio::test]
async fn test_health_endpoint_rejects_post() {
    let app = create_test_router();
    let request = Request::builder()
        .method("POST")
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
