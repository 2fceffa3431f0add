//! Common test utilities for wext-interceptor-service integration tests
//!
//! This module provides:
//! - A router with one GitHub, one GitLab and one pinned trigger
//! - Request builders that sign deliveries the way each provider does
//! - Response helpers

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use wext_interceptor_core::{Interceptor, Provider, WebhookSecret};
use wext_interceptor_service::{create_router, AppState, Trigger};

pub const GITHUB_SECRET: &str = "github-trigger-secret";
pub const GITLAB_TOKEN: &str = "gitlab-trigger-token";

/// Body limit used by [`create_test_router`]
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// Router serving:
/// - `github`: detects the provider per delivery, GitHub secret
/// - `gitlab`: detects the provider per delivery, GitLab token
/// - `gitlab-pinned`: always handled as GitLab
pub fn create_test_router() -> Router {
    let state = AppState::new(
        Interceptor::new(),
        [
            Trigger::new("github", WebhookSecret::new(GITHUB_SECRET)),
            Trigger::new("gitlab", WebhookSecret::new(GITLAB_TOKEN)),
            Trigger::new("gitlab-pinned", WebhookSecret::new(GITLAB_TOKEN))
                .with_provider(Provider::GitLab),
        ],
    );
    create_router(state, MAX_BODY_SIZE)
}

pub fn sign_sha256(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

#[allow(dead_code)]
pub fn sign_sha1(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha1>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    format!("sha1={}", hex::encode(mac.finalize().into_bytes()))
}

/// Signed GitHub delivery to `/webhook/{trigger}` with extra headers
pub fn github_request(
    trigger: &str,
    event: &str,
    body: &str,
    extra: &[(&str, &str)],
) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/webhook/{trigger}"))
        .header("content-type", "application/json")
        .header("x-github-event", event)
        .header("x-github-delivery", "72d3162e-cc78-11e3-81ab-4c9367dc0958")
        .header(
            "x-hub-signature-256",
            sign_sha256(GITHUB_SECRET, body.as_bytes()),
        );
    for (name, value) in extra {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// GitLab delivery to `/webhook/{trigger}` carrying `token`
#[allow(dead_code)]
pub fn gitlab_request(
    trigger: &str,
    event: &str,
    token: &str,
    body: &str,
    extra: &[(&str, &str)],
) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/webhook/{trigger}"))
        .header("content-type", "application/json")
        .header("x-gitlab-event", event)
        .header("x-gitlab-token", token);
    for (name, value) in extra {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Collect a response body
pub async fn body_bytes(response: Response<Body>) -> bytes::Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

/// Collect a response body as JSON
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
