//! GitLab webhook provider.
//!
//! GitLab authenticates a delivery by echoing the trigger's shared secret in
//! the `X-Gitlab-Token` header; there is no body signature. The event type
//! comes from `X-Gitlab-Event` (`Push Hook`, `Merge Request Hook`, ...).

use super::{
    constant_time_eq, header_value, parse_object, string_at, DecodeError, DecodedEvent,
    EventKind, InterceptorError, OtherEvent, RawRequest, WebhookEvent, WebhookProvider,
};
use crate::provider::Provider;
use crate::secret::WebhookSecret;
use bytes::Bytes;
use http::{HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

pub const TOKEN_HEADER: &str = "X-Gitlab-Token";

pub const PUSH_HOOK: &str = "Push Hook";
pub const MERGE_REQUEST_HOOK: &str = "Merge Request Hook";

/// Hook names GitLab sends in the `X-Gitlab-Event` header.
pub const KNOWN_EVENTS: &[&str] = &[
    PUSH_HOOK,
    "Tag Push Hook",
    "Issue Hook",
    "Confidential Issue Hook",
    "Note Hook",
    "Confidential Note Hook",
    MERGE_REQUEST_HOOK,
    "Wiki Page Hook",
    "Pipeline Hook",
    "Job Hook",
    "Build Hook",
    "Deployment Hook",
    "Release Hook",
    "System Hook",
];

// ============================================================================
// Typed events
// ============================================================================

/// Decoded GitLab event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitLabEvent {
    Push(PushEvent),
    MergeRequest(MergeRequestEvent),
    Other(OtherEvent),
}

impl GitLabEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Push(_) => EventKind::Push,
            Self::MergeRequest(_) => EventKind::PullRequest,
            Self::Other(_) => EventKind::Other,
        }
    }

    pub fn clone_url(&self) -> &str {
        match self {
            Self::Push(event) => &event.clone_url,
            Self::MergeRequest(event) => &event.clone_url,
            Self::Other(event) => &event.clone_url,
        }
    }

    pub fn action(&self) -> &str {
        match self {
            Self::Push(_) => "",
            Self::MergeRequest(event) => &event.state,
            Self::Other(event) => &event.action,
        }
    }

    pub fn ref_like(&self) -> &str {
        match self {
            Self::Push(event) => &event.git_ref,
            Self::MergeRequest(event) => &event.source_branch,
            Self::Other(_) => "",
        }
    }
}

/// `Push Hook` event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEvent {
    pub git_ref: String,
    pub checkout_sha: Option<String>,
    /// `repository.git_http_url`
    pub clone_url: String,
}

/// `Merge Request Hook` event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequestEvent {
    pub id: Option<u64>,
    /// `object_attributes.state` (`opened`, `merged`, `closed`, ...)
    pub state: String,
    pub source_branch: String,
    pub target_branch: Option<String>,
    /// `object_attributes.source.git_http_url`
    pub clone_url: String,
}

#[derive(Debug, Deserialize)]
struct PushPayload {
    #[serde(rename = "ref")]
    git_ref: Option<String>,
    #[serde(default)]
    checkout_sha: Option<String>,
    #[serde(default)]
    repository: Option<RepositoryPayload>,
}

#[derive(Debug, Deserialize)]
struct MergeRequestPayload {
    object_attributes: Option<MergeRequestAttributes>,
}

#[derive(Debug, Deserialize)]
struct MergeRequestAttributes {
    #[serde(default)]
    id: Option<u64>,
    state: Option<String>,
    source_branch: Option<String>,
    #[serde(default)]
    target_branch: Option<String>,
    #[serde(default)]
    source: Option<RepositoryPayload>,
}

#[derive(Debug, Deserialize)]
struct RepositoryPayload {
    #[serde(default)]
    git_http_url: Option<String>,
}

fn clone_url_of(repository: Option<RepositoryPayload>) -> String {
    repository.and_then(|r| r.git_http_url).unwrap_or_default()
}

// ============================================================================
// GitLabProvider
// ============================================================================

/// Webhook provider for gitlab.com and self-managed GitLab.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitLabProvider;

impl GitLabProvider {
    pub fn new() -> Self {
        Self
    }

    fn decode_push(&self, payload: &[u8]) -> Result<PushEvent, DecodeError> {
        let wire: PushPayload =
            serde_json::from_slice(payload).map_err(|e| DecodeError::malformed(PUSH_HOOK, e))?;
        let git_ref = wire
            .git_ref
            .ok_or_else(|| DecodeError::missing_field(PUSH_HOOK, "ref"))?;

        Ok(PushEvent {
            git_ref,
            checkout_sha: wire.checkout_sha,
            clone_url: clone_url_of(wire.repository),
        })
    }

    fn decode_merge_request(&self, payload: &[u8]) -> Result<MergeRequestEvent, DecodeError> {
        const EVENT: &str = MERGE_REQUEST_HOOK;

        let wire: MergeRequestPayload =
            serde_json::from_slice(payload).map_err(|e| DecodeError::malformed(EVENT, e))?;
        let attributes = wire
            .object_attributes
            .ok_or_else(|| DecodeError::missing_field(EVENT, "object_attributes"))?;
        let state = attributes
            .state
            .ok_or_else(|| DecodeError::missing_field(EVENT, "object_attributes.state"))?;
        let source_branch = attributes.source_branch.ok_or_else(|| {
            DecodeError::missing_field(EVENT, "object_attributes.source_branch")
        })?;

        Ok(MergeRequestEvent {
            id: attributes.id,
            state,
            source_branch,
            target_branch: attributes.target_branch,
            clone_url: clone_url_of(attributes.source),
        })
    }
}

impl WebhookProvider for GitLabProvider {
    fn provider(&self) -> Provider {
        Provider::GitLab
    }

    fn verify(
        &self,
        request: &mut RawRequest,
        secret: &WebhookSecret,
    ) -> Result<Bytes, InterceptorError> {
        let body = request.take_body()?;

        // Raw bytes: tokens outside visible ASCII still compare exactly.
        let token = request
            .headers()
            .get(TOKEN_HEADER)
            .map(HeaderValue::as_bytes)
            .ok_or_else(|| auth_failure("missing token header"))?;
        if !constant_time_eq(token, secret.secret_token()) {
            return Err(auth_failure("token mismatch"));
        }

        debug!("GitLab token verified");
        Ok(body)
    }

    fn decode(&self, headers: &HeaderMap, payload: &[u8]) -> Result<DecodedEvent, DecodeError> {
        let event_type = header_value(headers, Provider::GITLAB_EVENT_HEADER).ok_or_else(|| {
            DecodeError::MissingHeader {
                header: Provider::GITLAB_EVENT_HEADER.to_string(),
            }
        })?;

        if !KNOWN_EVENTS.contains(&event_type) {
            return Err(DecodeError::UnknownEventType {
                provider: Provider::GitLab,
                event_type: event_type.to_string(),
            });
        }

        let object = parse_object(event_type, payload)?;
        let (event, delivery_id) = match event_type {
            PUSH_HOOK => {
                let push = self.decode_push(payload)?;
                let delivery_id = push.checkout_sha.clone();
                (GitLabEvent::Push(push), delivery_id)
            }
            MERGE_REQUEST_HOOK => {
                let merge_request = self.decode_merge_request(payload)?;
                let delivery_id = merge_request.id.map(|id| id.to_string());
                (GitLabEvent::MergeRequest(merge_request), delivery_id)
            }
            _ => (GitLabEvent::Other(other_event(&object)), None),
        };

        Ok(DecodedEvent::new(
            event_type,
            delivery_id,
            WebhookEvent::GitLab(event),
            Bytes::copy_from_slice(payload),
        ))
    }
}

fn other_event(object: &Map<String, Value>) -> OtherEvent {
    let clone_url = string_at(object, &["repository", "git_http_url"])
        .or_else(|| string_at(object, &["project", "git_http_url"]))
        .unwrap_or_default();

    OtherEvent {
        clone_url: clone_url.to_string(),
        action: string_at(object, &["object_attributes", "action"])
            .unwrap_or_default()
            .to_string(),
    }
}

fn auth_failure(message: &str) -> InterceptorError {
    InterceptorError::AuthenticationFailed {
        provider: Provider::GitLab,
        message: message.to_string(),
    }
}

#[cfg(test)]
#[path = "gitlab_provider_tests.rs"]
mod tests;
