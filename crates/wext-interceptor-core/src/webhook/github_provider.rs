//! GitHub webhook provider.
//!
//! [`GitHubProvider`] authenticates deliveries by their HMAC signature and
//! decodes them using the `X-Github-Event` header:
//!
//! - `X-Hub-Signature-256: sha256=<hex>` is checked when present, otherwise the
//!   legacy `X-Hub-Signature: sha1=<hex>`.
//! - Bodies sent as `application/x-www-form-urlencoded` carry the JSON in their
//!   `payload` field. The signature always covers the raw body as received.
//! - `push` and `pull_request` decode into typed events; every other known
//!   GitHub event decodes into [`OtherEvent`].

use super::{
    header_value, parse_object, string_at, DecodeError, DecodedEvent, EventKind,
    InterceptorError, OtherEvent, RawRequest, WebhookEvent, WebhookProvider,
};
use crate::provider::Provider;
use crate::secret::WebhookSecret;
use bytes::Bytes;
use hmac::{Hmac, Mac};
use http::HeaderMap;
use serde::Deserialize;
use sha1::Sha1;
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;
type HmacSha1 = Hmac<Sha1>;

pub const SIGNATURE_256_HEADER: &str = "X-Hub-Signature-256";
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature";
pub const DELIVERY_HEADER: &str = "X-Github-Delivery";

const CONTENT_TYPE_JSON: &str = "application/json";
const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
const FORM_PAYLOAD_FIELD: &str = "payload";

/// Event names GitHub documents for the `X-Github-Event` header.
pub const KNOWN_EVENTS: &[&str] = &[
    "check_run",
    "check_suite",
    "commit_comment",
    "content_reference",
    "create",
    "delete",
    "deploy_key",
    "deployment",
    "deployment_status",
    "fork",
    "github_app_authorization",
    "gollum",
    "installation",
    "installation_repositories",
    "issue_comment",
    "issues",
    "label",
    "marketplace_purchase",
    "member",
    "membership",
    "meta",
    "milestone",
    "organization",
    "org_block",
    "package",
    "page_build",
    "ping",
    "project",
    "project_card",
    "project_column",
    "public",
    "pull_request",
    "pull_request_review",
    "pull_request_review_comment",
    "push",
    "release",
    "repository",
    "repository_dispatch",
    "repository_vulnerability_alert",
    "security_advisory",
    "star",
    "status",
    "team",
    "team_add",
    "user",
    "watch",
    "workflow_dispatch",
    "workflow_run",
];

// ============================================================================
// Typed events
// ============================================================================

/// Decoded GitHub event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitHubEvent {
    Push(PushEvent),
    PullRequest(PullRequestEvent),
    Other(OtherEvent),
}

impl GitHubEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Push(_) => EventKind::Push,
            Self::PullRequest(_) => EventKind::PullRequest,
            Self::Other(_) => EventKind::Other,
        }
    }

    pub fn clone_url(&self) -> &str {
        match self {
            Self::Push(event) => &event.clone_url,
            Self::PullRequest(event) => &event.clone_url,
            Self::Other(event) => &event.clone_url,
        }
    }

    pub fn action(&self) -> &str {
        match self {
            Self::Push(_) => "",
            Self::PullRequest(event) => &event.action,
            Self::Other(event) => &event.action,
        }
    }

    pub fn ref_like(&self) -> &str {
        match self {
            Self::Push(event) => &event.git_ref,
            Self::PullRequest(event) => &event.head_ref,
            Self::Other(_) => "",
        }
    }
}

/// `push` event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEvent {
    /// Full ref that was pushed, e.g. `refs/heads/main`
    pub git_ref: String,
    /// `repository.clone_url`; empty when the payload has none
    pub clone_url: String,
}

/// `pull_request` event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestEvent {
    pub action: String,
    pub number: Option<u64>,
    /// `pull_request.head.ref`, the branch the changes come from
    pub head_ref: String,
    pub base_ref: Option<String>,
    pub clone_url: String,
}

// Wire shapes. Required fields are optional here so their absence surfaces as
// `DecodeError::MissingField` rather than a generic serde message.

#[derive(Debug, Deserialize)]
struct PushPayload {
    #[serde(rename = "ref")]
    git_ref: Option<String>,
    #[serde(default)]
    repository: Option<RepositoryPayload>,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    action: Option<String>,
    #[serde(default)]
    number: Option<u64>,
    pull_request: Option<PullRequestBody>,
    #[serde(default)]
    repository: Option<RepositoryPayload>,
}

#[derive(Debug, Deserialize)]
struct PullRequestBody {
    head: Option<PullRequestBranch>,
    #[serde(default)]
    base: Option<PullRequestBranch>,
}

#[derive(Debug, Deserialize)]
struct PullRequestBranch {
    #[serde(rename = "ref")]
    git_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepositoryPayload {
    #[serde(default)]
    clone_url: Option<String>,
}

fn clone_url_of(repository: Option<RepositoryPayload>) -> String {
    repository.and_then(|r| r.clone_url).unwrap_or_default()
}

// ============================================================================
// GitHubProvider
// ============================================================================

/// Webhook provider for GitHub and GitHub Enterprise.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitHubProvider;

impl GitHubProvider {
    pub fn new() -> Self {
        Self
    }

    fn decode_push(&self, payload: &[u8]) -> Result<GitHubEvent, DecodeError> {
        let wire: PushPayload =
            serde_json::from_slice(payload).map_err(|e| DecodeError::malformed("push", e))?;
        let git_ref = wire
            .git_ref
            .ok_or_else(|| DecodeError::missing_field("push", "ref"))?;

        Ok(GitHubEvent::Push(PushEvent {
            git_ref,
            clone_url: clone_url_of(wire.repository),
        }))
    }

    fn decode_pull_request(&self, payload: &[u8]) -> Result<GitHubEvent, DecodeError> {
        const EVENT: &str = "pull_request";

        let wire: PullRequestPayload =
            serde_json::from_slice(payload).map_err(|e| DecodeError::malformed(EVENT, e))?;
        let action = wire
            .action
            .ok_or_else(|| DecodeError::missing_field(EVENT, "action"))?;
        let pull_request = wire
            .pull_request
            .ok_or_else(|| DecodeError::missing_field(EVENT, "pull_request"))?;
        let head_ref = pull_request
            .head
            .and_then(|head| head.git_ref)
            .ok_or_else(|| DecodeError::missing_field(EVENT, "pull_request.head.ref"))?;

        Ok(GitHubEvent::PullRequest(PullRequestEvent {
            action,
            number: wire.number,
            head_ref,
            base_ref: pull_request.base.and_then(|base| base.git_ref),
            clone_url: clone_url_of(wire.repository),
        }))
    }
}

impl WebhookProvider for GitHubProvider {
    fn provider(&self) -> Provider {
        Provider::GitHub
    }

    fn verify(
        &self,
        request: &mut RawRequest,
        secret: &WebhookSecret,
    ) -> Result<Bytes, InterceptorError> {
        let body = request.take_body()?;
        let signature = Signature::from_headers(request.headers())?;
        signature.verify(secret.secret_token(), &body)?;

        debug!(
            algorithm = signature.algorithm.as_str(),
            delivery_id = request.header(DELIVERY_HEADER).unwrap_or_default(),
            "GitHub signature verified"
        );

        Ok(extract_payload(request.headers(), body)?)
    }

    fn decode(&self, headers: &HeaderMap, payload: &[u8]) -> Result<DecodedEvent, DecodeError> {
        let event_type = header_value(headers, Provider::GITHUB_EVENT_HEADER).ok_or_else(|| {
            DecodeError::MissingHeader {
                header: Provider::GITHUB_EVENT_HEADER.to_string(),
            }
        })?;

        if !KNOWN_EVENTS.contains(&event_type) {
            return Err(DecodeError::UnknownEventType {
                provider: Provider::GitHub,
                event_type: event_type.to_string(),
            });
        }

        let object = parse_object(event_type, payload)?;
        let event = match event_type {
            "push" => self.decode_push(payload)?,
            "pull_request" => self.decode_pull_request(payload)?,
            _ => GitHubEvent::Other(OtherEvent {
                clone_url: string_at(&object, &["repository", "clone_url"])
                    .unwrap_or_default()
                    .to_string(),
                action: string_at(&object, &["action"]).unwrap_or_default().to_string(),
            }),
        };

        let delivery_id = header_value(headers, DELIVERY_HEADER).map(String::from);
        Ok(DecodedEvent::new(
            event_type,
            delivery_id,
            WebhookEvent::GitHub(event),
            Bytes::copy_from_slice(payload),
        ))
    }
}

// ============================================================================
// Signatures
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignatureAlgorithm {
    Sha256,
    Sha1,
}

impl SignatureAlgorithm {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha1 => "sha1",
        }
    }
}

/// A parsed `<algorithm>=<hex digest>` signature header.
#[derive(Debug)]
struct Signature {
    algorithm: SignatureAlgorithm,
    digest: Vec<u8>,
}

impl Signature {
    fn from_headers(headers: &HeaderMap) -> Result<Self, InterceptorError> {
        let value = header_value(headers, SIGNATURE_256_HEADER)
            .or_else(|| header_value(headers, SIGNATURE_HEADER))
            .ok_or_else(|| auth_failure("missing signature header"))?;

        let (prefix, hex_digest) = value
            .split_once('=')
            .ok_or_else(|| auth_failure("signature header has no algorithm prefix"))?;

        let algorithm = match prefix {
            "sha256" => SignatureAlgorithm::Sha256,
            "sha1" => SignatureAlgorithm::Sha1,
            other => {
                return Err(auth_failure(&format!(
                    "unsupported signature algorithm '{}'",
                    other
                )))
            }
        };

        let digest = hex::decode(hex_digest)
            .map_err(|_| auth_failure("invalid hex encoding in signature"))?;

        Ok(Self { algorithm, digest })
    }

    /// Recompute the HMAC over `body` and compare it in constant time.
    fn verify(&self, key: &[u8], body: &[u8]) -> Result<(), InterceptorError> {
        let verified = match self.algorithm {
            SignatureAlgorithm::Sha256 => {
                let mut mac = HmacSha256::new_from_slice(key)
                    .map_err(|_| auth_failure("failed to initialize HMAC-SHA256"))?;
                mac.update(body);
                mac.verify_slice(&self.digest).is_ok()
            }
            SignatureAlgorithm::Sha1 => {
                let mut mac = HmacSha1::new_from_slice(key)
                    .map_err(|_| auth_failure("failed to initialize HMAC-SHA1"))?;
                mac.update(body);
                mac.verify_slice(&self.digest).is_ok()
            }
        };

        if verified {
            Ok(())
        } else {
            Err(auth_failure(&format!(
                "HMAC-{} signature mismatch",
                self.algorithm.as_str().to_uppercase()
            )))
        }
    }
}

fn auth_failure(message: &str) -> InterceptorError {
    InterceptorError::AuthenticationFailed {
        provider: Provider::GitHub,
        message: message.to_string(),
    }
}

// ============================================================================
// Payload extraction
// ============================================================================

/// Release the JSON document carried by an authenticated body.
fn extract_payload(headers: &HeaderMap, body: Bytes) -> Result<Bytes, DecodeError> {
    let media_type = header_value(headers, http::header::CONTENT_TYPE.as_str())
        .map(|value| {
            value
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
        .unwrap_or_default();

    match media_type.as_str() {
        "" | CONTENT_TYPE_JSON => Ok(body),
        CONTENT_TYPE_FORM => url::form_urlencoded::parse(&body)
            .find(|(key, _)| key == FORM_PAYLOAD_FIELD)
            .map(|(_, value)| Bytes::from(value.into_owned()))
            .ok_or_else(|| DecodeError::missing_field("form", FORM_PAYLOAD_FIELD)),
        _ => Err(DecodeError::UnsupportedContentType {
            content_type: media_type,
        }),
    }
}

#[cfg(test)]
#[path = "github_provider_tests.rs"]
mod tests;
