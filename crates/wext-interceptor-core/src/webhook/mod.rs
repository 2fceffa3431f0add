//! # Webhook Module
//!
//! Raw request handling, typed events and the provider implementations that
//! authenticate and decode them.
//!
//! # Core Components
//!
//! - [`RawRequest`] - inbound headers plus a body that can be taken once
//! - [`WebhookProvider`] - provider seam: authenticate, then decode
//! - [`GitHubProvider`] / [`GitLabProvider`] - the two implementations
//! - [`DecodedEvent`] - typed event plus the facts the filter needs
//! - [`augment`](augment::augment) - branch injection into the payload

use crate::filter::{match_filter, DeclaredFilter, EventFacts, MismatchReason, ValidationOutcome};
use crate::provider::Provider;
use crate::secret::WebhookSecret;
use crate::ErrorCategory;
use bytes::Bytes;
use http::{HeaderMap, Method};
use serde_json::{Map, Value};
use std::fmt;

pub mod augment;
pub mod github_provider;
pub mod gitlab_provider;

pub use github_provider::{GitHubEvent, GitHubProvider};
pub use gitlab_provider::{GitLabEvent, GitLabProvider};

// ============================================================================
// Core Types
// ============================================================================

/// Inbound webhook HTTP request.
///
/// The body is single-use: [`RawRequest::take_body`] hands it out once and
/// fails on every later call.
#[derive(Debug)]
pub struct RawRequest {
    method: Method,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl RawRequest {
    /// Create new raw request
    pub fn new(method: Method, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            headers,
            body: Some(body),
        }
    }

    /// Create a `POST` request, the method every provider delivers with
    pub fn post(headers: HeaderMap, body: Bytes) -> Self {
        Self::new(Method::POST, headers, body)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }

    /// Take the body out of the request.
    ///
    /// # Errors
    ///
    /// Returns [`InterceptorError::BodyUnavailable`] if the body was already taken.
    pub fn take_body(&mut self) -> Result<Bytes, InterceptorError> {
        self.body.take().ok_or(InterceptorError::BodyUnavailable)
    }

    /// Whether the body has already been taken
    pub fn is_body_consumed(&self) -> bool {
        self.body.is_none()
    }
}

/// First value of a header as a string slice.
///
/// Header names are matched case-insensitively; values that are not visible
/// ASCII are treated as absent.
pub(crate) fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Shape of a decoded event, independent of provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Branch push
    Push,
    /// GitHub pull request or GitLab merge request
    PullRequest,
    /// Any other recognized event
    Other,
}

impl EventKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::PullRequest => "pull_request",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recognized event the augmenter has no branch rule for.
///
/// Carries just enough to run the filter against it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtherEvent {
    pub clone_url: String,
    pub action: String,
}

/// Typed event, tagged by provider family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    GitHub(GitHubEvent),
    GitLab(GitLabEvent),
}

impl WebhookEvent {
    pub fn provider(&self) -> Provider {
        match self {
            Self::GitHub(_) => Provider::GitHub,
            Self::GitLab(_) => Provider::GitLab,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::GitHub(event) => event.kind(),
            Self::GitLab(event) => event.kind(),
        }
    }

    pub fn clone_url(&self) -> &str {
        match self {
            Self::GitHub(event) => event.clone_url(),
            Self::GitLab(event) => event.clone_url(),
        }
    }

    pub fn action(&self) -> &str {
        match self {
            Self::GitHub(event) => event.action(),
            Self::GitLab(event) => event.action(),
        }
    }

    pub fn ref_like(&self) -> &str {
        match self {
            Self::GitHub(event) => event.ref_like(),
            Self::GitLab(event) => event.ref_like(),
        }
    }
}

/// A verified delivery decoded into a typed event.
///
/// Keeps the original payload text so that it can be re-emitted unchanged
/// apart from the injected branch field.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    event_type: String,
    delivery_id: Option<String>,
    event: WebhookEvent,
    payload: Bytes,
}

impl DecodedEvent {
    /// Create new decoded event
    pub fn new(
        event_type: impl Into<String>,
        delivery_id: Option<String>,
        event: WebhookEvent,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            delivery_id,
            event,
            payload: payload.into(),
        }
    }

    pub fn provider(&self) -> Provider {
        self.event.provider()
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }

    /// Raw value of the provider's event-type header
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Provider delivery identifier, used for log correlation only
    pub fn delivery_id(&self) -> Option<&str> {
        self.delivery_id.as_deref()
    }

    pub fn event(&self) -> &WebhookEvent {
        &self.event
    }

    pub fn clone_url(&self) -> &str {
        self.event.clone_url()
    }

    /// Action or state; always empty for push-like events
    pub fn action(&self) -> &str {
        self.event.action()
    }

    /// Ref the branch name is derived from
    pub fn ref_like(&self) -> &str {
        self.event.ref_like()
    }

    /// Payload JSON object exactly as delivered
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Facts consulted by the filter matcher
    pub fn facts(&self) -> EventFacts<'_> {
        EventFacts {
            clone_url: self.clone_url(),
            event_type: self.event_type(),
            action: self.action(),
        }
    }

    /// Check this event against a declared filter
    pub fn matches(&self, filter: &DeclaredFilter) -> ValidationOutcome {
        match_filter(&self.facts(), filter)
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Top-level error for a single interception.
///
/// Every variant is terminal for the request; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum InterceptorError {
    #[error("{provider} authentication failed: {message}")]
    AuthenticationFailed { provider: Provider, message: String },

    #[error("Event decoding failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] MismatchReason),

    #[error("Unsupported event type received for branch augmentation: {event_type}")]
    UnsupportedEventType { event_type: String },

    #[error("Request body has already been consumed")]
    BodyUnavailable,

    #[error("Payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl InterceptorError {
    /// Whether the failure only means "this trigger does not apply"
    pub fn is_filter_mismatch(&self) -> bool {
        matches!(self, Self::ValidationFailed(_))
    }

    /// Get error category for response mapping and monitoring
    pub fn error_category(&self) -> ErrorCategory {
        match self {
            Self::AuthenticationFailed { .. } => ErrorCategory::Security,
            Self::Decode(_) => ErrorCategory::Permanent,
            Self::ValidationFailed(_) => ErrorCategory::FilterMismatch,
            Self::UnsupportedEventType { .. } => ErrorCategory::Internal,
            Self::BodyUnavailable => ErrorCategory::Internal,
            Self::Serialization(_) => ErrorCategory::Internal,
        }
    }
}

/// Errors while decoding a verified delivery
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error(
        "No provider event header present, expected {} or {}",
        Provider::GITHUB_EVENT_HEADER,
        Provider::GITLAB_EVENT_HEADER
    )]
    UnknownProvider,

    #[error("Missing required header: {header}")]
    MissingHeader { header: String },

    #[error("Unrecognized {provider} event type: {event_type}")]
    UnknownEventType {
        provider: Provider,
        event_type: String,
    },

    #[error("Unsupported content type: {content_type}")]
    UnsupportedContentType { content_type: String },

    #[error("Malformed {event_type} payload: {message}")]
    MalformedPayload { event_type: String, message: String },

    #[error("{event_type} payload is missing required field '{field}'")]
    MissingField { event_type: String, field: String },
}

impl DecodeError {
    pub(crate) fn malformed(event_type: &str, error: impl fmt::Display) -> Self {
        Self::MalformedPayload {
            event_type: event_type.to_string(),
            message: error.to_string(),
        }
    }

    pub(crate) fn missing_field(event_type: &str, field: &str) -> Self {
        Self::MissingField {
            event_type: event_type.to_string(),
            field: field.to_string(),
        }
    }
}

// ============================================================================
// Core Operations (Traits)
// ============================================================================

/// Provider-specific authentication and decoding.
pub trait WebhookProvider: Send + Sync {
    /// Provider handled by this implementation
    fn provider(&self) -> Provider;

    /// Authenticate the request and release its payload.
    ///
    /// Takes the body out of `request`; on failure the body is dropped and
    /// never reaches later stages.
    fn verify(
        &self,
        request: &mut RawRequest,
        secret: &WebhookSecret,
    ) -> Result<Bytes, InterceptorError>;

    /// Decode a verified payload using the provider's event-type header.
    fn decode(&self, headers: &HeaderMap, payload: &[u8]) -> Result<DecodedEvent, DecodeError>;
}

/// Parse a payload into a JSON object, preserving field order.
pub(crate) fn parse_object(event_type: &str, payload: &[u8]) -> Result<Map<String, Value>, DecodeError> {
    match serde_json::from_slice::<Value>(payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(DecodeError::MalformedPayload {
            event_type: event_type.to_string(),
            message: format!("expected a JSON object, got {}", json_type_name(&other)),
        }),
        Err(e) => Err(DecodeError::malformed(event_type, e)),
    }
}

/// String value at a nested object path, if every step exists.
pub(crate) fn string_at<'a>(object: &'a Map<String, Value>, path: &[&str]) -> Option<&'a str> {
    let (last, parents) = path.split_last()?;
    let mut current = object;
    for key in parents {
        current = current.get(*key)?.as_object()?;
    }
    current.get(*last)?.as_str()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Constant-time byte comparison.
///
/// Length is compared first; token length is not treated as secret.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;

    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
