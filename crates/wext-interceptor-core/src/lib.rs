//! # Wext Interceptor Core
//!
//! Validation and normalization pipeline for Git provider webhooks that feed a
//! trigger-execution system.
//!
//! For every inbound delivery the pipeline:
//!
//! 1. authenticates the request against the trigger's shared secret
//!    (HMAC signature for GitHub, plain token for GitLab),
//! 2. decodes the provider's event envelope into a typed event,
//! 3. checks the event against the filter the caller declared in the
//!    `Wext-*` request headers (repository, event type, action),
//! 4. injects the branch name into the payload under
//!    `webhooks-tekton-git-branch`.
//!
//! ## Architecture
//!
//! - Every stage is a plain synchronous function over owned request data; the
//!   crate performs no network I/O and keeps no state between calls.
//! - Provider specifics live behind the [`webhook::WebhookProvider`] trait.
//! - HTTP hosting, secret storage and downstream delivery belong to the caller.
//!
//! ## Usage
//!
//! ```rust
//! use bytes::Bytes;
//! use http::{HeaderMap, HeaderValue};
//! use wext_interceptor_core::{Interceptor, RawRequest, WebhookSecret};
//!
//! let mut headers = HeaderMap::new();
//! headers.insert("x-gitlab-event", HeaderValue::from_static("Push Hook"));
//! headers.insert("x-gitlab-token", HeaderValue::from_static("s3cr3t"));
//! headers.insert("wext-repository-url", HeaderValue::from_static("gitlab.com/org/repo"));
//!
//! let body = Bytes::from_static(
//!     br#"{"ref":"refs/heads/main","repository":{"git_http_url":"https://gitlab.com/org/repo.git"}}"#,
//! );
//!
//! let interceptor = Interceptor::new();
//! let payload = interceptor
//!     .intercept(RawRequest::post(headers, body), "my-trigger", &WebhookSecret::new("s3cr3t"))
//!     .expect("delivery passes the declared filter");
//! assert!(payload.ends_with(br#","webhooks-tekton-git-branch":"main"}"#));
//! ```

use serde::{Deserialize, Serialize};

// ============================================================================
// Error Types
// ============================================================================

/// High-level error categorization for response mapping and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Authentication failures; the sender could not prove it holds the secret
    Security,
    /// Malformed or unrecognized input that will never succeed as sent
    Permanent,
    /// The delivery is valid but the trigger's filter does not apply to it
    FilterMismatch,
    /// Inconsistencies inside the interceptor itself
    Internal,
}

// ============================================================================
// Module declarations
// ============================================================================

/// Repository URL canonicalization
pub mod canonical;

/// Provider identification and REST API endpoint resolution
pub mod provider;

/// Trigger secrets handed in by the host
pub mod secret;

/// Declared filters and the filter matching algorithm
pub mod filter;

/// Raw requests, decoded events and provider implementations
pub mod webhook;

/// Per-request pipeline orchestration
pub mod dispatcher;

// Re-export key types for convenience
pub use canonical::canonicalize;
pub use dispatcher::{Interceptor, PipelineStage};
pub use filter::{
    match_filter, DeclaredFilter, EventFacts, FilterHeaders, MismatchReason, ValidationOutcome,
};
pub use provider::{resolve_provider, Provider, ProviderEndpoint, ProviderError};
pub use secret::{SecretError, WebhookSecret};
pub use webhook::{
    augment::{augment, BRANCH_FIELD},
    DecodeError, DecodedEvent, EventKind, GitHubProvider, GitLabProvider, InterceptorError,
    OtherEvent, RawRequest, WebhookEvent, WebhookProvider,
};
