//! Per-request pipeline orchestration.
//!
//! [`Interceptor`] runs one delivery through the fixed stage sequence
//! `Received -> Authenticated -> Decoded -> Filtered -> Augmented`. Any failure
//! ends the pipeline at the stage where it happened; nothing is retried and no
//! other provider is tried.

use crate::filter::{DeclaredFilter, FilterHeaders};
use crate::provider::Provider;
use crate::secret::WebhookSecret;
use crate::webhook::{
    augment::augment, DecodeError, GitHubProvider, GitLabProvider, InterceptorError, RawRequest,
    WebhookProvider,
};
use crate::ErrorCategory;
use bytes::Bytes;
use std::fmt;
use tracing::{error, info, instrument, warn, Span};

/// Last stage a delivery reached in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Received,
    Authenticated,
    Decoded,
    Filtered,
    Augmented,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Authenticated => "authenticated",
            Self::Decoded => "decoded",
            Self::Filtered => "filtered",
            Self::Augmented => "augmented",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stateless webhook interceptor.
///
/// Holds no per-request state, so a single instance can be shared across
/// tasks behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Interceptor {
    github: GitHubProvider,
    gitlab: GitLabProvider,
    filter_headers: FilterHeaders,
}

impl Interceptor {
    /// Create an interceptor reading the default `Wext-*` filter headers
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the declared filter from different header names
    pub fn with_filter_headers(mut self, filter_headers: FilterHeaders) -> Self {
        self.filter_headers = filter_headers;
        self
    }

    pub fn filter_headers(&self) -> &FilterHeaders {
        &self.filter_headers
    }

    /// Run a delivery through the pipeline, detecting its provider from the
    /// event-type headers.
    ///
    /// Returns the augmented payload when the delivery authenticates, decodes,
    /// and satisfies the filter declared in its headers.
    ///
    /// # Errors
    ///
    /// - [`InterceptorError::Decode`] with [`DecodeError::UnknownProvider`] when
    ///   neither `X-Github-Event` nor `X-Gitlab-Event` is present
    /// - any error of [`Interceptor::intercept_as`]
    #[instrument(
        skip_all,
        fields(
            trigger = %trigger_name,
            provider = tracing::field::Empty,
            event_type = tracing::field::Empty,
            delivery_id = tracing::field::Empty,
        )
    )]
    pub fn intercept(
        &self,
        request: RawRequest,
        trigger_name: &str,
        secret: &WebhookSecret,
    ) -> Result<Bytes, InterceptorError> {
        let Some(provider) = Provider::detect(request.headers()) else {
            return Err(failed(
                PipelineStage::Received,
                DecodeError::UnknownProvider.into(),
            ));
        };

        self.run(provider, request, secret)
    }

    /// Run a delivery through the pipeline as a known provider.
    ///
    /// # Errors
    ///
    /// - [`InterceptorError::AuthenticationFailed`] when the secret check fails
    /// - [`InterceptorError::Decode`] for unknown event types or malformed payloads
    /// - [`InterceptorError::ValidationFailed`] when the declared filter does not
    ///   apply; see [`InterceptorError::is_filter_mismatch`]
    /// - [`InterceptorError::UnsupportedEventType`] when a matching event has no
    ///   branch to inject
    #[instrument(
        skip_all,
        fields(
            trigger = %trigger_name,
            provider = tracing::field::Empty,
            event_type = tracing::field::Empty,
            delivery_id = tracing::field::Empty,
        )
    )]
    pub fn intercept_as(
        &self,
        provider: Provider,
        request: RawRequest,
        trigger_name: &str,
        secret: &WebhookSecret,
    ) -> Result<Bytes, InterceptorError> {
        self.run(provider, request, secret)
    }

    fn handler(&self, provider: Provider) -> &dyn WebhookProvider {
        match provider {
            Provider::GitHub => &self.github,
            Provider::GitLab => &self.gitlab,
        }
    }

    fn run(
        &self,
        provider: Provider,
        mut request: RawRequest,
        secret: &WebhookSecret,
    ) -> Result<Bytes, InterceptorError> {
        let span = Span::current();
        span.record("provider", provider.as_str());

        let handler = self.handler(provider);

        // 1. Authenticate
        let payload = handler
            .verify(&mut request, secret)
            .map_err(|e| failed(PipelineStage::Received, e))?;

        // 2. Decode
        let event = handler
            .decode(request.headers(), &payload)
            .map_err(|e| failed(PipelineStage::Authenticated, e.into()))?;
        span.record("event_type", event.event_type());
        if let Some(delivery_id) = event.delivery_id() {
            span.record("delivery_id", delivery_id);
        }

        // 3. Filter
        let filter = DeclaredFilter::from_headers(request.headers(), &self.filter_headers);
        event
            .matches(&filter)
            .into_result()
            .map_err(|reason| failed(PipelineStage::Decoded, reason.into()))?;

        // 4. Augment
        let augmented = augment(&event).map_err(|e| failed(PipelineStage::Filtered, e))?;

        info!(
            stage = %PipelineStage::Augmented,
            kind = %event.kind(),
            action = event.action(),
            size_bytes = augmented.len(),
            "Webhook intercepted"
        );

        Ok(augmented)
    }
}

/// Log a pipeline failure at a level matching its category and pass it on.
fn failed(stage: PipelineStage, error: InterceptorError) -> InterceptorError {
    match error.error_category() {
        ErrorCategory::Security => {
            warn!(stage = %stage, error = %error, "Webhook authentication failed")
        }
        ErrorCategory::Permanent => warn!(stage = %stage, error = %error, "Webhook rejected"),
        ErrorCategory::FilterMismatch => {
            info!(stage = %stage, reason = %error, "Webhook does not match trigger filter")
        }
        ErrorCategory::Internal => error!(stage = %stage, error = %error, "Webhook interception failed"),
    }
    error
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
