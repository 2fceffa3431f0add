//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use wext_interceptor_core::{ErrorCategory, InterceptorError};

/// Webhook handler errors with HTTP status code mapping
///
/// - `401 Unauthorized`: the delivery failed secret verification
/// - `400 Bad Request`: the delivery cannot be decoded as sent
/// - `404 Not Found`: no trigger is configured under the requested name
/// - `417 Expectation Failed`: the delivery is valid but the trigger's declared
///   filter does not apply to it
/// - `500 Internal Server Error`: the interceptor could not produce a payload
///
/// Authentication and internal failures return a fixed message; the details
/// are only logged server-side.
#[derive(Debug, thiserror::Error)]
pub enum WebhookHandlerError {
    #[error("Trigger not found: {trigger}")]
    TriggerNotFound { trigger: String },

    #[error(transparent)]
    Interception(#[from] InterceptorError),
}

impl WebhookHandlerError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::TriggerNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Interception(e) => match e.error_category() {
                ErrorCategory::Security => StatusCode::UNAUTHORIZED,
                ErrorCategory::Permanent => StatusCode::BAD_REQUEST,
                ErrorCategory::FilterMismatch => StatusCode::EXPECTATION_FAILED,
                ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Message safe to return to the sender
    fn public_message(&self) -> String {
        match self {
            Self::Interception(e) => match e.error_category() {
                ErrorCategory::Security => "Webhook authentication failed".to_string(),
                ErrorCategory::Internal => {
                    "Internal server error occurred. Please try again later.".to_string()
                }
                ErrorCategory::Permanent | ErrorCategory::FilterMismatch => e.to_string(),
            },
            Self::TriggerNotFound { .. } => self.to_string(),
        }
    }
}

impl IntoResponse for WebhookHandlerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = serde_json::json!({
            "error": self.public_message(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] crate::config::ConfigError),
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
