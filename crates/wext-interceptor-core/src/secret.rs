//! Trigger secrets.
//!
//! The host looks up the secret bound to a trigger (in a cluster key-value
//! store, a config file, an environment variable) and hands it to the
//! interceptor read-only. The interceptor only ever reads `secretToken`;
//! `accessToken` is carried for hosts that call the provider API.

use std::collections::HashMap;
use std::fmt;
use zeroize::Zeroizing;

/// Data key holding the webhook signing key / shared token.
pub const SECRET_TOKEN_KEY: &str = "secretToken";

/// Data key holding the provider API access token.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Secret material for a single trigger.
///
/// Values are zeroed on drop and never included in `Debug` output.
#[derive(Clone)]
pub struct WebhookSecret {
    secret_token: Zeroizing<Vec<u8>>,
    access_token: Option<Zeroizing<Vec<u8>>>,
}

impl WebhookSecret {
    /// Create a secret holding only the webhook secret token.
    pub fn new(secret_token: impl Into<Vec<u8>>) -> Self {
        Self {
            secret_token: Zeroizing::new(secret_token.into()),
            access_token: None,
        }
    }

    /// Attach a provider API access token.
    pub fn with_access_token(mut self, access_token: impl Into<Vec<u8>>) -> Self {
        self.access_token = Some(Zeroizing::new(access_token.into()));
        self
    }

    /// Build a secret from a key-value data map such as a Kubernetes
    /// `Secret.data` section.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::MissingKey`] when `secretToken` is absent and
    /// [`SecretError::EmptyValue`] when it is present but empty.
    pub fn from_data(data: &HashMap<String, Vec<u8>>) -> Result<Self, SecretError> {
        let secret_token = data
            .get(SECRET_TOKEN_KEY)
            .ok_or_else(|| SecretError::MissingKey {
                key: SECRET_TOKEN_KEY.to_string(),
            })?;

        if secret_token.is_empty() {
            return Err(SecretError::EmptyValue {
                key: SECRET_TOKEN_KEY.to_string(),
            });
        }

        let mut secret = Self::new(secret_token.clone());
        if let Some(access_token) = data.get(ACCESS_TOKEN_KEY) {
            secret = secret.with_access_token(access_token.clone());
        }

        Ok(secret)
    }

    /// Webhook signing key (GitHub) or shared token (GitLab).
    pub fn secret_token(&self) -> &[u8] {
        &self.secret_token
    }

    /// Provider API access token, if one was supplied.
    pub fn access_token(&self) -> Option<&[u8]> {
        self.access_token.as_deref().map(|token| token.as_slice())
    }
}

// Security: Don't expose secrets in debug output
impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookSecret")
            .field("secret_token", &"<REDACTED>")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

/// Errors raised while reading trigger secret data
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SecretError {
    #[error("Secret data has no '{key}' entry")]
    MissingKey { key: String },

    #[error("Secret data entry '{key}' is empty")]
    EmptyValue { key: String },
}

#[cfg(test)]
#[path = "secret_tests.rs"]
mod tests;
