//! Git provider identification.
//!
//! A delivery's provider is decided by which event-type header it carries
//! ([`Provider::detect`]). Separately, [`resolve_provider`] maps a repository
//! URL to the provider hosting it and the base URL of that provider's REST API,
//! which hosts use to pin a trigger to one provider.

use crate::webhook::header_value;
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Public GitHub host; every other GitHub host is treated as GitHub Enterprise.
const PUBLIC_GITHUB_HOST: &str = "github.com";
const PUBLIC_GITHUB_API_URL: &str = "https://api.github.com/";

/// Source-control hosting provider family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// GitHub and GitHub Enterprise (HMAC-signed deliveries)
    GitHub,
    /// GitLab (shared-token deliveries)
    GitLab,
}

impl Provider {
    /// Header naming the event type of a delivery from this provider.
    pub const GITHUB_EVENT_HEADER: &'static str = "X-Github-Event";
    pub const GITLAB_EVENT_HEADER: &'static str = "X-Gitlab-Event";

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::GitLab => "gitlab",
        }
    }

    /// Name of the header carrying the event type for this provider.
    pub fn event_header(&self) -> &'static str {
        match self {
            Self::GitHub => Self::GITHUB_EVENT_HEADER,
            Self::GitLab => Self::GITLAB_EVENT_HEADER,
        }
    }

    /// Select the provider from the headers present on a delivery.
    ///
    /// GitHub wins when both event headers are present.
    pub fn detect(headers: &HeaderMap) -> Option<Self> {
        [Self::GitHub, Self::GitLab]
            .into_iter()
            .find(|provider| header_value(headers, provider.event_header()).is_some())
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "github" => Ok(Self::GitHub),
            "gitlab" => Ok(Self::GitLab),
            _ => Err(ProviderError::UnknownProviderName {
                name: s.to_string(),
            }),
        }
    }
}

/// Provider hosting a repository plus the base URL of its REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoint {
    pub provider: Provider,
    pub api_url: String,
}

/// Errors raised while identifying a provider
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("No repository URL provided")]
    MissingUrl,

    #[error("Invalid repository URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Git provider for repository URL {url} not recognized")]
    UnrecognizedProvider { url: String },

    #[error("Unknown provider name '{name}', expected github or gitlab")]
    UnknownProviderName { name: String },
}

/// Determine the provider and REST API base URL for a repository URL.
///
/// - `github.com` (any case) maps to the public GitHub API.
/// - Any other host containing `github` is treated as GitHub Enterprise,
///   served under `/api/v3/`.
/// - Any host containing `gitlab` maps to the GitLab API under `/api/v4`.
///
/// # Errors
///
/// Returns [`ProviderError`] when the URL is empty, cannot be parsed as an
/// absolute URL, or names a host that matches neither provider.
///
/// # Examples
///
/// ```rust
/// use wext_interceptor_core::{resolve_provider, Provider};
///
/// let endpoint = resolve_provider("https://gitlab.example.com/group/project").unwrap();
/// assert_eq!(endpoint.provider, Provider::GitLab);
/// assert_eq!(endpoint.api_url, "https://gitlab.example.com/api/v4");
/// ```
pub fn resolve_provider(repository_url: &str) -> Result<ProviderEndpoint, ProviderError> {
    if repository_url.is_empty() {
        return Err(ProviderError::MissingUrl);
    }

    let url = Url::parse(repository_url).map_err(|e| ProviderError::InvalidUrl {
        url: repository_url.to_string(),
        message: e.to_string(),
    })?;

    let host = url.host_str().ok_or_else(|| ProviderError::InvalidUrl {
        url: repository_url.to_string(),
        message: "URL has no host".to_string(),
    })?;
    let authority = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    if host.eq_ignore_ascii_case(PUBLIC_GITHUB_HOST) {
        return Ok(ProviderEndpoint {
            provider: Provider::GitHub,
            api_url: PUBLIC_GITHUB_API_URL.to_string(),
        });
    }

    // Url lower-cases hosts during parsing, so substring checks are case-blind.
    if host.contains("github") {
        return Ok(ProviderEndpoint {
            provider: Provider::GitHub,
            api_url: format!("{}://{}/api/v3/", url.scheme(), authority),
        });
    }

    if host.contains("gitlab") {
        return Ok(ProviderEndpoint {
            provider: Provider::GitLab,
            api_url: format!("{}://{}/api/v4", url.scheme(), authority),
        });
    }

    Err(ProviderError::UnrecognizedProvider {
        url: repository_url.to_string(),
    })
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
