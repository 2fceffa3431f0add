//! Service configuration.
//!
//! Configuration is layered with the `config` crate. Later sources override
//! earlier ones:
//!
//! 1. `/etc/wext-interceptor/service.yaml`
//! 2. `./config/service.yaml`
//! 3. the file named by `WEXT_CONFIG_FILE`, or an explicit path (required)
//! 4. environment variables prefixed `WEXT__`, e.g. `WEXT__SERVER__PORT=9090`
//!
//! Every field carries a serde default, so an unconfigured environment yields
//! a service with no triggers that still answers `/health`.

use axum::http::HeaderName;
use serde::{Deserialize, Serialize};
use std::path::Path;
use wext_interceptor_core::{resolve_provider, FilterHeaders, ProviderError, WebhookSecret};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "WEXT";

/// Environment variable naming an extra configuration file.
pub const CONFIG_FILE_ENV: &str = "WEXT_CONFIG_FILE";

const SYSTEM_CONFIG_FILE: &str = "/etc/wext-interceptor/service";
const LOCAL_CONFIG_FILE: &str = "config/service";

// ============================================================================
// ServiceConfig
// ============================================================================

/// Top-level service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,

    /// Names of the request headers the declared filter is read from
    pub filter_headers: FilterHeaders,

    /// Triggers served under `/webhook/{name}`
    pub triggers: Vec<TriggerConfig>,
}

impl ServiceConfig {
    /// Load configuration from the standard layered sources.
    ///
    /// `explicit_path` takes precedence over `WEXT_CONFIG_FILE`. Either one,
    /// when given, must exist.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(
                config::File::with_name(SYSTEM_CONFIG_FILE)
                    .required(false)
                    .format(config::FileFormat::Yaml),
            )
            .add_source(
                config::File::with_name(LOCAL_CONFIG_FILE)
                    .required(false)
                    .format(config::FileFormat::Yaml),
            );

        let env_path = std::env::var(CONFIG_FILE_ENV)
            .ok()
            .filter(|path| !path.is_empty());
        let operator_path = explicit_path
            .map(|path| path.to_string_lossy().into_owned())
            .or(env_path);

        if let Some(path) = operator_path {
            builder = builder.add_source(
                config::File::with_name(&path)
                    .required(true)
                    .format(config::FileFormat::Yaml),
            );
        }

        let config = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Check the configuration for errors that would only surface per request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;

        for (field, name) in [
            ("filter_headers.repository_url", &self.filter_headers.repository_url),
            ("filter_headers.events", &self.filter_headers.events),
            ("filter_headers.actions", &self.filter_headers.actions),
        ] {
            if HeaderName::from_bytes(name.as_bytes()).is_err() {
                return Err(ConfigError::Invalid {
                    message: format!("{field} '{name}' is not a valid HTTP header name"),
                });
            }
        }

        let mut seen = std::collections::HashSet::new();
        for trigger in &self.triggers {
            trigger.validate()?;
            if !seen.insert(trigger.name.as_str()) {
                return Err(ConfigError::TriggerValidation {
                    trigger: trigger.name.clone(),
                    message: "duplicate trigger name".to_string(),
                });
            }
        }

        Ok(())
    }
}

// ============================================================================
// Server and logging
// ============================================================================

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum request body size in bytes
    pub max_body_size: usize,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_size: 25 * 1024 * 1024, // GitHub caps deliveries at 25 MB
            shutdown_timeout_seconds: 30,
        }
    }
}

impl ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_size == 0 {
            return Err(ConfigError::Invalid {
                message: "server.max_body_size must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "wext_interceptor_service=info,wext_interceptor_core=info,tower_http=info"
                .to_string(),
            json: false,
        }
    }
}

// ============================================================================
// Triggers
// ============================================================================

/// One trigger the interceptor fronts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// URL segment and log name; `[A-Za-z0-9_-]+`
    pub name: String,

    /// Where the trigger's webhook secret comes from
    pub secret: SecretSourceConfig,

    /// Repository this trigger serves. When set, the hosting provider is
    /// resolved from it once at startup and provider detection is skipped.
    #[serde(default)]
    pub repository_url: Option<String>,
}

impl TriggerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::TriggerValidation {
                trigger: self.name.clone(),
                message: "trigger name must not be empty".to_string(),
            });
        }

        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::TriggerValidation {
                trigger: self.name.clone(),
                message: "trigger name may only contain ASCII letters, digits, '-' and '_'"
                    .to_string(),
            });
        }

        self.secret.validate(&self.name)?;

        if let Some(url) = &self.repository_url {
            resolve_provider(url).map_err(|e| ConfigError::Provider {
                trigger: self.name.clone(),
                source: e,
            })?;
        }

        Ok(())
    }
}

/// Source of a trigger's webhook secret.
///
/// [`SecretSourceConfig::Literal`] is for development and testing only; a
/// startup `WARN` is emitted for every trigger that uses one.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum SecretSourceConfig {
    /// Secret embedded in the configuration.
    Literal {
        /// Raw secret value. Excluded from `Debug` output.
        value: String,
    },

    /// Secret read from an environment variable at startup.
    Env {
        /// Name of the variable holding the secret.
        variable: String,
    },
}

impl SecretSourceConfig {
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal { .. })
    }

    pub fn validate(&self, trigger: &str) -> Result<(), ConfigError> {
        let (field, value) = match self {
            Self::Literal { value } => ("secret.value", value),
            Self::Env { variable } => ("secret.variable", variable),
        };

        if value.is_empty() {
            return Err(ConfigError::TriggerValidation {
                trigger: trigger.to_string(),
                message: format!("{field} must not be empty"),
            });
        }

        Ok(())
    }

    /// Produce the secret for `trigger`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingEnvironmentVariable`] when an `env` source names a
    /// variable that is unset or empty.
    pub fn resolve(&self, trigger: &str) -> Result<WebhookSecret, ConfigError> {
        match self {
            Self::Literal { value } => Ok(WebhookSecret::new(value.as_bytes())),
            Self::Env { variable } => match std::env::var(variable) {
                Ok(value) if !value.is_empty() => Ok(WebhookSecret::new(value.into_bytes())),
                _ => Err(ConfigError::MissingEnvironmentVariable {
                    trigger: trigger.to_string(),
                    variable: variable.clone(),
                }),
            },
        }
    }
}

impl std::fmt::Debug for SecretSourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal { .. } => f
                .debug_struct("SecretSourceConfig::Literal")
                .field("value", &"<REDACTED>")
                .finish(),
            Self::Env { variable } => f
                .debug_struct("SecretSourceConfig::Env")
                .field("variable", variable)
                .finish(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Invalid trigger '{trigger}': {message}")]
    TriggerValidation { trigger: String, message: String },

    #[error("Trigger '{trigger}' has an unusable repository_url: {source}")]
    Provider {
        trigger: String,
        #[source]
        source: ProviderError,
    },

    #[error("Trigger '{trigger}' secret variable {variable} is not set")]
    MissingEnvironmentVariable { trigger: String, variable: String },

    #[error("Configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
