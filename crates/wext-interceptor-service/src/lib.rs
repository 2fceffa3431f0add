//! # Wext Interceptor Service
//!
//! HTTP host for the webhook interceptor. Each configured trigger is served at
//! `POST /webhook/{trigger}`; a delivery that authenticates, decodes and
//! matches the filter declared in its headers is answered with `200` and the
//! augmented JSON payload.
//!
//! Endpoints:
//! - `POST /webhook/{trigger}` - run a delivery through the interceptor
//! - `GET /health` - liveness probe

pub mod config;
pub mod errors;

pub use config::{
    ConfigError, LoggingConfig, SecretSourceConfig, ServerConfig, ServiceConfig, TriggerConfig,
};
pub use errors::{ServiceError, WebhookHandlerError};

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{header, HeaderMap, Method},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{info, instrument, warn};
use wext_interceptor_core::{resolve_provider, Interceptor, Provider, RawRequest, WebhookSecret};

// ============================================================================
// Triggers
// ============================================================================

/// A trigger ready to serve requests: secret resolved, provider pinned if known.
#[derive(Debug, Clone)]
pub struct Trigger {
    pub name: String,
    pub secret: WebhookSecret,

    /// Provider resolved from the trigger's repository URL; `None` means the
    /// provider is detected per delivery.
    pub provider: Option<Provider>,
}

impl Trigger {
    pub fn new(name: impl Into<String>, secret: WebhookSecret) -> Self {
        Self {
            name: name.into(),
            secret,
            provider: None,
        }
    }

    /// Skip provider detection and always handle deliveries as `provider`
    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Resolve a configured trigger.
    pub fn from_config(config: &TriggerConfig) -> Result<Self, ConfigError> {
        if config.secret.is_literal() {
            warn!(
                trigger = %config.name,
                "Trigger uses a literal secret from configuration; \
                 use an environment variable outside development"
            );
        }

        let mut trigger = Self::new(&config.name, config.secret.resolve(&config.name)?);

        if let Some(url) = &config.repository_url {
            let endpoint = resolve_provider(url).map_err(|e| ConfigError::Provider {
                trigger: config.name.clone(),
                source: e,
            })?;
            info!(
                trigger = %config.name,
                provider = %endpoint.provider,
                api_url = %endpoint.api_url,
                "Pinned trigger to provider"
            );
            trigger = trigger.with_provider(endpoint.provider);
        }

        Ok(trigger)
    }
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    interceptor: Arc<Interceptor>,
    triggers: Arc<HashMap<String, Trigger>>,
}

impl AppState {
    /// Create new application state
    pub fn new(interceptor: Interceptor, triggers: impl IntoIterator<Item = Trigger>) -> Self {
        let triggers = triggers
            .into_iter()
            .map(|trigger| (trigger.name.clone(), trigger))
            .collect();

        Self {
            interceptor: Arc::new(interceptor),
            triggers: Arc::new(triggers),
        }
    }

    /// Build state from validated configuration
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ConfigError> {
        let triggers = config
            .triggers
            .iter()
            .map(Trigger::from_config)
            .collect::<Result<Vec<_>, _>>()?;

        let interceptor = Interceptor::new().with_filter_headers(config.filter_headers.clone());
        Ok(Self::new(interceptor, triggers))
    }

    pub fn trigger(&self, name: &str) -> Option<&Trigger> {
        self.triggers.get(name)
    }

    pub fn trigger_count(&self) -> usize {
        self.triggers.len()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Build the HTTP router.
///
/// Request bodies larger than `max_body_size` are rejected with
/// `413 Payload Too Large` before they reach the interceptor.
pub fn create_router(state: AppState, max_body_size: usize) -> Router {
    Router::new()
        .route("/webhook/{trigger}", post(handle_webhook))
        .route("/health", get(handle_health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(max_body_size))
                .into_inner(),
        )
        .with_state(state)
}

/// Start HTTP server
pub async fn start_server(config: ServiceConfig, state: AppState) -> Result<(), ServiceError> {
    let app = create_router(state, config.server.max_body_size);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e: std::net::AddrParseError| ServiceError::BindFailed {
            address: format!("{}:{}", config.server.host, config.server.port),
            message: e.to_string(),
        })?;

    let listener =
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: addr.to_string(),
                message: e.to_string(),
            })?;

    info!("Starting HTTP server on {}", addr);

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_timeout))
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server shutdown complete");
    Ok(())
}

async fn shutdown_signal(shutdown_timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
        },
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Run a delivery through the interceptor for the named trigger
#[instrument(skip(state, method, headers, body), fields(size_bytes = body.len()))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    Path(trigger): Path<String>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookHandlerError> {
    let trigger = state
        .trigger(&trigger)
        .ok_or_else(|| {
            warn!("Webhook received for unknown trigger");
            WebhookHandlerError::TriggerNotFound {
                trigger: trigger.clone(),
            }
        })?;

    let request = RawRequest::new(method, headers, body);
    let payload = match trigger.provider {
        Some(provider) => {
            state
                .interceptor
                .intercept_as(provider, request, &trigger.name, &trigger.secret)?
        }
        None => state
            .interceptor
            .intercept(request, &trigger.name, &trigger.secret)?,
    };

    Ok(([(header::CONTENT_TYPE, "application/json")], payload).into_response())
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub triggers: usize,
}

/// Basic liveness check
async fn handle_health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        triggers: state.trigger_count(),
    })
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
