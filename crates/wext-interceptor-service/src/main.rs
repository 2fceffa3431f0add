//! # Wext Interceptor Service
//!
//! Binary entry point. Loads layered configuration, initializes logging,
//! resolves trigger secrets and serves the interceptor over HTTP.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wext_interceptor_service::{start_server, AppState, LoggingConfig, ServiceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::load(None).context("failed to load service configuration")?;

    init_logging(&config.logging);
    info!("Starting Wext Interceptor Service");

    config
        .validate()
        .context("service configuration is invalid")?;

    let state = AppState::from_config(&config).context("failed to prepare triggers")?;
    info!(
        triggers = state.trigger_count(),
        port = config.server.port,
        "Configuration loaded"
    );

    start_server(config, state).await?;
    Ok(())
}

/// Initialize the global subscriber. `RUST_LOG` overrides the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
