//! Api Tester - diagnostic service for Kubernetes probes and autoscaling
//!
//! Runs as a regular Deployment and lets an operator flip readiness and
//! liveness, or exhaust memory and CPU, to watch how the cluster reacts.

use anyhow::Result;
use api_tester::{api, config::AppConfig};
use std::sync::Arc;
use tester_lib::{HealthState, StructuredLogger};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting api-tester");

    let mut config = AppConfig::load()?;
    config.apply_datasource_secret();
    info!(
        version = %config.version,
        profile = %config.profile,
        role = %config.role,
        "Api tester configured"
    );

    let health = HealthState::new();
    let logger = StructuredLogger::default();
    let port = config.server_port;
    let app_state = Arc::new(api::AppState::new(config, health.clone(), logger.clone()));

    let listener = api::bind(port).await?;

    // Startup is complete once the listener is bound
    health.mark_started();
    logger.log_startup(&app_state.config.version, &app_state.config.profile, port);

    tokio::select! {
        result = api::serve(listener, app_state) => result?,
        _ = tokio::signal::ctrl_c() => {
            logger.log_shutdown("SIGINT received");
            info!("Shutting down");
        }
    }

    Ok(())
}
