//! Price Service - property price prediction API
//!
//! Serves single and batch price predictions backed by a learned model when
//! one is available and by the heuristic pricing model otherwise.

use anyhow::Result;
use price_service::{api, config};
use pricing_lib::{
    health::{components, HealthRegistry},
    observability::{PricingMetrics, StructuredLogger},
    predictor::{ModelStore, PredictionOrchestrator},
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting price-service");

    let config = config::ServiceConfig::load()?;
    info!(
        port = config.api_port,
        model_path = %config.model_path,
        encoder_path = %config.encoder_path,
        "Service configured"
    );

    let logger = StructuredLogger::new(&config.service_name);
    let metrics = PricingMetrics::new();

    // Artifact loading parses and optimizes the model graph
    let paths = config.model_paths();
    let store = tokio::task::spawn_blocking(move || ModelStore::load(paths)).await?;
    let status = store.status();
    metrics.set_model_loaded(status.loaded);
    logger.log_model_loaded(status.loaded, status.version.as_deref(), status.model_path.as_deref());

    let health_registry = HealthRegistry::new();
    health_registry.register(components::ENGINE).await;
    health_registry.record_model_status(&status).await;

    let orchestrator = PredictionOrchestrator::new(Arc::new(store));
    let app_state = Arc::new(api::AppState::new(
        orchestrator,
        health_registry.clone(),
        metrics,
        logger.clone(),
    ));

    health_registry.set_ready(true).await;
    logger.log_startup(SERVICE_VERSION, status.version.as_deref());

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        result = api_handle => {
            match result {
                Ok(Ok(())) => logger.log_shutdown("API server stopped"),
                Ok(Err(e)) => {
                    error!(error = %e, "API server failed");
                    logger.log_shutdown("API server failed");
                    return Err(e);
                }
                Err(e) => {
                    error!(error = %e, "API server task panicked");
                    logger.log_shutdown("API server task panicked");
                    return Err(e.into());
                }
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}
