//! Hybrid Scaler - scaling decision service
//!
//! The reconciling controller posts one workload state per reconciliation
//! and applies the returned decision; this process owns the learning agents.

use anyhow::Result;
use hybrid_scaler::{
    api,
    config::ScalerConfig,
    registry::{AgentFactory, WorkloadRegistry},
};
use scaler_lib::{
    health::{components, HealthRegistry},
    observability::{ScalerMetrics, StructuredLogger},
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SCALER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs, filter from RUST_LOG
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting hybrid-scaler");

    let config = ScalerConfig::load()?;
    info!(
        instance = %config.instance_name,
        strategy = ?config.strategy,
        epsilon = config.epsilon,
        "Scaler configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::DECISION_ENGINE).await;
    health_registry.register(components::WORKLOAD_REGISTRY).await;

    let metrics = ScalerMetrics::new();
    let logger = StructuredLogger::new(&config.instance_name);

    let factory = AgentFactory {
        strategy: config.strategy,
        epsilon: config.epsilon,
        defaults: config.rl_parameters()?,
        rng_seed: config.rng_seed,
    };
    let workloads = WorkloadRegistry::new(factory, metrics.clone());

    let app_state = Arc::new(api::AppState::new(
        health_registry.clone(),
        metrics,
        logger.clone(),
        workloads,
    ));

    health_registry.set_ready(true).await;
    logger.log_startup(SCALER_VERSION, config.api_port);

    let shutdown_logger = logger.clone();
    let shutdown = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        shutdown_logger.log_shutdown("SIGINT received");
    };

    api::serve(config.api_port, app_state, shutdown).await?;
    info!("Shut down");

    Ok(())
}
