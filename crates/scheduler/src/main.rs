//! Pod Scheduler - Resource-admission scheduling service
//!
//! This binary serves scheduling requests over HTTP, evaluating workload
//! fit against a concurrent cluster cache through the filter pipeline.

use anyhow::Result;
use pod_scheduler::{api, config};
use scheduler_lib::{
    health::components, ClusterCache, EventLogger, HealthRegistry, Pipeline, ReservationPolicy,
    ResourceFit, Scheduler, SchedulerMetrics, SchedulerPlugin,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SCHEDULER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting pod-scheduler");

    // Load configuration
    let config = config::SchedulerConfig::load()?;
    info!(scheduler = %config.scheduler_name, "Scheduler configured");

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::CACHE).await;
    health_registry.register(components::PIPELINE).await;
    health_registry.register(components::API).await;

    // Initialize metrics
    let metrics = SchedulerMetrics::new();

    // Build the filter pipeline from configuration
    let policy = ReservationPolicy::from_secs(config.reservation_validity_secs as i64);
    let fit = ResourceFit::new(
        config.ignored_resource_names(),
        policy,
        config.count_overhead,
    );
    let pipeline = Pipeline::new(vec![SchedulerPlugin::ResourceFit(fit)]);

    let logger = EventLogger::new(&config.scheduler_name);
    logger.log_startup(SCHEDULER_VERSION, &pipeline.plugin_names());

    let cache = Arc::new(ClusterCache::new());
    let scheduler = Arc::new(Scheduler::new(cache, pipeline, metrics.clone()));

    // Create shared application state
    let app_state = Arc::new(api::AppState::new(
        scheduler,
        health_registry.clone(),
        metrics,
        logger.clone(),
    ));

    // Mark scheduler as ready after initialization
    health_registry.set_ready(true).await;

    // Start the API server
    let _api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}
