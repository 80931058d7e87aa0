//! HTTP API for scheduling requests, cluster-state updates, health and metrics

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use scheduler_lib::{
    ComponentStatus, EventLogger, HealthRegistry, Node, NodeSnapshot, ScheduleRequest,
    Scheduler, SchedulerError, SchedulerMetrics, Workload,
};
use std::sync::Arc;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<Scheduler>,
    pub health_registry: HealthRegistry,
    pub metrics: SchedulerMetrics,
    pub logger: EventLogger,
}

impl AppState {
    pub fn new(
        scheduler: Arc<Scheduler>,
        health_registry: HealthRegistry,
        metrics: SchedulerMetrics,
        logger: EventLogger,
    ) -> Self {
        Self {
            scheduler,
            health_registry,
            metrics,
            logger,
        }
    }

    fn sync_cluster_gauges(&self) {
        let cache = self.scheduler.cache();
        self.metrics
            .set_cluster_size(cache.node_count() as i64, cache.pod_count() as i64);
    }
}

/// Map cache and scheduling errors onto HTTP status codes.
fn error_response(err: SchedulerError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &err {
        SchedulerError::NodeNotFound(_) | SchedulerError::PodNotBound { .. } => {
            StatusCode::NOT_FOUND
        }
        SchedulerError::NodeAlreadyExists(_) | SchedulerError::PodAlreadyBound { .. } => {
            StatusCode::CONFLICT
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "error": err.to_string() })))
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder.encode(&metric_families, &mut buffer).unwrap();

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// List current node snapshots, sorted by name.
async fn list_nodes(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cache = state.scheduler.cache();
    let snapshots: Vec<NodeSnapshot> = cache
        .node_names()
        .iter()
        .filter_map(|name| cache.snapshot(name).ok())
        .collect();
    (StatusCode::OK, Json(snapshots))
}

/// Create or replace a node. The body's name must match the path.
async fn upsert_node(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(node): Json<Node>,
) -> impl IntoResponse {
    if node.name != name {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "node name in body does not match path" })),
        );
    }

    match state.scheduler.cache().upsert_node(node) {
        Ok(()) => {
            state.sync_cluster_gauges();
            (StatusCode::OK, Json(serde_json::json!({ "node": name })))
        }
        Err(err) => error_response(err),
    }
}

async fn remove_node(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.scheduler.cache().remove_node(&name) {
        Ok(()) => {
            state.sync_cluster_gauges();
            (StatusCode::OK, Json(serde_json::json!({ "node": name })))
        }
        Err(err) => error_response(err),
    }
}

/// Bind a workload to a node directly, bypassing the filter pipeline.
///
/// Mirrors the cluster-state stream reporting pods scheduled elsewhere.
async fn add_pod(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(workload): Json<Workload>,
) -> impl IntoResponse {
    let key = workload.key();
    match state.scheduler.cache().add_pod(&name, workload) {
        Ok(()) => {
            state.sync_cluster_gauges();
            (
                StatusCode::CREATED,
                Json(serde_json::json!({ "node": name, "pod": key })),
            )
        }
        Err(err) => error_response(err),
    }
}

async fn remove_pod(
    State(state): State<Arc<AppState>>,
    Path((name, namespace, pod)): Path<(String, String, String)>,
) -> impl IntoResponse {
    let key = format!("{}/{}", namespace, pod);
    match state.scheduler.cache().remove_pod(&name, &key) {
        Ok(()) => {
            state.sync_cluster_gauges();
            (
                StatusCode::OK,
                Json(serde_json::json!({ "node": name, "pod": key })),
            )
        }
        Err(err) => error_response(err),
    }
}

/// Run one scheduling cycle for the submitted workload.
///
/// With `bind` set, the workload is committed to the first feasible node
/// before the result is returned.
async fn schedule(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScheduleRequest>,
) -> impl IntoResponse {
    let result = match state.scheduler.schedule(&request.workload) {
        Ok(result) => result,
        Err(err) => return error_response(err),
    };

    let chosen = result.best().map(str::to_string);
    state
        .logger
        .log_placement(&result.workload, chosen.as_deref(), result.feasible.len());

    if request.bind {
        if let Some(node) = &chosen {
            if let Err(err) = state
                .scheduler
                .cache()
                .add_pod(node, request.workload.clone())
            {
                return error_response(err);
            }
            state.sync_cluster_gauges();
            info!(workload = %result.workload, node = %node, "Workload bound");
        }
    }

    (StatusCode::OK, Json(serde_json::json!(result)))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/nodes", get(list_nodes))
        .route("/nodes/:name", put(upsert_node).delete(remove_node))
        .route("/nodes/:name/pods", post(add_pod))
        .route(
            "/nodes/:name/pods/:namespace/:pod",
            axum::routing::delete(remove_pod),
        )
        .route("/scheduling/requests", post(schedule))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
