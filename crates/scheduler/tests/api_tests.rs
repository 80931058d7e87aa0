//! Integration tests for the scheduler API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use pod_scheduler::api::{create_router, AppState};
use scheduler_lib::{
    health::components, ClusterCache, EventLogger, HealthRegistry, Pipeline, ReservationPolicy,
    ResourceFit, Scheduler, SchedulerMetrics, SchedulerPlugin,
};
use std::sync::Arc;
use tower::ServiceExt;

async fn setup_test_app() -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry.register(components::CACHE).await;
    health_registry.register(components::PIPELINE).await;

    let metrics = SchedulerMetrics::new();
    let fit = ResourceFit::new(Vec::new(), ReservationPolicy::default(), true);
    let pipeline = Pipeline::new(vec![SchedulerPlugin::ResourceFit(fit)]);
    let scheduler = Arc::new(Scheduler::new(
        Arc::new(ClusterCache::new()),
        pipeline,
        metrics.clone(),
    ));

    let state = Arc::new(AppState::new(
        scheduler,
        health_registry,
        metrics,
        EventLogger::new("test-scheduler"),
    ));
    let router = create_router(state.clone());

    (router, state)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn test_node(name: &str, cpu: i64, memory: i64) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "allocatable": { "cpu": cpu, "memory": memory },
    })
}

fn test_workload(name: &str, cpu: i64, memory: i64) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "containers": [
            { "name": "main", "requests": { "cpu": cpu, "memory": memory } }
        ],
    })
}

#[tokio::test]
async fn test_healthz_returns_ok_when_healthy() {
    let (app, _state) = setup_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let health = json_body(response).await;
    assert_eq!(health["status"], "healthy");
    assert!(health["components"]["cache"].is_object());
    assert!(health["components"]["pipeline"].is_object());
}

#[tokio::test]
async fn test_healthz_returns_503_when_unhealthy() {
    let (app, state) = setup_test_app().await;

    state
        .health_registry
        .set_unhealthy(components::CACHE, "Snapshot failures")
        .await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_readyz_tracks_ready_flag() {
    let (app, state) = setup_test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/readyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    state.health_registry.set_ready(true).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/readyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upsert_and_list_nodes() {
    let (app, _state) = setup_test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/nodes/node-a",
            test_node("node-a", 4000, 8_000_000_000),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/nodes").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let nodes = json_body(response).await;
    assert_eq!(nodes.as_array().unwrap().len(), 1);
    assert_eq!(nodes[0]["node_name"], "node-a");
    assert_eq!(nodes[0]["pod_count"], 0);
}

#[tokio::test]
async fn test_upsert_node_rejects_name_mismatch() {
    let (app, _state) = setup_test_app().await;

    let response = app
        .oneshot(json_request(
            "PUT",
            "/nodes/node-a",
            test_node("node-b", 4000, 8_000_000_000),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_remove_unknown_node_returns_404() {
    let (app, _state) = setup_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/nodes/ghost")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_add_pod_to_unknown_node_returns_404() {
    let (app, _state) = setup_test_app().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/nodes/ghost/pods",
            test_workload("web", 100, 1000),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_pod_bind_returns_409() {
    let (app, _state) = setup_test_app().await;

    app.clone()
        .oneshot(json_request(
            "PUT",
            "/nodes/node-a",
            test_node("node-a", 4000, 8_000_000_000),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/nodes/node-a/pods",
            test_workload("web", 100, 1000),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(json_request(
            "POST",
            "/nodes/node-a/pods",
            test_workload("web", 100, 1000),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_schedule_with_no_nodes_is_unschedulable() {
    let (app, _state) = setup_test_app().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/scheduling/requests",
            serde_json::json!({ "workload": test_workload("web", 500, 1000) }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let result = json_body(response).await;
    assert_eq!(result["workload"], "default/web");
    assert!(result["feasible"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_schedule_picks_feasible_node() {
    let (app, _state) = setup_test_app().await;

    app.clone()
        .oneshot(json_request(
            "PUT",
            "/nodes/node-a",
            test_node("node-a", 4000, 8_000_000_000),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            "/scheduling/requests",
            serde_json::json!({ "workload": test_workload("web", 2000, 1_000_000_000) }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let result = json_body(response).await;
    assert_eq!(result["feasible"][0], "node-a");
}

#[tokio::test]
async fn test_schedule_reports_insufficient_resources() {
    let (app, _state) = setup_test_app().await;

    app.clone()
        .oneshot(json_request(
            "PUT",
            "/nodes/node-a",
            test_node("node-a", 1000, 8_000_000_000),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            "/scheduling/requests",
            serde_json::json!({ "workload": test_workload("web", 2000, 1_000_000_000) }),
        ))
        .await
        .unwrap();

    let result = json_body(response).await;
    assert!(result["feasible"].as_array().unwrap().is_empty());
    let reasons = result["failures"]["node-a"].as_array().unwrap();
    assert!(reasons.iter().any(|r| r == "Insufficient cpu"));
}

#[tokio::test]
async fn test_schedule_honors_active_reservation() {
    let (app, _state) = setup_test_app().await;

    // 4000m node with an unexpired marker reserving 1000m cpu.
    let node = serde_json::json!({
        "name": "node-a",
        "allocatable": { "cpu": 4000, "memory": 8_000_000_000u64 },
        "conditions": [{
            "condition_type": "Preemption",
            "reason": "1000,0,0",
            "last_heartbeat": chrono::Utc::now().to_rfc3339(),
        }],
    });
    app.clone()
        .oneshot(json_request("PUT", "/nodes/node-a", node))
        .await
        .unwrap();

    // 3000m request: 3000 + 1000 reserved == 4000 allocatable, equality admits.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/scheduling/requests",
            serde_json::json!({ "workload": test_workload("exact", 3000, 1000) }),
        ))
        .await
        .unwrap();
    let result = json_body(response).await;
    assert_eq!(result["feasible"][0], "node-a");

    // 3001m request overshoots by one millicore.
    let response = app
        .oneshot(json_request(
            "POST",
            "/scheduling/requests",
            serde_json::json!({ "workload": test_workload("over", 3001, 1000) }),
        ))
        .await
        .unwrap();
    let result = json_body(response).await;
    assert!(result["feasible"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_schedule_with_bind_commits_workload() {
    let (app, state) = setup_test_app().await;

    app.clone()
        .oneshot(json_request(
            "PUT",
            "/nodes/node-a",
            test_node("node-a", 4000, 8_000_000_000),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/scheduling/requests",
            serde_json::json!({
                "workload": test_workload("web", 3000, 1_000_000_000),
                "bind": true,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.scheduler.cache().pod_count(), 1);

    // The committed workload now occupies the node; an identical request
    // no longer fits.
    let response = app
        .oneshot(json_request(
            "POST",
            "/scheduling/requests",
            serde_json::json!({ "workload": test_workload("web-2", 3000, 1_000_000_000) }),
        ))
        .await
        .unwrap();
    let result = json_body(response).await;
    assert!(result["feasible"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, state) = setup_test_app().await;

    state.metrics.observe_cycle_latency(0.001);
    state.metrics.set_cluster_size(1, 0);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("pod_scheduler_cycle_latency_seconds"));
    assert!(metrics_text.contains("pod_scheduler_nodes_tracked"));
}
