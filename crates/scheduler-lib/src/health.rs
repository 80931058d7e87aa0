//! Health tracking for the scheduler service
//!
//! Component health states feed the liveness and readiness probes served
//! by the HTTP API.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Component names tracked by the scheduler service.
pub mod components {
    pub const CACHE: &str = "cache";
    pub const PIPELINE: &str = "pipeline";
    pub const API: &str = "api";
}

/// Health status of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Experiencing issues but still operational.
    Degraded,
    Unhealthy,
}

impl ComponentStatus {
    pub fn is_operational(&self) -> bool {
        matches!(self, ComponentStatus::Healthy | ComponentStatus::Degraded)
    }
}

/// One component's current health.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn with_status(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Aggregate health report served on `/healthz`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

/// Readiness report served on `/readyz`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
}

struct RegistryState {
    components: HashMap<String, ComponentHealth>,
    ready: bool,
}

/// Shared registry of component health states.
#[derive(Clone)]
pub struct HealthRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(RegistryState {
                components: HashMap::new(),
                ready: false,
            })),
        }
    }

    /// Register a component, starting healthy.
    pub async fn register(&self, name: &str) {
        let mut state = self.state.write().await;
        state.components.insert(
            name.to_string(),
            ComponentHealth::with_status(ComponentStatus::Healthy, None),
        );
    }

    pub async fn set_healthy(&self, name: &str) {
        self.set_status(name, ComponentStatus::Healthy, None).await;
    }

    pub async fn set_degraded(&self, name: &str, message: impl Into<String>) {
        self.set_status(name, ComponentStatus::Degraded, Some(message.into()))
            .await;
    }

    pub async fn set_unhealthy(&self, name: &str, message: impl Into<String>) {
        self.set_status(name, ComponentStatus::Unhealthy, Some(message.into()))
            .await;
    }

    async fn set_status(&self, name: &str, status: ComponentStatus, message: Option<String>) {
        let mut state = self.state.write().await;
        state.components.insert(
            name.to_string(),
            ComponentHealth::with_status(status, message),
        );
    }

    /// Flip overall readiness; serving starts only after initialization.
    pub async fn set_ready(&self, ready: bool) {
        self.state.write().await.ready = ready;
    }

    /// Aggregate health: the worst component status wins.
    pub async fn health(&self) -> HealthResponse {
        let state = self.state.read().await;

        let mut overall = ComponentStatus::Healthy;
        for component in state.components.values() {
            match component.status {
                ComponentStatus::Unhealthy => {
                    overall = ComponentStatus::Unhealthy;
                    break;
                }
                ComponentStatus::Degraded => overall = ComponentStatus::Degraded,
                ComponentStatus::Healthy => {}
            }
        }

        HealthResponse {
            status: overall,
            components: state.components.clone(),
        }
    }

    /// Ready only once initialization finished and every component is at
    /// least operational.
    pub async fn readiness(&self) -> ReadinessResponse {
        let state = self.state.read().await;
        let operational = state
            .components
            .values()
            .all(|c| c.status.is_operational());
        ReadinessResponse {
            ready: state.ready && operational,
        }
    }
}
