//! Core data models shared across the scheduler

use crate::resources::ResourceRequests;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default pod capacity when a node does not declare one.
pub const DEFAULT_ALLOWED_PODS: i64 = 110;

/// One container in a workload, carrying its declared resource requests.
///
/// Missing or empty requests mean zero demand; they are never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,
    #[serde(default)]
    pub requests: ResourceRequests,
}

/// The schedulable unit whose resource demand is fit against nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workload {
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Regular containers; they run concurrently.
    #[serde(default)]
    pub containers: Vec<ContainerSpec>,
    /// Init containers; they run to completion sequentially before any
    /// regular container starts.
    #[serde(default)]
    pub init_containers: Vec<ContainerSpec>,
    /// Optional runtime overhead added on top of container demand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overhead: Option<ResourceRequests>,
}

impl Workload {
    /// Cache key in `namespace/name` form.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

fn default_namespace() -> String {
    "default".to_string()
}

/// Condition-like record attached to a node. Preemption reservations are
/// published through conditions with a `Preemption` type tag; see the
/// `reservation` module for the payload contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeCondition {
    pub condition_type: String,
    #[serde(default)]
    pub reason: String,
    pub last_heartbeat: DateTime<Utc>,
}

/// A compute host as reported by the cluster-state event stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    /// Allocatable capacity ceiling per resource name.
    #[serde(default)]
    pub allocatable: ResourceRequests,
    /// Maximum number of pods the node accepts.
    #[serde(default = "default_allowed_pods")]
    pub allowed_pods: i64,
    #[serde(default)]
    pub conditions: Vec<NodeCondition>,
}

fn default_allowed_pods() -> i64 {
    DEFAULT_ALLOWED_PODS
}

/// One placement attempt handed to the scheduler by the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub workload: Workload,
    /// Commit the workload to the first feasible node on success.
    #[serde(default)]
    pub bind: bool,
}
