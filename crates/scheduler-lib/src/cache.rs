//! Concurrent cluster-state cache
//!
//! Node and pod change events arriving from the cluster-state stream
//! mutate this cache; the fit evaluator only ever sees an immutable
//! [`NodeSnapshot`] copied out under the entry lock, so a snapshot is
//! never torn by a concurrent update. `Requested` capacity is maintained
//! incrementally from the profiles of bound pods.

use crate::error::SchedulerError;
use crate::models::{Node, NodeCondition, Workload};
use crate::profile::{compute_profile, WorkloadProfile};
use crate::resources::ResourceVector;
use dashmap::DashMap;
use std::collections::HashMap;
use tracing::debug;

/// Immutable point-in-time view of one node's capacity.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NodeSnapshot {
    pub node_name: String,
    /// Capacity ceiling per dimension.
    pub allocatable: ResourceVector,
    /// Capacity already committed by bound pods.
    pub requested: ResourceVector,
    /// Number of pods currently bound.
    pub pod_count: usize,
    /// Maximum pod count the node accepts.
    pub allowed_pods: i64,
    /// Conditions attached to the node, including reservation markers.
    pub conditions: Vec<NodeCondition>,
}

struct BoundPod {
    workload: Workload,
    profile: WorkloadProfile,
}

struct NodeEntry {
    node: Node,
    pods: HashMap<String, BoundPod>,
    requested: ResourceVector,
}

/// Concurrent node/pod store keyed by node name.
#[derive(Default)]
pub struct ClusterCache {
    nodes: DashMap<String, NodeEntry>,
}

impl ClusterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly observed node.
    pub fn add_node(&self, node: Node) -> Result<(), SchedulerError> {
        if self.nodes.contains_key(&node.name) {
            return Err(SchedulerError::NodeAlreadyExists(node.name));
        }
        debug!(node = %node.name, "Adding node to cluster cache");
        self.nodes.insert(
            node.name.clone(),
            NodeEntry {
                node,
                pods: HashMap::new(),
                requested: ResourceVector::default(),
            },
        );
        Ok(())
    }

    /// Replace a node's spec (allocatable, conditions, pod capacity)
    /// while keeping its bound pods and their committed capacity.
    pub fn update_node(&self, node: Node) -> Result<(), SchedulerError> {
        let mut entry = self
            .nodes
            .get_mut(&node.name)
            .ok_or_else(|| SchedulerError::NodeNotFound(node.name.clone()))?;
        debug!(node = %node.name, "Updating node in cluster cache");
        entry.node = node;
        Ok(())
    }

    /// Insert or replace a node spec, preserving bound pods on replace.
    pub fn upsert_node(&self, node: Node) -> Result<(), SchedulerError> {
        match self.add_node(node.clone()) {
            Err(SchedulerError::NodeAlreadyExists(_)) => self.update_node(node),
            other => other,
        }
    }

    /// Drop a node and every pod bound to it.
    pub fn remove_node(&self, name: &str) -> Result<(), SchedulerError> {
        self.nodes
            .remove(name)
            .map(|_| debug!(node = %name, "Removed node from cluster cache"))
            .ok_or_else(|| SchedulerError::NodeNotFound(name.to_string()))
    }

    /// Commit a pod to a node, charging its profile against the node's
    /// requested capacity.
    pub fn add_pod(&self, node_name: &str, workload: Workload) -> Result<(), SchedulerError> {
        let mut entry = self
            .nodes
            .get_mut(node_name)
            .ok_or_else(|| SchedulerError::NodeNotFound(node_name.to_string()))?;

        let key = workload.key();
        if entry.pods.contains_key(&key) {
            return Err(SchedulerError::PodAlreadyBound {
                node: node_name.to_string(),
                pod: key,
            });
        }

        let profile = compute_profile(&workload, true);
        debug!(node = %node_name, pod = %key, milli_cpu = profile.milli_cpu, "Binding pod");
        entry.requested.accumulate(&profile);
        entry.pods.insert(key, BoundPod { workload, profile });
        Ok(())
    }

    /// Replace a bound pod's spec, rebalancing the committed capacity.
    pub fn update_pod(&self, node_name: &str, workload: Workload) -> Result<(), SchedulerError> {
        let mut entry = self
            .nodes
            .get_mut(node_name)
            .ok_or_else(|| SchedulerError::NodeNotFound(node_name.to_string()))?;

        let key = workload.key();
        let old = entry
            .pods
            .remove(&key)
            .ok_or_else(|| SchedulerError::PodNotBound {
                node: node_name.to_string(),
                pod: key.clone(),
            })?;

        entry.requested.release(&old.profile);
        let profile = compute_profile(&workload, true);
        entry.requested.accumulate(&profile);
        entry.pods.insert(key, BoundPod { workload, profile });
        Ok(())
    }

    /// Release a pod's hold on a node.
    pub fn remove_pod(&self, node_name: &str, pod_key: &str) -> Result<(), SchedulerError> {
        let mut entry = self
            .nodes
            .get_mut(node_name)
            .ok_or_else(|| SchedulerError::NodeNotFound(node_name.to_string()))?;

        let old = entry
            .pods
            .remove(pod_key)
            .ok_or_else(|| SchedulerError::PodNotBound {
                node: node_name.to_string(),
                pod: pod_key.to_string(),
            })?;

        entry.requested.release(&old.profile);
        debug!(node = %node_name, pod = %pod_key, "Unbound pod");
        Ok(())
    }

    /// Copy out an immutable view of a node. The copy is taken under the
    /// entry lock so it can never interleave with a concurrent update.
    pub fn snapshot(&self, name: &str) -> Result<NodeSnapshot, SchedulerError> {
        let entry = self
            .nodes
            .get(name)
            .ok_or_else(|| SchedulerError::NodeNotFound(name.to_string()))?;

        Ok(NodeSnapshot {
            node_name: entry.node.name.clone(),
            allocatable: ResourceVector::from_requests(&entry.node.allocatable),
            requested: entry.requested.clone(),
            pod_count: entry.pods.len(),
            allowed_pods: entry.node.allowed_pods,
            conditions: entry.node.conditions.clone(),
        })
    }

    /// Candidate node names in stable order.
    pub fn node_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.nodes.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn pod_count(&self) -> usize {
        self.nodes.iter().map(|e| e.pods.len()).sum()
    }

    /// Workload keys bound to one node.
    pub fn pods_on(&self, node_name: &str) -> Result<Vec<String>, SchedulerError> {
        let entry = self
            .nodes
            .get(node_name)
            .ok_or_else(|| SchedulerError::NodeNotFound(node_name.to_string()))?;
        let mut keys: Vec<String> = entry.pods.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContainerSpec;

    fn node(name: &str, milli_cpu: i64, memory: i64) -> Node {
        let mut allocatable = crate::resources::ResourceRequests::new();
        allocatable.insert("cpu".to_string(), milli_cpu);
        allocatable.insert("memory".to_string(), memory);
        Node {
            name: name.to_string(),
            allocatable,
            allowed_pods: 10,
            conditions: vec![],
        }
    }

    fn pod(name: &str, milli_cpu: i64) -> Workload {
        let mut requests = crate::resources::ResourceRequests::new();
        requests.insert("cpu".to_string(), milli_cpu);
        Workload {
            name: name.to_string(),
            namespace: "default".to_string(),
            containers: vec![ContainerSpec {
                name: "main".to_string(),
                requests,
            }],
            init_containers: vec![],
            overhead: None,
        }
    }

    #[test]
    fn test_add_node_rejects_duplicates() {
        let cache = ClusterCache::new();
        cache.add_node(node("node-1", 4000, 1024)).unwrap();

        assert_eq!(
            cache.add_node(node("node-1", 4000, 1024)),
            Err(SchedulerError::NodeAlreadyExists("node-1".to_string()))
        );
    }

    #[test]
    fn test_snapshot_of_unknown_node_fails() {
        let cache = ClusterCache::new();
        assert!(matches!(
            cache.snapshot("ghost"),
            Err(SchedulerError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_bound_pods_charge_requested_capacity() {
        let cache = ClusterCache::new();
        cache.add_node(node("node-1", 4000, 1024)).unwrap();
        cache.add_pod("node-1", pod("web", 500)).unwrap();
        cache.add_pod("node-1", pod("api", 300)).unwrap();

        let snapshot = cache.snapshot("node-1").unwrap();
        assert_eq!(snapshot.requested.milli_cpu, 800);
        assert_eq!(snapshot.pod_count, 2);
        assert_eq!(snapshot.allocatable.milli_cpu, 4000);
    }

    #[test]
    fn test_remove_pod_releases_capacity() {
        let cache = ClusterCache::new();
        cache.add_node(node("node-1", 4000, 1024)).unwrap();
        cache.add_pod("node-1", pod("web", 500)).unwrap();
        cache.remove_pod("node-1", "default/web").unwrap();

        let snapshot = cache.snapshot("node-1").unwrap();
        assert_eq!(snapshot.requested.milli_cpu, 0);
        assert_eq!(snapshot.pod_count, 0);
    }

    #[test]
    fn test_update_pod_rebalances_capacity() {
        let cache = ClusterCache::new();
        cache.add_node(node("node-1", 4000, 1024)).unwrap();
        cache.add_pod("node-1", pod("web", 500)).unwrap();
        cache.update_pod("node-1", pod("web", 1200)).unwrap();

        let snapshot = cache.snapshot("node-1").unwrap();
        assert_eq!(snapshot.requested.milli_cpu, 1200);
        assert_eq!(snapshot.pod_count, 1);
    }

    #[test]
    fn test_duplicate_bind_is_rejected() {
        let cache = ClusterCache::new();
        cache.add_node(node("node-1", 4000, 1024)).unwrap();
        cache.add_pod("node-1", pod("web", 500)).unwrap();

        assert!(matches!(
            cache.add_pod("node-1", pod("web", 500)),
            Err(SchedulerError::PodAlreadyBound { .. })
        ));
        // Requested is charged once.
        assert_eq!(cache.snapshot("node-1").unwrap().requested.milli_cpu, 500);
    }

    #[test]
    fn test_update_node_keeps_bound_pods() {
        let cache = ClusterCache::new();
        cache.add_node(node("node-1", 4000, 1024)).unwrap();
        cache.add_pod("node-1", pod("web", 500)).unwrap();
        cache.update_node(node("node-1", 8000, 2048)).unwrap();

        let snapshot = cache.snapshot("node-1").unwrap();
        assert_eq!(snapshot.allocatable.milli_cpu, 8000);
        assert_eq!(snapshot.requested.milli_cpu, 500);
        assert_eq!(snapshot.pod_count, 1);
    }

    #[test]
    fn test_snapshot_is_detached_from_later_updates() {
        let cache = ClusterCache::new();
        cache.add_node(node("node-1", 4000, 1024)).unwrap();
        let snapshot = cache.snapshot("node-1").unwrap();

        cache.add_pod("node-1", pod("web", 500)).unwrap();
        assert_eq!(snapshot.requested.milli_cpu, 0);
        assert_eq!(snapshot.pod_count, 0);
    }

    #[test]
    fn test_node_names_are_sorted() {
        let cache = ClusterCache::new();
        cache.add_node(node("node-b", 1, 1)).unwrap();
        cache.add_node(node("node-a", 1, 1)).unwrap();
        cache.add_node(node("node-c", 1, 1)).unwrap();

        assert_eq!(cache.node_names(), vec!["node-a", "node-b", "node-c"]);
    }

    #[test]
    fn test_remove_node_drops_pods() {
        let cache = ClusterCache::new();
        cache.add_node(node("node-1", 4000, 1024)).unwrap();
        cache.add_pod("node-1", pod("web", 500)).unwrap();
        cache.remove_node("node-1").unwrap();

        assert_eq!(cache.node_count(), 0);
        assert_eq!(cache.pod_count(), 0);
    }
}
