//! Scheduling cycle orchestration
//!
//! One call to [`Scheduler::schedule`] is one placement attempt for one
//! workload: a fresh cycle context, one PreFilter pass, then a Filter
//! pass per candidate node. Node snapshots are taken immediately before
//! each Filter call and never re-read mid-evaluation.

use crate::cache::ClusterCache;
use crate::cycle::CycleContext;
use crate::error::SchedulerError;
use crate::models::Workload;
use crate::observability::SchedulerMetrics;
use crate::plugins::{FilterOutcome, Pipeline};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Outcome of one placement attempt across all candidate nodes.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleResult {
    pub workload: String,
    /// Nodes that can host the workload, in candidate order. Ranking is
    /// out of scope; callers wanting a single node take the first.
    pub feasible: Vec<String>,
    /// Rejection reasons per evaluated-but-unfit node.
    pub failures: BTreeMap<String, Vec<String>>,
    /// Nodes whose fit could not be determined, with the error.
    pub errors: BTreeMap<String, String>,
}

impl ScheduleResult {
    pub fn best(&self) -> Option<&str> {
        self.feasible.first().map(String::as_str)
    }

    pub fn evaluated(&self) -> usize {
        self.feasible.len() + self.failures.len() + self.errors.len()
    }
}

/// Runs scheduling cycles against the cluster cache.
pub struct Scheduler {
    cache: Arc<ClusterCache>,
    pipeline: Pipeline,
    metrics: SchedulerMetrics,
}

impl Scheduler {
    pub fn new(cache: Arc<ClusterCache>, pipeline: Pipeline, metrics: SchedulerMetrics) -> Self {
        Self {
            cache,
            pipeline,
            metrics,
        }
    }

    /// Run one placement attempt. A PreFilter failure aborts the whole
    /// cycle; a per-node failure only marks that node.
    pub fn schedule(&self, workload: &Workload) -> Result<ScheduleResult, SchedulerError> {
        let start = Instant::now();
        let cycle = CycleContext::new();

        if let Err(err) = self.pipeline.run_pre_filter(&cycle, workload) {
            warn!(workload = %workload.key(), error = %err, "PreFilter failed, aborting cycle");
            self.metrics.inc_cycle_errors();
            return Err(err);
        }

        let mut result = ScheduleResult {
            workload: workload.key(),
            feasible: Vec::new(),
            failures: BTreeMap::new(),
            errors: BTreeMap::new(),
        };

        for name in self.cache.node_names() {
            let snapshot = match self.cache.snapshot(&name) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    // Snapshot retrieval failure is an error for this
                    // node, not an unschedulable verdict.
                    result.errors.insert(name, err.to_string());
                    self.metrics.inc_filter_errors();
                    continue;
                }
            };

            match self.pipeline.run_filter(&cycle, workload, &snapshot) {
                Ok(FilterOutcome::Schedulable) => {
                    self.metrics.inc_schedulable_verdicts();
                    result.feasible.push(name);
                }
                Ok(FilterOutcome::Unschedulable { reasons }) => {
                    self.metrics.inc_unschedulable_verdicts();
                    result.failures.insert(name, reasons);
                }
                Err(err) => {
                    self.metrics.inc_filter_errors();
                    result.errors.insert(name, err.to_string());
                }
            }
        }

        let elapsed = start.elapsed();
        self.metrics.observe_cycle_latency(elapsed.as_secs_f64());
        info!(
            workload = %result.workload,
            feasible = result.feasible.len(),
            evaluated = result.evaluated(),
            duration_us = elapsed.as_micros() as u64,
            "Scheduling cycle completed"
        );

        Ok(result)
    }

    pub fn cache(&self) -> &Arc<ClusterCache> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContainerSpec, Node, NodeCondition};
    use crate::plugins::{ResourceFit, SchedulerPlugin};
    use crate::reservation::{ReservationPolicy, RESERVATION_CONDITION_TYPE};
    use crate::resources::ResourceRequests;
    use chrono::{Duration, Utc};

    fn node(name: &str, milli_cpu: i64, memory: i64) -> Node {
        let mut allocatable = ResourceRequests::new();
        allocatable.insert("cpu".to_string(), milli_cpu);
        allocatable.insert("memory".to_string(), memory);
        Node {
            name: name.to_string(),
            allocatable,
            allowed_pods: 10,
            conditions: vec![],
        }
    }

    fn workload(name: &str, milli_cpu: i64) -> Workload {
        let mut requests = ResourceRequests::new();
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

    fn scheduler(cache: Arc<ClusterCache>) -> Scheduler {
        let pipeline = Pipeline::new(vec![SchedulerPlugin::ResourceFit(ResourceFit::new(
            [],
            ReservationPolicy::default(),
            true,
        ))]);
        Scheduler::new(cache, pipeline, SchedulerMetrics::new())
    }

    #[test]
    fn test_schedule_splits_feasible_and_unfit_nodes() {
        let cache = Arc::new(ClusterCache::new());
        cache.add_node(node("node-big", 8000, 1 << 30)).unwrap();
        cache.add_node(node("node-small", 500, 1 << 30)).unwrap();

        let result = scheduler(cache).schedule(&workload("web", 1000)).unwrap();

        assert_eq!(result.feasible, vec!["node-big"]);
        assert_eq!(
            result.failures["node-small"],
            vec!["Insufficient cpu".to_string()]
        );
        assert_eq!(result.evaluated(), 2);
    }

    #[test]
    fn test_schedule_empty_cluster_has_no_candidates() {
        let cache = Arc::new(ClusterCache::new());
        let result = scheduler(cache).schedule(&workload("web", 1000)).unwrap();

        assert!(result.feasible.is_empty());
        assert_eq!(result.evaluated(), 0);
        assert!(result.best().is_none());
    }

    #[test]
    fn test_best_is_first_feasible_in_candidate_order() {
        let cache = Arc::new(ClusterCache::new());
        cache.add_node(node("node-b", 8000, 1 << 30)).unwrap();
        cache.add_node(node("node-a", 8000, 1 << 30)).unwrap();

        let result = scheduler(cache).schedule(&workload("web", 1000)).unwrap();
        assert_eq!(result.best(), Some("node-a"));
    }

    #[test]
    fn test_reservation_on_one_node_redirects_placement() {
        let now = Utc::now();
        let cache = Arc::new(ClusterCache::new());

        let mut reserved_node = node("node-a", 2000, 1 << 30);
        reserved_node.conditions = vec![NodeCondition {
            condition_type: RESERVATION_CONDITION_TYPE.to_string(),
            reason: "1500,0,0".to_string(),
            last_heartbeat: now - Duration::seconds(5),
        }];
        cache.add_node(reserved_node).unwrap();
        cache.add_node(node("node-b", 2000, 1 << 30)).unwrap();

        let result = scheduler(cache).schedule(&workload("web", 1000)).unwrap();
        assert_eq!(result.feasible, vec!["node-b"]);
        assert!(result.failures.contains_key("node-a"));
    }

    #[test]
    fn test_identical_cycles_yield_identical_verdicts() {
        let cache = Arc::new(ClusterCache::new());
        cache.add_node(node("node-a", 4000, 1 << 30)).unwrap();
        let scheduler = scheduler(cache);
        let workload = workload("web", 1000);

        let first = scheduler.schedule(&workload).unwrap();
        let second = scheduler.schedule(&workload).unwrap();
        assert_eq!(first.feasible, second.feasible);
        assert_eq!(first.failures, second.failures);
    }
}
