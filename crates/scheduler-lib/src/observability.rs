//! Observability infrastructure for the scheduler
//!
//! Prometheus metrics behind a process-wide handle, plus structured
//! logging for significant scheduling events.

use prometheus::{register_histogram, register_int_counter, register_int_gauge, Histogram, IntCounter, IntGauge};
use std::sync::OnceLock;
use tracing::info;

/// Histogram buckets for cycle latency (seconds).
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<SchedulerMetricsInner> = OnceLock::new();

struct SchedulerMetricsInner {
    cycle_latency_seconds: Histogram,
    schedulable_verdicts: IntCounter,
    unschedulable_verdicts: IntCounter,
    filter_errors: IntCounter,
    cycle_errors: IntCounter,
    nodes_tracked: IntGauge,
    pods_bound: IntGauge,
}

impl SchedulerMetricsInner {
    fn new() -> Self {
        Self {
            cycle_latency_seconds: register_histogram!(
                "pod_scheduler_cycle_latency_seconds",
                "Time spent on one scheduling cycle across all candidate nodes",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register cycle_latency_seconds"),

            schedulable_verdicts: register_int_counter!(
                "pod_scheduler_schedulable_verdicts_total",
                "Per-node filter verdicts that admitted the workload"
            )
            .expect("Failed to register schedulable_verdicts"),

            unschedulable_verdicts: register_int_counter!(
                "pod_scheduler_unschedulable_verdicts_total",
                "Per-node filter verdicts that rejected the workload"
            )
            .expect("Failed to register unschedulable_verdicts"),

            filter_errors: register_int_counter!(
                "pod_scheduler_filter_errors_total",
                "Per-node evaluations that failed before producing a verdict"
            )
            .expect("Failed to register filter_errors"),

            cycle_errors: register_int_counter!(
                "pod_scheduler_cycle_errors_total",
                "Scheduling cycles aborted during PreFilter"
            )
            .expect("Failed to register cycle_errors"),

            nodes_tracked: register_int_gauge!(
                "pod_scheduler_nodes_tracked",
                "Nodes currently present in the cluster cache"
            )
            .expect("Failed to register nodes_tracked"),

            pods_bound: register_int_gauge!(
                "pod_scheduler_pods_bound",
                "Pods currently bound across all cached nodes"
            )
            .expect("Failed to register pods_bound"),
        }
    }
}

/// Scheduler metrics for Prometheus exposition.
///
/// A lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct SchedulerMetrics {
    _private: (),
}

impl Default for SchedulerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerMetrics {
    /// Create a metrics handle (initializes global metrics if needed).
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(SchedulerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &SchedulerMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_cycle_latency(&self, duration_secs: f64) {
        self.inner().cycle_latency_seconds.observe(duration_secs);
    }

    pub fn inc_schedulable_verdicts(&self) {
        self.inner().schedulable_verdicts.inc();
    }

    pub fn inc_unschedulable_verdicts(&self) {
        self.inner().unschedulable_verdicts.inc();
    }

    pub fn inc_filter_errors(&self) {
        self.inner().filter_errors.inc();
    }

    pub fn inc_cycle_errors(&self) {
        self.inner().cycle_errors.inc();
    }

    pub fn set_cluster_size(&self, nodes: i64, pods: i64) {
        self.inner().nodes_tracked.set(nodes);
        self.inner().pods_bound.set(pods);
    }
}

/// Structured logger for scheduler lifecycle and placement events.
#[derive(Clone)]
pub struct EventLogger {
    scheduler_name: String,
}

impl EventLogger {
    pub fn new(scheduler_name: impl Into<String>) -> Self {
        Self {
            scheduler_name: scheduler_name.into(),
        }
    }

    pub fn log_startup(&self, version: &str, plugins: &[&str]) {
        info!(
            event = "scheduler_started",
            scheduler = %self.scheduler_name,
            version = %version,
            plugins = ?plugins,
            "Scheduler started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "scheduler_shutdown",
            scheduler = %self.scheduler_name,
            reason = %reason,
            "Scheduler shutting down"
        );
    }

    pub fn log_placement(&self, workload: &str, node: Option<&str>, feasible: usize) {
        match node {
            Some(node) => info!(
                event = "workload_placed",
                scheduler = %self.scheduler_name,
                workload = %workload,
                node = %node,
                feasible = feasible,
                "Workload bound to node"
            ),
            None => info!(
                event = "workload_unplaced",
                scheduler = %self.scheduler_name,
                workload = %workload,
                feasible = feasible,
                "No node selected for workload"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_handle_records_without_panic() {
        let metrics = SchedulerMetrics::new();

        metrics.observe_cycle_latency(0.002);
        metrics.inc_schedulable_verdicts();
        metrics.inc_unschedulable_verdicts();
        metrics.inc_filter_errors();
        metrics.inc_cycle_errors();
        metrics.set_cluster_size(3, 12);
    }

    #[test]
    fn test_event_logger_creation() {
        let logger = EventLogger::new("scheduler-0");
        assert_eq!(logger.scheduler_name, "scheduler-0");
    }
}
