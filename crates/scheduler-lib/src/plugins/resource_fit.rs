//! Node resource fit plugin
//!
//! Checks whether a node has sufficient cpu, memory, ephemeral storage,
//! pod slots and scalar resources to host a workload, counting both the
//! capacity already committed to bound pods and the capacity held by
//! still-active preemption reservations published by other schedulers.

use crate::cache::NodeSnapshot;
use crate::cycle::CycleContext;
use crate::error::SchedulerError;
use crate::models::Workload;
use crate::plugins::{FilterOutcome, FilterPlugin, PreFilterPlugin};
use crate::profile::{compute_profile, WorkloadProfile};
use crate::reservation::ReservationPolicy;
use crate::resources::{
    ResourceVector, RESOURCE_CPU, RESOURCE_EPHEMERAL_STORAGE, RESOURCE_MEMORY, RESOURCE_PODS,
};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Stable plugin name used for registration and logging.
pub const RESOURCE_FIT_NAME: &str = "NodeResourcesFit";

/// One line item of a rejection verdict.
///
/// The reason is a fixed string for the common resources so verdicts can
/// be counted and compared without formatting on the fly.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct InsufficientResource {
    pub resource: String,
    pub reason: String,
    pub requested: i64,
    pub used: i64,
    pub capacity: i64,
}

/// Plugin that checks if a node has sufficient resources.
pub struct ResourceFit {
    ignored_resources: HashSet<String>,
    policy: ReservationPolicy,
    count_overhead: bool,
}

impl ResourceFit {
    pub fn new(
        ignored_resources: impl IntoIterator<Item = String>,
        policy: ReservationPolicy,
        count_overhead: bool,
    ) -> Self {
        Self {
            ignored_resources: ignored_resources.into_iter().collect(),
            policy,
            count_overhead,
        }
    }

    /// Evaluate a profile against a snapshot at a fixed instant. `now`
    /// is sampled once by the caller and reused for every marker so the
    /// verdict is reproducible for identical inputs.
    pub fn evaluate(
        &self,
        profile: &WorkloadProfile,
        snapshot: &NodeSnapshot,
        now: DateTime<Utc>,
    ) -> Vec<InsufficientResource> {
        let reserved = self.policy.reserved(&snapshot.conditions, now);
        fits_request(profile, snapshot, &self.ignored_resources, &reserved)
    }
}

impl PreFilterPlugin for ResourceFit {
    fn pre_filter(
        &self,
        cycle: &CycleContext,
        workload: &Workload,
    ) -> Result<(), SchedulerError> {
        cycle.set_profile(compute_profile(workload, self.count_overhead))
    }
}

impl FilterPlugin for ResourceFit {
    fn filter(
        &self,
        cycle: &CycleContext,
        _workload: &Workload,
        snapshot: &NodeSnapshot,
    ) -> Result<FilterOutcome, SchedulerError> {
        let profile = cycle.profile()?;
        let insufficient = self.evaluate(profile, snapshot, Utc::now());

        if insufficient.is_empty() {
            Ok(FilterOutcome::Schedulable)
        } else {
            // Keep all failure reasons, one per violated dimension.
            Ok(FilterOutcome::Unschedulable {
                reasons: insufficient.into_iter().map(|r| r.reason).collect(),
            })
        }
    }
}

/// Check whether the node has enough headroom for the profile, counting
/// capacity held by active reservations. Returns one item per violated
/// dimension; an empty result means the workload fits.
fn fits_request(
    profile: &WorkloadProfile,
    snapshot: &NodeSnapshot,
    ignored_resources: &HashSet<String>,
    reserved: &ResourceVector,
) -> Vec<InsufficientResource> {
    let mut insufficient = Vec::with_capacity(4);

    if snapshot.pod_count as i64 + 1 > snapshot.allowed_pods {
        insufficient.push(InsufficientResource {
            resource: RESOURCE_PODS.to_string(),
            reason: "Too many pods".to_string(),
            requested: 1,
            used: snapshot.pod_count as i64,
            capacity: snapshot.allowed_pods,
        });
    }

    // Zero-demand fast path: nothing left to violate.
    if profile.is_zero() {
        return insufficient;
    }

    if snapshot.allocatable.milli_cpu
        < profile.milli_cpu + snapshot.requested.milli_cpu + reserved.milli_cpu
    {
        insufficient.push(InsufficientResource {
            resource: RESOURCE_CPU.to_string(),
            reason: "Insufficient cpu".to_string(),
            requested: profile.milli_cpu,
            used: snapshot.requested.milli_cpu,
            capacity: snapshot.allocatable.milli_cpu,
        });
    }
    if snapshot.allocatable.memory < profile.memory + snapshot.requested.memory + reserved.memory {
        insufficient.push(InsufficientResource {
            resource: RESOURCE_MEMORY.to_string(),
            reason: "Insufficient memory".to_string(),
            requested: profile.memory,
            used: snapshot.requested.memory,
            capacity: snapshot.allocatable.memory,
        });
    }
    if snapshot.allocatable.ephemeral_storage
        < profile.ephemeral_storage
            + snapshot.requested.ephemeral_storage
            + reserved.ephemeral_storage
    {
        insufficient.push(InsufficientResource {
            resource: RESOURCE_EPHEMERAL_STORAGE.to_string(),
            reason: "Insufficient ephemeral-storage".to_string(),
            requested: profile.ephemeral_storage,
            used: snapshot.requested.ephemeral_storage,
            capacity: snapshot.allocatable.ephemeral_storage,
        });
    }

    // Reservations cover only the core dimensions; scalar resources are
    // checked without them.
    for (name, quantity) in &profile.scalar {
        if ignored_resources.contains(name) {
            continue;
        }
        if snapshot.allocatable.scalar(name) < quantity + snapshot.requested.scalar(name) {
            insufficient.push(InsufficientResource {
                resource: name.clone(),
                reason: format!("Insufficient {}", name),
                requested: *quantity,
                used: snapshot.requested.scalar(name),
                capacity: snapshot.allocatable.scalar(name),
            });
        }
    }

    insufficient
}
