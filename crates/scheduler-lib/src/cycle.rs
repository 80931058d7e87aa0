//! Per-cycle context handed from PreFilter to Filter
//!
//! One scheduling cycle is one attempt to place one workload. PreFilter
//! computes the workload profile exactly once; every subsequent Filter
//! call for that cycle reads it back without recomputation. The context
//! is dropped when the cycle ends, so nothing leaks across attempts.

use crate::error::SchedulerError;
use crate::profile::WorkloadProfile;
use std::sync::OnceLock;

/// Write-once, read-many carrier for the cycle's computed profile.
///
/// Backed by a `OnceLock` so the PreFilter write is a synchronized
/// handoff: Filter calls for different nodes may run on other threads and
/// still observe the complete profile, never a partial one.
#[derive(Debug, Default)]
pub struct CycleContext {
    profile: OnceLock<WorkloadProfile>,
}

impl CycleContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the computed profile. A second write is a protocol
    /// violation and aborts the cycle rather than replacing the profile.
    pub fn set_profile(&self, profile: WorkloadProfile) -> Result<(), SchedulerError> {
        self.profile
            .set(profile)
            .map_err(|_| SchedulerError::ProfileConflict)
    }

    /// Read the profile computed by PreFilter. A missing profile means
    /// Filter ran before PreFilter; that is fatal to the current call and
    /// must not be treated as zero demand.
    pub fn profile(&self) -> Result<&WorkloadProfile, SchedulerError> {
        self.profile
            .get()
            .ok_or(SchedulerError::ProfileNotComputed)
    }
}
