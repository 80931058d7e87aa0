//! Workload resource profile computation

use crate::models::Workload;
use crate::resources::ResourceVector;

/// The resource demand of one workload, computed once per scheduling
/// cycle and read-only afterwards.
pub type WorkloadProfile = ResourceVector;

/// Compute the profile that covers the largest width in each resource
/// dimension. Regular containers run simultaneously, so their requests
/// are summed; init containers run sequentially and never overlap with
/// anything, so the true peak is the per-dimension max of the regular
/// sum against each init container.
///
/// When `count_overhead` is set and the workload declares an overhead
/// vector, it is added unconditionally on top of the result.
///
/// Example:
///
/// Workload:
///   init containers: IC1 {cpu: 2000, memory: 1G}, IC2 {cpu: 2000, memory: 3G}
///   containers:      C1  {cpu: 2000, memory: 1G}, C2  {cpu: 1000, memory: 1G}
///
/// Result: {cpu: 3000, memory: 3G}
pub fn compute_profile(workload: &Workload, count_overhead: bool) -> WorkloadProfile {
    let mut profile = WorkloadProfile::default();

    for container in &workload.containers {
        profile.add(&container.requests);
    }

    // take max_resource(sum_containers, any_init_container)
    for container in &workload.init_containers {
        profile.set_max(&container.requests);
    }

    if count_overhead {
        if let Some(overhead) = &workload.overhead {
            profile.add(overhead);
        }
    }

    profile
}
