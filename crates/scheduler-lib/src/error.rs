//! Error types for the scheduling core

use thiserror::Error;

/// Errors surfaced by the scheduling core.
///
/// `ProfileNotComputed` and `ProfileConflict` are ordering violations of
/// the PreFilter/Filter protocol; they abort the current call but never
/// the process. Cache errors are returned to the framework unchanged so
/// it can distinguish "could not evaluate" from "evaluated and rejected".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// Filter ran before PreFilter recorded the workload profile.
    #[error("workload profile missing from cycle context; PreFilter was not invoked")]
    ProfileNotComputed,

    /// PreFilter ran twice for the same cycle.
    #[error("workload profile already recorded for this cycle")]
    ProfileConflict,

    /// The cluster cache has no entry for the requested node.
    #[error("node {0} not found in cluster cache")]
    NodeNotFound(String),

    /// Attempted to add a node that is already cached.
    #[error("node {0} already exists in cluster cache")]
    NodeAlreadyExists(String),

    /// Attempted to bind a pod that is already bound to the node.
    #[error("pod {pod} is already bound to node {node}")]
    PodAlreadyBound { node: String, pod: String },

    /// The pod is not bound to the given node.
    #[error("pod {pod} is not bound to node {node}")]
    PodNotBound { node: String, pod: String },
}
