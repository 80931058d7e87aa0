//! Scheduler library for pod placement decisions
//!
//! This crate provides the core functionality for:
//! - Workload resource profile computation
//! - Node fit evaluation with preemption-reservation accounting
//! - The PreFilter/Filter plugin pipeline and per-cycle context
//! - A concurrent cluster cache handing out immutable node snapshots
//! - Health checks and observability

pub mod cache;
pub mod cycle;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod plugins;
pub mod profile;
pub mod reservation;
pub mod resources;
pub mod scheduler;

pub use cache::{ClusterCache, NodeSnapshot};
pub use cycle::CycleContext;
pub use error::SchedulerError;
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{EventLogger, SchedulerMetrics};
pub use plugins::{FilterOutcome, Pipeline, ResourceFit, SchedulerPlugin};
pub use profile::{compute_profile, WorkloadProfile};
pub use reservation::ReservationPolicy;
pub use resources::{ResourceRequests, ResourceVector};
pub use scheduler::{ScheduleResult, Scheduler};
