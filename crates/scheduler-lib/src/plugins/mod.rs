//! Scheduling extension points
//!
//! Plugins participate in two stages of a cycle: PreFilter runs once per
//! workload, Filter runs once per candidate node and may only run after
//! PreFilter. The plugin set is closed: every plugin is a variant of
//! [`SchedulerPlugin`], resolved at start-up into an ordered [`Pipeline`].

mod resource_fit;

pub use resource_fit::{InsufficientResource, ResourceFit, RESOURCE_FIT_NAME};

use crate::cache::NodeSnapshot;
use crate::cycle::CycleContext;
use crate::error::SchedulerError;
use crate::models::Workload;

/// Terminal outcome of evaluating one node. A plugin failure is not an
/// outcome: it surfaces as `Err(SchedulerError)` and means the fit could
/// not be determined, which the framework treats differently from a
/// determined non-fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    /// The node can host the workload.
    Schedulable,
    /// The node was evaluated and rejected, with one reason per violated
    /// dimension.
    Unschedulable { reasons: Vec<String> },
}

impl FilterOutcome {
    pub fn is_schedulable(&self) -> bool {
        matches!(self, FilterOutcome::Schedulable)
    }
}

/// Computes per-cycle state before any node is evaluated.
pub trait PreFilterPlugin {
    /// Runs exactly once per cycle. An error aborts the cycle for this
    /// workload; no partial state may remain in the context.
    fn pre_filter(&self, cycle: &CycleContext, workload: &Workload)
        -> Result<(), SchedulerError>;
}

/// Decides whether one candidate node can host the workload.
pub trait FilterPlugin {
    /// May run many times per cycle, once per candidate node, and only
    /// after `pre_filter` completed.
    fn filter(
        &self,
        cycle: &CycleContext,
        workload: &Workload,
        snapshot: &NodeSnapshot,
    ) -> Result<FilterOutcome, SchedulerError>;
}

/// Closed set of plugins known to the scheduler.
pub enum SchedulerPlugin {
    ResourceFit(ResourceFit),
}

impl SchedulerPlugin {
    /// Registered name of the plugin, stable across cycles.
    pub fn name(&self) -> &'static str {
        match self {
            SchedulerPlugin::ResourceFit(_) => resource_fit::RESOURCE_FIT_NAME,
        }
    }

    pub fn pre_filter(
        &self,
        cycle: &CycleContext,
        workload: &Workload,
    ) -> Result<(), SchedulerError> {
        match self {
            SchedulerPlugin::ResourceFit(p) => p.pre_filter(cycle, workload),
        }
    }

    pub fn filter(
        &self,
        cycle: &CycleContext,
        workload: &Workload,
        snapshot: &NodeSnapshot,
    ) -> Result<FilterOutcome, SchedulerError> {
        match self {
            SchedulerPlugin::ResourceFit(p) => p.filter(cycle, workload, snapshot),
        }
    }
}

/// Ordered plugin pipeline resolved at start-up.
pub struct Pipeline {
    plugins: Vec<SchedulerPlugin>,
}

impl Pipeline {
    pub fn new(plugins: Vec<SchedulerPlugin>) -> Self {
        Self { plugins }
    }

    pub fn plugin_names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Run every PreFilter in order. The first error aborts the cycle.
    pub fn run_pre_filter(
        &self,
        cycle: &CycleContext,
        workload: &Workload,
    ) -> Result<(), SchedulerError> {
        for plugin in &self.plugins {
            plugin.pre_filter(cycle, workload)?;
        }
        Ok(())
    }

    /// Run Filters in order against one node. The first unschedulable
    /// verdict is final; its reasons are returned as-is.
    pub fn run_filter(
        &self,
        cycle: &CycleContext,
        workload: &Workload,
        snapshot: &NodeSnapshot,
    ) -> Result<FilterOutcome, SchedulerError> {
        for plugin in &self.plugins {
            match plugin.filter(cycle, workload, snapshot)? {
                FilterOutcome::Schedulable => continue,
                unschedulable => return Ok(unschedulable),
            }
        }
        Ok(FilterOutcome::Schedulable)
    }
}
