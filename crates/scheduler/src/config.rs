//! Scheduler configuration

use anyhow::Result;
use serde::Deserialize;

/// Scheduler configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Name reported in logs and placement events
    #[serde(default = "default_scheduler_name")]
    pub scheduler_name: String,

    /// API server port for scheduling, health and metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// How long a preemption reservation marker stays active, in seconds
    #[serde(default = "default_reservation_validity")]
    pub reservation_validity_secs: u64,

    /// Comma-separated scalar resource names excluded from fit checks
    #[serde(default)]
    pub ignored_resources: String,

    /// Whether workload overhead counts toward the resource profile
    #[serde(default = "default_count_overhead")]
    pub count_overhead: bool,
}

fn default_scheduler_name() -> String {
    "pod-scheduler".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_reservation_validity() -> u64 {
    60
}

fn default_count_overhead() -> bool {
    true
}

impl SchedulerConfig {
    /// Load configuration from environment variables prefixed with `SCHEDULER`
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("SCHEDULER"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| SchedulerConfig {
            scheduler_name: default_scheduler_name(),
            api_port: default_api_port(),
            reservation_validity_secs: default_reservation_validity(),
            ignored_resources: String::new(),
            count_overhead: default_count_overhead(),
        }))
    }

    /// Parsed ignore list, with empty entries dropped.
    pub fn ignored_resource_names(&self) -> Vec<String> {
        self.ignored_resources
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}
