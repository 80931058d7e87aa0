//! Resource accounting primitives
//!
//! A [`ResourceVector`] tracks the three core dimensions (CPU in
//! millicores, memory and ephemeral storage in bytes) plus an open set of
//! named scalar resources. Absent entries always mean zero demand.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Well-known resource name: CPU, measured in millicores.
pub const RESOURCE_CPU: &str = "cpu";
/// Well-known resource name: memory, measured in bytes.
pub const RESOURCE_MEMORY: &str = "memory";
/// Well-known resource name: ephemeral storage, measured in bytes.
pub const RESOURCE_EPHEMERAL_STORAGE: &str = "ephemeral-storage";
/// Pseudo-resource name used when reporting pod-count shortfalls.
pub const RESOURCE_PODS: &str = "pods";

/// Declared resource requests, keyed by resource name.
///
/// CPU values are millicores; memory and ephemeral storage are bytes.
/// Any other key is a scalar/extended resource with integer quantities.
pub type ResourceRequests = BTreeMap<String, i64>;

/// Aggregated resource quantities across the core and scalar dimensions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceVector {
    /// CPU in millicores
    #[serde(default)]
    pub milli_cpu: i64,
    /// Memory in bytes
    #[serde(default)]
    pub memory: i64,
    /// Ephemeral storage in bytes
    #[serde(default)]
    pub ephemeral_storage: i64,
    /// Named scalar/extended resources
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scalar: BTreeMap<String, i64>,
}

impl ResourceVector {
    /// Build a vector from a declared request map.
    pub fn from_requests(requests: &ResourceRequests) -> Self {
        let mut v = Self::default();
        v.add(requests);
        v
    }

    /// Element-wise addition of a request map. Zero quantities are
    /// skipped so they never materialize scalar entries.
    pub fn add(&mut self, requests: &ResourceRequests) {
        for (name, quantity) in requests {
            if *quantity == 0 {
                continue;
            }
            match name.as_str() {
                RESOURCE_CPU => self.milli_cpu += quantity,
                RESOURCE_MEMORY => self.memory += quantity,
                RESOURCE_EPHEMERAL_STORAGE => self.ephemeral_storage += quantity,
                _ => *self.scalar.entry(name.clone()).or_insert(0) += quantity,
            }
        }
    }

    /// Element-wise maximum against a request map. Dimensions absent
    /// from the map compare as zero and leave the vector unchanged.
    pub fn set_max(&mut self, requests: &ResourceRequests) {
        for (name, quantity) in requests {
            match name.as_str() {
                RESOURCE_CPU => self.milli_cpu = self.milli_cpu.max(*quantity),
                RESOURCE_MEMORY => self.memory = self.memory.max(*quantity),
                RESOURCE_EPHEMERAL_STORAGE => {
                    self.ephemeral_storage = self.ephemeral_storage.max(*quantity)
                }
                _ => {
                    if *quantity == 0 {
                        continue;
                    }
                    let entry = self.scalar.entry(name.clone()).or_insert(0);
                    *entry = (*entry).max(*quantity);
                }
            }
        }
    }

    /// Element-wise addition of another vector (cache bookkeeping when a
    /// pod is bound).
    pub fn accumulate(&mut self, other: &ResourceVector) {
        self.milli_cpu += other.milli_cpu;
        self.memory += other.memory;
        self.ephemeral_storage += other.ephemeral_storage;
        for (name, quantity) in &other.scalar {
            *self.scalar.entry(name.clone()).or_insert(0) += quantity;
        }
    }

    /// Element-wise subtraction of another vector (cache bookkeeping when
    /// a pod is removed). Scalar entries that reach zero are dropped.
    pub fn release(&mut self, other: &ResourceVector) {
        self.milli_cpu -= other.milli_cpu;
        self.memory -= other.memory;
        self.ephemeral_storage -= other.ephemeral_storage;
        for (name, quantity) in &other.scalar {
            if let Some(entry) = self.scalar.get_mut(name) {
                *entry -= quantity;
                if *entry == 0 {
                    self.scalar.remove(name);
                }
            }
        }
    }

    /// Named scalar quantity, zero when absent.
    pub fn scalar(&self, name: &str) -> i64 {
        self.scalar.get(name).copied().unwrap_or(0)
    }

    /// True when every dimension is zero. Used by the fit fast path.
    pub fn is_zero(&self) -> bool {
        self.milli_cpu == 0
            && self.memory == 0
            && self.ephemeral_storage == 0
            && self.scalar.is_empty()
    }
}
