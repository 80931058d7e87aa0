//! Preemption-reservation decay
//!
//! Concurrent schedulers publish speculative holds on node capacity as
//! `Preemption` conditions: a preemption decision has freed resources but
//! the eviction has not completed, so the freed amount must not be handed
//! out twice. Holds are soft leases: the producer refreshes the condition
//! heartbeat while the hold is valid, and consumers ignore any hold whose
//! heartbeat is older than the validity window. Nothing ever deletes a
//! marker; staleness is the only removal mechanism.

use crate::models::NodeCondition;
use crate::resources::ResourceVector;
use chrono::{DateTime, Duration, Utc};

/// Condition type tag identifying a preemption reservation.
pub const RESERVATION_CONDITION_TYPE: &str = "Preemption";

/// Default validity window for an unrefreshed reservation, in seconds.
pub const DEFAULT_VALIDITY_WINDOW_SECS: i64 = 60;

/// Parse a reservation payload of exactly three comma-separated integers
/// `cpu,memory,storage`. A field that fails to parse degrades to 0; a
/// payload that does not split into exactly three fields is `(0, 0, 0)`.
pub fn parse_reservation_payload(payload: &str) -> (i64, i64, i64) {
    let fields: Vec<&str> = payload.split(',').collect();
    if fields.len() != 3 {
        return (0, 0, 0);
    }

    let cpu = fields[0].parse::<i64>().unwrap_or(0);
    let memory = fields[1].parse::<i64>().unwrap_or(0);
    let storage = fields[2].parse::<i64>().unwrap_or(0);

    (cpu, memory, storage)
}

/// Time-decay policy for reservation markers.
#[derive(Debug, Clone)]
pub struct ReservationPolicy {
    validity_window: Duration,
}

impl Default for ReservationPolicy {
    fn default() -> Self {
        Self {
            validity_window: Duration::seconds(DEFAULT_VALIDITY_WINDOW_SECS),
        }
    }
}

impl ReservationPolicy {
    pub fn new(validity_window: Duration) -> Self {
        Self { validity_window }
    }

    pub fn from_secs(secs: i64) -> Self {
        Self::new(Duration::seconds(secs))
    }

    /// A marker is active iff `now - last_heartbeat < validity_window`.
    /// A marker aged exactly to the window is expired (strict `<`).
    pub fn is_active(&self, condition: &NodeCondition, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(condition.last_heartbeat) < self.validity_window
    }

    /// Aggregate the capacity held by markers still inside the validity
    /// window. Only the three core dimensions participate; extended
    /// resources are not covered by the reservation protocol. Expired
    /// markers are skipped with no side effect.
    pub fn reserved(&self, conditions: &[NodeCondition], now: DateTime<Utc>) -> ResourceVector {
        let mut total = ResourceVector::default();

        for condition in conditions {
            if condition.condition_type != RESERVATION_CONDITION_TYPE {
                continue;
            }
            if !self.is_active(condition, now) {
                continue;
            }

            let (cpu, memory, storage) = parse_reservation_payload(&condition.reason);
            total.milli_cpu += cpu;
            total.memory += memory;
            total.ephemeral_storage += storage;
        }

        total
    }
}
