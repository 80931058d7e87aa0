//! CLI command implementations

pub mod nodes;
pub mod schedule;
pub mod status;
