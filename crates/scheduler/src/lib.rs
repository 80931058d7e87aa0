//! Pod scheduler service internals
//!
//! Exposed as a library so integration tests can drive the real router.

pub mod api;
pub mod config;
