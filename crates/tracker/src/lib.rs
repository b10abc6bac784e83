//! The appearance tracker (§4.8-§4.10): per-minute binary attendance
//! counters, rotation, rolling history, context indexing, and aggregate
//! persistence on session end.

pub mod error;
pub mod minute;
pub mod persist;
pub mod registry;

pub use error::{TrackerError, TrackerResult};
pub use minute::MinuteTracker;
pub use persist::{compute_aggregate, persist_ended_sessions, Aggregate};
pub use registry::{RuleTracker, SessionTracker, TrackerRegistry};

/// Context-key construction (§4.9) lives in `warden_core::context_key` since
/// the cache's change handlers never need it and the tracker does — kept in
/// `core` rather than duplicated here so both this crate and any future
/// consumer share one canonical implementation.
pub use warden_core::context_key;
