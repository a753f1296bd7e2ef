//! Structured error types for the offloading simulator.
//!
//! Fallible public APIs return `Result<T, OffloadError>`. Configuration
//! problems are reported here before a run starts; violations of engine
//! invariants (oversubscribing an edge node, time going backward) are
//! programming errors and panic instead.

use thiserror::Error;

use crate::config::Scenario;

/// The top-level error type.
#[derive(Debug, Error)]
pub enum OffloadError {
    // ── Configuration errors ──────────────────────────────

    /// Scenario name not one of `edge_only`, `cloud_only`, `hybrid`.
    #[error("unknown scenario `{0}` (expected edge_only, cloud_only or hybrid)")]
    UnknownScenario(String),

    /// An edge node was configured with capacity below one.
    #[error("edge node `{node}` has invalid capacity {capacity} (must be at least 1)")]
    InvalidCapacity { node: String, capacity: i64 },

    /// A duration setting was negative.
    #[error("{field} must not be negative, got {value}")]
    NegativeDuration { field: &'static str, value: i64 },

    /// The arrival period was zero, which would generate tasks forever
    /// without the clock moving.
    #[error("arrival period must be greater than zero")]
    ZeroArrivalPeriod,

    /// A duration added to the end time does not fit the clock.
    #[error("sim_time {sim_time} plus {field} {value} overflows virtual time")]
    TimeOverflow {
        field: &'static str,
        value: u64,
        sim_time: u64,
    },

    /// Two nodes share a name.
    #[error("node name `{0}` is used more than once")]
    DuplicateNode(String),

    /// Two runs in one batch are for the same scenario.
    #[error("scenario `{0}` appears more than once in one batch")]
    DuplicateScenario(Scenario),

    /// A configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Export errors ─────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias for `Result<T, OffloadError>`.
pub type OffloadResult<T> = Result<T, OffloadError>;
