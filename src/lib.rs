//! # offload-sim — Deterministic Edge/Cloud Offloading Simulator
//!
//! Compares latency and load distribution when computational tasks are
//! dispatched to capacity-bound edge nodes, an unbounded cloud node, or
//! edge-first with cloud fallback. No async, no threads, no wall-clock
//! time: activities are small state machines resumed by a virtual clock.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────┐
//! │  runner / report           │ ← scenarios in, summaries and CSV out
//! │  ┌─────────────────────┐  │
//! │  │  dispatch           │  │ ← generator, least-load selection,
//! │  │  (Cluster world)    │  │   processing activities
//! │  │  ┌───────────────┐  │  │
//! │  │  │  Simulation   │  │  │ ← clock, spawn/join, run_until
//! │  │  │  ┌─────────┐  │  │  │
//! │  │  │  │Scheduler│  │  │  │ ← (time, id) min-heap of wake-ups
//! │  │  │  └─────────┘  │  │  │
//! │  │  └───────────────┘  │  │
//! │  └─────────────────────┘  │
//! └───────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use offload_sim::{run_scenario, RunConfig, Scenario, ServiceTier};
//!
//! let config = RunConfig::preset(Scenario::EdgeOnly)
//!     .without_edges()
//!     .with_edge("Edge1", 1)
//!     .with_sim_time(500);
//! let report = run_scenario(&config).unwrap();
//!
//! // Task 0 arrives at 50 and completes at 250; task 1 would finish at 500,
//! // which the default exclusive end time cuts off.
//! assert_eq!(report.records.len(), 1);
//! assert_eq!(report.records.records()[0].latency, 200);
//! assert_eq!(report.records.records()[0].service_tier, ServiceTier::Partial);
//! ```

pub mod activity;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod node;
pub mod report;
pub mod runner;
pub mod scheduler;
pub mod simulation;
pub mod sink;
pub mod task;
pub mod time;

// Re-exports for convenience.
pub use activity::{Activity, ActivityId, Step};
pub use config::{CloudSpec, EdgeNodeSpec, RunConfig, Scenario};
pub use dispatch::{select_node, Cluster, Processing, TaskGenerator};
pub use error::{OffloadError, OffloadResult};
pub use event::{Event, EventId, EventIdGen, EventType};
pub use node::{CloudNode, ComputeNode, EdgeNode, NodeRef, ServiceTier};
pub use report::{average_latency, tasks_by_node, ComparisonTable, ScenarioSummary};
pub use runner::{run_all_scenarios, run_scenario, run_scenarios, RunReport};
pub use scheduler::Scheduler;
pub use simulation::{Horizon, Simulation, SimulationContext};
pub use sink::{CompletionRecord, ResultSink};
pub use task::Task;
pub use time::VirtualTime;
