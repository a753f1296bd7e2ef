//! Running configured scenarios end to end.
//!
//! [`run_scenario`] validates a [`RunConfig`], builds the cluster, starts
//! the task generator at time zero and drives the simulation up to the
//! configured end time. The returned [`RunReport`] owns the run's
//! completion records.

use std::collections::btree_map::{BTreeMap, Entry};

use tracing::info;

use crate::config::{RunConfig, Scenario};
use crate::dispatch::{Cluster, TaskGenerator};
use crate::error::{OffloadError, OffloadResult};
use crate::node::{CloudNode, ComputeNode, EdgeNode};
use crate::simulation::Simulation;
use crate::sink::ResultSink;
use crate::time::VirtualTime;

// ── RunReport ─────────────────────────────────────────────────────────

/// Outcome of one simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct RunReport {
    pub scenario: Scenario,
    /// Completion records in completion order.
    pub records: ResultSink,
    pub tasks_generated: u64,
    /// Lifetime load of each edge node, in configured order.
    pub edge_loads: Vec<(String, u64)>,
    /// The configured end time.
    pub end_time: VirtualTime,
    /// Processing activities still suspended when the run stopped.
    pub in_flight: usize,
}

impl RunReport {
    /// Tasks generated but still in flight when the run stopped.
    pub fn truncated_tasks(&self) -> u64 {
        self.tasks_generated - self.records.len() as u64
    }
}

// ── Entry points ──────────────────────────────────────────────────────

/// Run one configuration to its end time.
///
/// # Example
/// ```rust
/// use offload_sim::config::{RunConfig, Scenario};
/// use offload_sim::runner::run_scenario;
///
/// let config = RunConfig::preset(Scenario::CloudOnly).with_sim_time(1_000);
/// let report = run_scenario(&config).unwrap();
/// assert!(report.records.iter().all(|r| r.processed_by == "Cloud" && r.latency == 300));
/// ```
pub fn run_scenario(config: &RunConfig) -> OffloadResult<RunReport> {
    config.validate()?;

    let edges = config
        .edge_nodes
        .iter()
        .map(|spec| EdgeNode::new(spec.name.clone(), spec.capacity, config.edge_processing_time))
        .collect();
    let cloud = CloudNode::new(config.cloud.name.clone(), config.cloud.delay);

    info!(
        scenario = %config.scenario,
        sim_time = config.sim_time,
        edge_nodes = config.edge_nodes.len(),
        serialize_arrivals = config.serialize_arrivals,
        "starting run"
    );

    let mut sim = Simulation::new(Cluster::new(edges, cloud));
    sim.spawn(Box::new(TaskGenerator::new(
        config.arrival_period,
        config.task_size,
        config.serialize_arrivals,
    )));
    let end = VirtualTime::new(config.sim_time);
    let resumptions = sim.run_to(end, config.horizon);
    // The generator never finishes; everything else live is a task.
    let in_flight = sim.live_activities().saturating_sub(1);

    let cluster = sim.into_world();
    let report = RunReport {
        scenario: config.scenario,
        tasks_generated: cluster.tasks_generated(),
        edge_loads: cluster
            .edges
            .iter()
            .map(|e| (e.name().to_string(), e.load()))
            .collect(),
        records: cluster.sink,
        end_time: end,
        in_flight,
    };

    info!(
        scenario = %report.scenario,
        resumptions,
        generated = report.tasks_generated,
        completed = report.records.len(),
        in_flight = report.in_flight,
        "run finished"
    );
    Ok(report)
}

/// Run several configurations, keyed by scenario.
///
/// Every configuration is validated before the first run starts; a
/// scenario listed twice is rejected.
pub fn run_scenarios(configs: &[RunConfig]) -> OffloadResult<BTreeMap<Scenario, RunReport>> {
    let mut by_scenario = BTreeMap::new();
    for config in configs {
        config.validate()?;
        match by_scenario.entry(config.scenario) {
            Entry::Occupied(_) => return Err(OffloadError::DuplicateScenario(config.scenario)),
            Entry::Vacant(slot) => {
                slot.insert(config);
            }
        }
    }

    let mut reports = BTreeMap::new();
    for (scenario, config) in by_scenario {
        reports.insert(scenario, run_scenario(config)?);
    }
    Ok(reports)
}

/// Run the three reference presets with the given end time.
pub fn run_all_scenarios(sim_time: u64) -> OffloadResult<BTreeMap<Scenario, RunReport>> {
    let configs: Vec<RunConfig> = Scenario::ALL
        .into_iter()
        .map(|sc| RunConfig::preset(sc).with_sim_time(sim_time))
        .collect();
    run_scenarios(&configs)
}
