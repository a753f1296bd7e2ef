//! Per-run configuration.
//!
//! A [`RunConfig`] starts from one of the reference presets and is
//! adjusted with builder-style setters. [`RunConfig::validate`] is
//! called before any run starts, so an invalid setup never produces a
//! partial result.

use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::{OffloadError, OffloadResult};
use crate::node::cloud::DEFAULT_CLOUD_DELAY;
use crate::node::edge::DEFAULT_EDGE_PROCESSING_TIME;
use crate::simulation::Horizon;
use crate::task::DEFAULT_TASK_SIZE;

/// Length of a reference run, in ticks.
pub const DEFAULT_SIM_TIME: u64 = 5000;

/// Ticks between two generated tasks in the reference setup.
pub const DEFAULT_ARRIVAL_PERIOD: u64 = 50;

// ── Scenario ──────────────────────────────────────────────────────────

/// The dispatch setup a run is labelled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, clap::ValueEnum)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "snake_case"))]
#[value(rename_all = "snake_case")]
pub enum Scenario {
    EdgeOnly,
    CloudOnly,
    Hybrid,
}

impl Scenario {
    /// Every scenario, in report order.
    pub const ALL: [Scenario; 3] = [Scenario::EdgeOnly, Scenario::CloudOnly, Scenario::Hybrid];

    /// Identifier accepted by `FromStr`.
    pub fn name(self) -> &'static str {
        match self {
            Scenario::EdgeOnly => "edge_only",
            Scenario::CloudOnly => "cloud_only",
            Scenario::Hybrid => "hybrid",
        }
    }

    /// Column heading used in reports.
    pub fn title(self) -> &'static str {
        match self {
            Scenario::EdgeOnly => "Edge-only",
            Scenario::CloudOnly => "Cloud-only",
            Scenario::Hybrid => "Hybrid",
        }
    }
}

impl FromStr for Scenario {
    type Err = OffloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::ALL
            .into_iter()
            .find(|sc| sc.name() == s)
            .ok_or_else(|| OffloadError::UnknownScenario(s.to_string()))
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ── Node specs ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct EdgeNodeSpec {
    pub name: String,
    pub capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct CloudSpec {
    pub name: String,
    pub delay: u64,
}

impl Default for CloudSpec {
    fn default() -> Self {
        CloudSpec {
            name: "Cloud".into(),
            delay: DEFAULT_CLOUD_DELAY,
        }
    }
}

// ── RunConfig ─────────────────────────────────────────────────────────

/// Everything one simulation run needs.
///
/// # Example
/// ```rust
/// use offload_sim::config::{RunConfig, Scenario};
///
/// let config = RunConfig::preset(Scenario::Hybrid)
///     .with_sim_time(2_000)
///     .serialize_arrivals(false);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.edge_nodes.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct RunConfig {
    pub scenario: Scenario,
    /// End time of the run.
    pub sim_time: u64,
    /// Edge nodes in selection order; ties on load go to the earlier one.
    pub edge_nodes: Vec<EdgeNodeSpec>,
    pub cloud: CloudSpec,
    pub arrival_period: u64,
    pub edge_processing_time: u64,
    pub task_size: u64,
    /// When `true` the generator waits for each dispatched task to
    /// complete before starting the next arrival period.
    pub serialize_arrivals: bool,
    pub horizon: Horizon,
}

impl RunConfig {
    /// The reference configuration for `scenario`.
    ///
    /// `edge_only` and `hybrid` both get two capacity-1 edge nodes and a
    /// cloud fallback; `cloud_only` has no edge nodes.
    pub fn preset(scenario: Scenario) -> Self {
        let edge_nodes = match scenario {
            Scenario::CloudOnly => Vec::new(),
            Scenario::EdgeOnly | Scenario::Hybrid => vec![
                EdgeNodeSpec {
                    name: "Edge1".into(),
                    capacity: 1,
                },
                EdgeNodeSpec {
                    name: "Edge2".into(),
                    capacity: 1,
                },
            ],
        };
        RunConfig {
            scenario,
            sim_time: DEFAULT_SIM_TIME,
            edge_nodes,
            cloud: CloudSpec::default(),
            arrival_period: DEFAULT_ARRIVAL_PERIOD,
            edge_processing_time: DEFAULT_EDGE_PROCESSING_TIME,
            task_size: DEFAULT_TASK_SIZE,
            serialize_arrivals: true,
            horizon: Horizon::default(),
        }
    }

    pub fn with_sim_time(mut self, sim_time: u64) -> Self {
        self.sim_time = sim_time;
        self
    }

    /// Append an edge node.
    pub fn with_edge(mut self, name: impl Into<String>, capacity: u32) -> Self {
        self.edge_nodes.push(EdgeNodeSpec {
            name: name.into(),
            capacity,
        });
        self
    }

    pub fn without_edges(mut self) -> Self {
        self.edge_nodes.clear();
        self
    }

    pub fn with_cloud(mut self, name: impl Into<String>, delay: u64) -> Self {
        self.cloud = CloudSpec {
            name: name.into(),
            delay,
        };
        self
    }

    pub fn with_arrival_period(mut self, period: u64) -> Self {
        self.arrival_period = period;
        self
    }

    pub fn with_edge_processing_time(mut self, ticks: u64) -> Self {
        self.edge_processing_time = ticks;
        self
    }

    pub fn with_task_size(mut self, size: u64) -> Self {
        self.task_size = size;
        self
    }

    pub fn serialize_arrivals(mut self, on: bool) -> Self {
        self.serialize_arrivals = on;
        self
    }

    pub fn with_horizon(mut self, horizon: Horizon) -> Self {
        self.horizon = horizon;
        self
    }

    /// Check the configuration before a run.
    pub fn validate(&self) -> OffloadResult<()> {
        if self.arrival_period == 0 {
            return Err(OffloadError::ZeroArrivalPeriod);
        }
        let mut names = BTreeSet::new();
        for edge in &self.edge_nodes {
            if edge.capacity == 0 {
                return Err(OffloadError::InvalidCapacity {
                    node: edge.name.clone(),
                    capacity: 0,
                });
            }
            if !names.insert(edge.name.as_str()) {
                return Err(OffloadError::DuplicateNode(edge.name.clone()));
            }
        }
        if !names.insert(self.cloud.name.as_str()) {
            return Err(OffloadError::DuplicateNode(self.cloud.name.clone()));
        }

        // Every wake-up is scheduled from an instant no later than sim_time.
        for (field, value) in [
            ("arrival_period", self.arrival_period),
            ("edge_processing_time", self.edge_processing_time),
            ("cloud.delay", self.cloud.delay),
        ] {
            if self.sim_time.checked_add(value).is_none() {
                return Err(OffloadError::TimeOverflow {
                    field,
                    value,
                    sim_time: self.sim_time,
                });
            }
        }
        Ok(())
    }
}

/// Convert a signed duration from user input, rejecting negatives.
pub fn non_negative(field: &'static str, value: i64) -> OffloadResult<u64> {
    u64::try_from(value).map_err(|_| OffloadError::NegativeDuration { field, value })
}

/// Convert a signed capacity from user input, rejecting values below one.
pub fn positive_capacity(node: &str, capacity: i64) -> OffloadResult<u32> {
    match u32::try_from(capacity) {
        Ok(c) if c >= 1 => Ok(c),
        _ => Err(OffloadError::InvalidCapacity {
            node: node.to_string(),
            capacity,
        }),
    }
}

// ── JSON loading ──────────────────────────────────────────────────────

#[cfg(feature = "serialize")]
mod json {
    use serde::Deserialize;

    use super::*;

    /// On-disk shape of a run. Numbers are signed so that negative input
    /// is reported as a configuration error rather than a parse error.
    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub(super) struct RawRunConfig {
        scenario: String,
        sim_time: Option<i64>,
        edge_nodes: Option<Vec<RawEdgeSpec>>,
        cloud: Option<RawCloudSpec>,
        arrival_period: Option<i64>,
        edge_processing_time: Option<i64>,
        task_size: Option<i64>,
        serialize_arrivals: Option<bool>,
        horizon: Option<Horizon>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct RawEdgeSpec {
        name: String,
        capacity: i64,
    }

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct RawCloudSpec {
        name: Option<String>,
        delay: Option<i64>,
    }

    /// Either one run or a list of runs.
    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    pub(super) enum RawDocument {
        One(RawRunConfig),
        Many(Vec<RawRunConfig>),
    }

    impl RawRunConfig {
        /// Fill unset fields from the scenario preset, then validate.
        pub(super) fn into_config(self) -> OffloadResult<RunConfig> {
            let scenario: Scenario = self.scenario.parse()?;
            let mut config = RunConfig::preset(scenario);

            if let Some(v) = self.sim_time {
                config.sim_time = non_negative("sim_time", v)?;
            }
            if let Some(edges) = self.edge_nodes {
                config.edge_nodes = edges
                    .into_iter()
                    .map(|e| -> OffloadResult<EdgeNodeSpec> {
                        let capacity = positive_capacity(&e.name, e.capacity)?;
                        Ok(EdgeNodeSpec {
                            name: e.name,
                            capacity,
                        })
                    })
                    .collect::<OffloadResult<Vec<_>>>()?;
            }
            if let Some(cloud) = self.cloud {
                if let Some(name) = cloud.name {
                    config.cloud.name = name;
                }
                if let Some(delay) = cloud.delay {
                    config.cloud.delay = non_negative("cloud.delay", delay)?;
                }
            }
            if let Some(v) = self.arrival_period {
                config.arrival_period = non_negative("arrival_period", v)?;
            }
            if let Some(v) = self.edge_processing_time {
                config.edge_processing_time = non_negative("edge_processing_time", v)?;
            }
            if let Some(v) = self.task_size {
                config.task_size = non_negative("task_size", v)?;
            }
            if let Some(v) = self.serialize_arrivals {
                config.serialize_arrivals = v;
            }
            if let Some(h) = self.horizon {
                config.horizon = h;
            }

            config.validate()?;
            Ok(config)
        }
    }
}

#[cfg(feature = "serialize")]
impl RunConfig {
    /// Parse a single run from JSON. Missing fields take the values of
    /// the named scenario's preset.
    pub fn from_json_str(s: &str) -> OffloadResult<Self> {
        let raw: json::RawRunConfig =
            serde_json::from_str(s).map_err(|e| OffloadError::InvalidConfig(e.to_string()))?;
        raw.into_config()
    }

    /// Parse a JSON document holding either one run or a list of runs.
    pub fn list_from_json_str(s: &str) -> OffloadResult<Vec<Self>> {
        let doc: json::RawDocument =
            serde_json::from_str(s).map_err(|e| OffloadError::InvalidConfig(e.to_string()))?;
        match doc {
            json::RawDocument::One(raw) => Ok(vec![raw.into_config()?]),
            json::RawDocument::Many(raws) => raws.into_iter().map(|r| r.into_config()).collect(),
        }
    }

    /// Read a single run from a JSON file.
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> OffloadResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn list_from_json_file(path: impl AsRef<std::path::Path>) -> OffloadResult<Vec<Self>> {
        let text = std::fs::read_to_string(path)?;
        Self::list_from_json_str(&text)
    }
}
