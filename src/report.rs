//! Aggregation and export of run results.
//!
//! Consumes [`RunReport`]s and turns them into per-scenario summaries,
//! a side-by-side comparison table, and CSV/JSON exports.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};
use std::path::Path;

use crate::config::Scenario;
use crate::error::OffloadResult;
use crate::runner::RunReport;
use crate::sink::CompletionRecord;

/// Mean latency over `records`, or `None` when there are none.
pub fn average_latency<'a, I>(records: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a CompletionRecord>,
{
    let (sum, count) = records
        .into_iter()
        .fold((0u128, 0u64), |(s, n), r| (s + r.latency as u128, n + 1));
    (count > 0).then(|| sum as f64 / count as f64)
}

/// Number of completed tasks per processing node.
pub fn tasks_by_node<'a, I>(records: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a CompletionRecord>,
{
    let mut counts = BTreeMap::new();
    for r in records {
        *counts.entry(r.processed_by.clone()).or_insert(0) += 1;
    }
    counts
}

/// Quote a CSV field when it contains a separator, quote or line break.
fn csv_field(s: &str) -> Cow<'_, str> {
    if s.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", s.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(s)
    }
}

// ── ScenarioSummary ───────────────────────────────────────────────────

/// Headline numbers for one run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct ScenarioSummary {
    pub scenario: Scenario,
    pub tasks_generated: u64,
    pub completed: usize,
    pub truncated: u64,
    pub average_latency: Option<f64>,
    pub by_node: BTreeMap<String, usize>,
}

impl ScenarioSummary {
    pub fn from_report(report: &RunReport) -> Self {
        ScenarioSummary {
            scenario: report.scenario,
            tasks_generated: report.tasks_generated,
            completed: report.records.len(),
            truncated: report.truncated_tasks(),
            average_latency: average_latency(&report.records),
            by_node: tasks_by_node(&report.records),
        }
    }
}

// ── ComparisonTable ───────────────────────────────────────────────────

/// Summaries of several scenarios side by side.
///
/// Node columns are the union of all node names; a node that did not
/// process anything in a scenario counts as zero there.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct ComparisonTable {
    pub summaries: Vec<ScenarioSummary>,
}

impl ComparisonTable {
    pub fn from_reports<'a, I>(reports: I) -> Self
    where
        I: IntoIterator<Item = &'a RunReport>,
    {
        ComparisonTable {
            summaries: reports.into_iter().map(ScenarioSummary::from_report).collect(),
        }
    }

    /// All node names seen in any scenario, sorted.
    pub fn node_names(&self) -> Vec<&str> {
        let names: BTreeSet<&str> = self
            .summaries
            .iter()
            .flat_map(|s| s.by_node.keys().map(String::as_str))
            .collect();
        names.into_iter().collect()
    }

    /// Tasks processed by `node` in the summary at `index`.
    pub fn count(&self, index: usize, node: &str) -> usize {
        self.summaries
            .get(index)
            .and_then(|s| s.by_node.get(node).copied())
            .unwrap_or(0)
    }

    /// Write one row per scenario:
    /// `scenario,generated,completed,truncated,avg_latency,<node>...`.
    pub fn write_csv<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let nodes = self.node_names();
        write!(w, "scenario,generated,completed,truncated,avg_latency")?;
        for n in &nodes {
            write!(w, ",{}", csv_field(n))?;
        }
        writeln!(w)?;

        for (i, s) in self.summaries.iter().enumerate() {
            write!(
                w,
                "{},{},{},{},",
                s.scenario, s.tasks_generated, s.completed, s.truncated
            )?;
            if let Some(avg) = s.average_latency {
                write!(w, "{:.1}", avg)?;
            }
            for n in &nodes {
                write!(w, ",{}", self.count(i, n))?;
            }
            writeln!(w)?;
        }
        Ok(())
    }

    pub fn write_csv_file(&self, path: impl AsRef<Path>) -> OffloadResult<()> {
        let mut f = io::BufWriter::new(std::fs::File::create(path)?);
        self.write_csv(&mut f)?;
        f.flush()?;
        Ok(())
    }

    #[cfg(feature = "serialize")]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl std::fmt::Display for ComparisonTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let nodes = self.node_names();

        write!(
            f,
            "{:<12} {:>9} {:>9} {:>9} {:>12}",
            "Scenario", "Generated", "Completed", "Truncated", "Avg latency"
        )?;
        for n in &nodes {
            write!(f, " {:>8}", n)?;
        }
        writeln!(f)?;

        for (i, s) in self.summaries.iter().enumerate() {
            let avg = s
                .average_latency
                .map_or_else(|| "-".to_string(), |a| format!("{:.1}", a));
            write!(
                f,
                "{:<12} {:>9} {:>9} {:>9} {:>12}",
                s.scenario.title(),
                s.tasks_generated,
                s.completed,
                s.truncated,
                avg
            )?;
            for n in &nodes {
                write!(f, " {:>8}", self.count(i, n))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ── Record export ─────────────────────────────────────────────────────

/// Write completion records as CSV:
/// `scenario,task_id,processed_by,latency,service_tier,completed_at`.
pub fn write_records_csv<'a, W, I>(w: &mut W, reports: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a RunReport>,
{
    writeln!(w, "scenario,task_id,processed_by,latency,service_tier,completed_at")?;
    for report in reports {
        for r in &report.records {
            writeln!(
                w,
                "{},{},{},{},{},{}",
                report.scenario,
                r.task_id,
                csv_field(&r.processed_by),
                r.latency,
                r.service_tier,
                r.completed_at.ticks()
            )?;
        }
    }
    Ok(())
}

pub fn write_records_csv_file<'a, I>(path: impl AsRef<Path>, reports: I) -> OffloadResult<()>
where
    I: IntoIterator<Item = &'a RunReport>,
{
    let mut f = io::BufWriter::new(std::fs::File::create(path)?);
    write_records_csv(&mut f, reports)?;
    f.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::node::ServiceTier;
    use crate::runner::{run_all_scenarios, run_scenario};
    use crate::time::VirtualTime;

    fn rec(task_id: u64, by: &str, latency: u64) -> CompletionRecord {
        CompletionRecord {
            task_id,
            processed_by: by.into(),
            latency,
            service_tier: if by == "Cloud" { ServiceTier::Full } else { ServiceTier::Partial },
            completed_at: VirtualTime::new(100 + latency),
        }
    }

    #[test]
    fn test_average_latency() {
        let records = vec![rec(0, "Edge1", 200), rec(1, "Cloud", 300)];
        assert_eq!(average_latency(&records), Some(250.0));
        assert_eq!(average_latency(&Vec::new()), None);
    }

    #[test]
    fn test_tasks_by_node() {
        let records = vec![rec(0, "Edge1", 200), rec(1, "Cloud", 300), rec(2, "Edge1", 200)];
        let counts = tasks_by_node(&records);
        assert_eq!(counts.get("Edge1"), Some(&2));
        assert_eq!(counts.get("Cloud"), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_summary_from_reference_runs() {
        let reports = run_all_scenarios(5_000).unwrap();
        let table = ComparisonTable::from_reports(reports.values());

        assert_eq!(table.summaries.len(), 3);
        assert_eq!(table.node_names(), vec!["Cloud", "Edge1", "Edge2"]);

        let edge = &table.summaries[0];
        assert_eq!(edge.scenario, Scenario::EdgeOnly);
        assert_eq!(edge.average_latency, Some(200.0));
        assert_eq!(edge.completed, 19);

        let cloud = &table.summaries[1];
        assert_eq!(cloud.average_latency, Some(300.0));
        assert_eq!(table.count(1, "Cloud"), 14);
        // Missing cells count as zero.
        assert_eq!(table.count(1, "Edge1"), 0);
        assert_eq!(table.count(0, "Cloud"), 0);
    }

    #[test]
    fn test_summary_csv() {
        let config = RunConfig::preset(Scenario::CloudOnly).with_sim_time(1_000);
        let report = run_scenario(&config).unwrap();
        let table = ComparisonTable::from_reports([&report]);

        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "scenario,generated,completed,truncated,avg_latency,Cloud");
        // Tasks at 50, 400, 750; completions at 350 and 700.
        assert_eq!(lines[1], "cloud_only,3,2,1,300.0,2");
    }

    #[test]
    fn test_empty_run_has_blank_average() {
        let config = RunConfig::preset(Scenario::EdgeOnly).with_sim_time(100);
        let report = run_scenario(&config).unwrap();
        let table = ComparisonTable::from_reports([&report]);

        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().nth(1), Some("edge_only,1,0,1,"));
        assert!(table.to_string().contains(" - ") || table.to_string().contains("-\n"));
    }

    #[test]
    fn test_records_csv() {
        let config = RunConfig::preset(Scenario::EdgeOnly).with_sim_time(600);
        let report = run_scenario(&config).unwrap();
        let mut out = Vec::new();
        write_records_csv(&mut out, [&report]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "scenario,task_id,processed_by,latency,service_tier,completed_at\n\
             edge_only,0,Edge1,200,Partial,250\n\
             edge_only,1,Edge2,200,Partial,500\n"
        );
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("Edge1"), "Edge1");
        assert_eq!(csv_field("DC, east"), "\"DC, east\"");
        assert_eq!(csv_field("Edge \"A\""), "\"Edge \"\"A\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_node_names_with_commas_keep_columns() {
        let config = RunConfig::preset(Scenario::CloudOnly)
            .with_cloud("DC, east", 300)
            .with_sim_time(400);
        let report = run_scenario(&config).unwrap();

        let mut out = Vec::new();
        write_records_csv(&mut out, [&report]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().nth(1), Some("cloud_only,0,\"DC, east\",300,Full,350"));

        let mut out = Vec::new();
        ComparisonTable::from_reports([&report]).write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text.lines().next(),
            Some("scenario,generated,completed,truncated,avg_latency,\"DC, east\"")
        );
    }

    #[test]
    fn test_csv_files_written() {
        let reports = run_all_scenarios(1_000).unwrap();
        let dir = std::env::temp_dir();
        let records_path = dir.join(format!("offload-records-{}.csv", std::process::id()));
        let summary_path = dir.join(format!("offload-summary-{}.csv", std::process::id()));

        write_records_csv_file(&records_path, reports.values()).unwrap();
        ComparisonTable::from_reports(reports.values())
            .write_csv_file(&summary_path)
            .unwrap();

        let records = std::fs::read_to_string(&records_path).unwrap();
        let summary = std::fs::read_to_string(&summary_path).unwrap();
        assert!(records.starts_with("scenario,task_id"));
        assert_eq!(summary.lines().count(), 4);

        std::fs::remove_file(records_path).ok();
        std::fs::remove_file(summary_path).ok();
    }

    #[test]
    fn test_table_display_lists_every_scenario() {
        let reports = run_all_scenarios(2_000).unwrap();
        let text = ComparisonTable::from_reports(reports.values()).to_string();
        assert!(text.starts_with("Scenario"));
        for sc in Scenario::ALL {
            assert!(text.contains(sc.title()), "missing {} in\n{}", sc.title(), text);
        }
    }

    #[cfg(feature = "serialize")]
    #[test]
    fn test_table_json() {
        let reports = run_all_scenarios(1_000).unwrap();
        let json = ComparisonTable::from_reports(reports.values()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["summaries"][1]["scenario"], "cloud_only");
        assert_eq!(value["summaries"][1]["by_node"]["Cloud"], 2);
    }
}
