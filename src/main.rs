//! offload-sim CLI
//!
//! Runs the offloading scenarios and prints a comparison table.
//!
//! # Example
//!
//! ```bash
//! # All three reference scenarios, 5000 ticks each
//! offload-sim
//!
//! # Hybrid only, overlapping arrivals, with CSV exports
//! offload-sim --scenario hybrid --no-serialize --csv results.csv --summary-csv summary.csv
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use offload_sim::config::non_negative;
use offload_sim::{
    report, run_scenarios, ComparisonTable, Horizon, RunConfig, Scenario,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Edge/cloud offloading simulator
///
/// Deterministic: the same options always produce the same results.
#[derive(Parser, Debug)]
#[command(name = "offload-sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Scenario to run. Repeatable; defaults to all three.
    #[arg(short = 's', long = "scenario", value_enum)]
    scenarios: Vec<Scenario>,

    /// Simulated duration in ticks
    #[arg(short = 'd', long, default_value = "5000", allow_negative_numbers = true)]
    sim_time: i64,

    /// Ticks between generated tasks
    #[arg(long, allow_negative_numbers = true)]
    arrival_period: Option<i64>,

    /// Edge processing time in ticks
    #[arg(long, allow_negative_numbers = true)]
    edge_time: Option<i64>,

    /// Cloud delay in ticks
    #[arg(long, allow_negative_numbers = true)]
    cloud_delay: Option<i64>,

    /// Let new tasks arrive while earlier ones are still processing
    #[arg(long)]
    no_serialize: bool,

    /// Also complete tasks finishing exactly at the end time
    #[arg(long)]
    inclusive: bool,

    /// JSON run configuration (one object or a list); overrides the options above
    #[arg(short = 'c', long)]
    config: Option<std::path::PathBuf>,

    /// Write every completion record to this CSV file
    #[arg(long)]
    csv: Option<std::path::PathBuf>,

    /// Write the per-scenario summary to this CSV file
    #[arg(long)]
    summary_csv: Option<std::path::PathBuf>,

    /// Print the summary as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn build_configs(args: &Args) -> Result<Vec<RunConfig>> {
    if let Some(path) = &args.config {
        return RunConfig::list_from_json_file(path)
            .with_context(|| format!("loading {}", path.display()));
    }

    let scenarios = if args.scenarios.is_empty() {
        Scenario::ALL.to_vec()
    } else {
        args.scenarios.clone()
    };

    let sim_time = non_negative("sim_time", args.sim_time)?;
    let horizon = if args.inclusive {
        Horizon::Inclusive
    } else {
        Horizon::Exclusive
    };

    let mut configs = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        let mut config = RunConfig::preset(scenario)
            .with_sim_time(sim_time)
            .serialize_arrivals(!args.no_serialize)
            .with_horizon(horizon);
        if let Some(v) = args.arrival_period {
            config = config.with_arrival_period(non_negative("arrival_period", v)?);
        }
        if let Some(v) = args.edge_time {
            config = config.with_edge_processing_time(non_negative("edge_time", v)?);
        }
        if let Some(v) = args.cloud_delay {
            let name = config.cloud.name.clone();
            config = config.with_cloud(name, non_negative("cloud_delay", v)?);
        }
        configs.push(config);
    }
    Ok(configs)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,offload_sim=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let configs = build_configs(&args)?;
    info!(runs = configs.len(), "configuration loaded");

    let reports = run_scenarios(&configs)?;
    let table = ComparisonTable::from_reports(reports.values());

    if args.json {
        println!("{}", table.to_json().context("encoding summary as JSON")?);
    } else {
        print!("{}", table);
    }

    if let Some(path) = &args.csv {
        report::write_records_csv_file(path, reports.values())
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "completion records written");
    }
    if let Some(path) = &args.summary_csv {
        table
            .write_csv_file(path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "summary written");
    }

    Ok(())
}
