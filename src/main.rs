//! 流量制御ループのPIDゲインチューニング

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flow_tune_sim::prelude::*;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Select {
    Genetic,
    Swarm,
    Best,
}

impl From<Select> for ResultSelection {
    fn from(sel: Select) -> Self {
        match sel {
            Select::Genetic => ResultSelection::Genetic,
            Select::Swarm => ResultSelection::Swarm,
            Select::Best => ResultSelection::Best,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "flow_tune_sim",
    version,
    about = "Flow-control loop simulator with swarm / genetic PID gain tuning"
)]
struct Args {
    /// Tuning configuration (JSON). Defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Which search result to adopt
    #[arg(value_enum, long)]
    select: Option<Select>,

    /// RNG seed for both searches
    #[arg(long)]
    seed: Option<u64>,

    /// Evaluate candidates in parallel
    #[arg(long)]
    parallel: bool,

    /// Write the trajectory of the selected gains as CSV
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => TuneConfig::from_json_file(path)?,
        None => TuneConfig::default(),
    };
    if let Some(sel) = args.select {
        config.selection = sel.into();
    }
    if let Some(seed) = args.seed {
        config.swarm.seed = seed;
        config.genetic.seed = seed;
    }
    if args.parallel {
        config.swarm.parallel = true;
        config.genetic.parallel = true;
    }

    let driver = TuningDriver::new(&config)?;
    let report = driver.run()?;

    info!(
        "swarm   : Kp = {:.6}, Ki = {:.6}, Kd = {:.6}, cost = {:.6}",
        report.swarm.gains.kp, report.swarm.gains.ki, report.swarm.gains.kd, report.swarm.cost
    );
    info!(
        "genetic : Kp = {:.6}, Ki = {:.6}, Kd = {:.6}, cost = {:.6}",
        report.genetic.gains.kp, report.genetic.gains.ki, report.genetic.gains.kd, report.genetic.cost
    );
    info!("selected ({:?}): {}", report.selection, serde_json::to_string(&report.selected)?);

    if let Some(path) = &args.output {
        report.trajectory.export(path)?;
        info!("trajectory written to {}", path.display());
    }

    Ok(())
}
