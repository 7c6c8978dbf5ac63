//! Plan deliveries for a drone fleet.
//!
//! Usage:
//!   cargo run -p dispatch-cli --bin plan_fleet -- --strategy both
//!   cargo run -p dispatch-cli --bin plan_fleet -- --scenario fleet.json --json
//!   cargo run -p dispatch-cli --bin plan_fleet -- --random 40 --drones 6 --seed 7
//!   cargo run -p dispatch-cli --bin plan_fleet -- --random 40 --save-scenario fleet.json

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dispatch_cli::{
    default_scenario, load_scenario, save_scenario, Config, PlanReport, ScenarioGenerator,
};
use dispatch_core::Planner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    Coordinator,
    Genetic,
    Both,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Plan multi-drone deliveries")]
struct Args {
    /// Scenario JSON file (drones, deliveries, zones)
    #[arg(long, conflicts_with = "random")]
    scenario: Option<PathBuf>,

    /// Generate a random scenario with this many deliveries
    #[arg(long)]
    random: Option<u32>,

    /// Drone count for generated scenarios
    #[arg(long, default_value_t = 5)]
    drones: u32,

    /// No-fly zone count for generated scenarios
    #[arg(long, default_value_t = 3)]
    zones: u32,

    #[arg(long, value_enum, default_value_t = StrategyArg::Both)]
    strategy: StrategyArg,

    /// Seed for scenario generation and the genetic optimizer
    #[arg(long)]
    seed: Option<u64>,

    /// Genetic population size
    #[arg(long)]
    population: Option<usize>,

    /// Genetic generation count
    #[arg(long)]
    generations: Option<usize>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Also write the JSON report to this file
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write the planned scenario (loaded, generated or built-in) to this file
    #[arg(long)]
    save_scenario: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dispatch_core=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env().merge(Config {
        seed: args.seed,
        population: args.population,
        generations: args.generations,
    });

    let scenario = match (&args.scenario, args.random) {
        (Some(path), _) => load_scenario(path)?,
        (None, Some(deliveries)) => {
            let mut rng = match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            ScenarioGenerator::default().generate(&mut rng, args.drones, deliveries, args.zones)
        }
        (None, None) => default_scenario(),
    };
    if let Some(path) = &args.save_scenario {
        save_scenario(path, &scenario)?;
    }

    let planner = Planner::new(scenario, config.planner_config()).context("invalid scenario")?;

    let mut outcomes = Vec::new();
    if matches!(args.strategy, StrategyArg::Coordinator | StrategyArg::Both) {
        outcomes.push(planner.run_coordinator()?);
    }
    if matches!(args.strategy, StrategyArg::Genetic | StrategyArg::Both) {
        outcomes.push(planner.run_genetic()?);
    }

    let report = PlanReport::new(planner.scenario(), outcomes);
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serializing plan report")?
        );
    } else {
        print!("{report}");
    }
    if let Some(path) = &args.output {
        report.write_json(path)?;
    }

    Ok(())
}
