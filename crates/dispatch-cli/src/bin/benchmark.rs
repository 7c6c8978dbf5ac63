//! Time both strategies over generated scenarios of growing size.
//!
//! Usage:
//!   cargo run -p dispatch-cli --bin benchmark -- --sizes 10,20,40 --drones 5
//!   cargo run -p dispatch-cli --bin benchmark -- --output bench.json

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dispatch_cli::{BenchmarkReport, BenchmarkRow, Config, ScenarioGenerator};
use dispatch_core::Planner;

#[derive(Parser, Debug)]
#[command(author, version, about = "Benchmark coordinator and genetic planning")]
struct Args {
    /// Delivery counts to benchmark
    #[arg(long, value_delimiter = ',', default_values_t = [10, 20, 40])]
    sizes: Vec<u32>,

    #[arg(long, default_value_t = 5)]
    drones: u32,

    #[arg(long, default_value_t = 3)]
    zones: u32,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Also write the results table as JSON to this file
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dispatch_core=warn".parse()?),
        )
        .init();

    let args = Args::parse();
    let env = Config::from_env();
    let generator = ScenarioGenerator::default();
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut report = BenchmarkReport::new(args.seed, args.zones);

    println!(
        "{:>10} {:>8} {:>12} {:>10} {:>12} {:>10} {:>10}",
        "deliveries", "drones", "coord %", "coord s", "genetic %", "genetic s", "fitness"
    );

    for size in &args.sizes {
        let scenario = generator.generate(&mut rng, args.drones, *size, args.zones);
        let mut config = env.planner_config();
        config.genetic.seed.get_or_insert(args.seed);
        let planner = Planner::new(scenario, config)
            .with_context(|| format!("generated scenario with {size} deliveries"))?;

        let started = Instant::now();
        let coordinator = planner.run_coordinator()?;
        let coordinator_secs = started.elapsed().as_secs_f64();

        let started = Instant::now();
        let genetic = planner.run_genetic()?;
        let genetic_secs = started.elapsed().as_secs_f64();

        let row = BenchmarkRow {
            deliveries: *size,
            drones: args.drones,
            coordinator_completion_rate: coordinator.metrics.completion_rate,
            coordinator_secs,
            genetic_completion_rate: genetic.metrics.completion_rate,
            genetic_secs,
            genetic_fitness: genetic.metrics.final_fitness,
        };
        println!("{row}");
        report.rows.push(row);
    }

    if let Some(path) = &args.output {
        report.write_json(path)?;
    }

    Ok(())
}
