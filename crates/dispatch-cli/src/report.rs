//! Text and JSON rendering of planning and benchmark results.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;

use dispatch_core::{PlanOutcome, Scenario, Strategy, TurnEndReason};

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioSummary {
    pub drones: usize,
    pub deliveries: usize,
    pub zones: usize,
}

impl From<&Scenario> for ScenarioSummary {
    fn from(scenario: &Scenario) -> Self {
        Self {
            drones: scenario.drones.len(),
            deliveries: scenario.deliveries.len(),
            zones: scenario.zones.len(),
        }
    }
}

/// Coordinator relative to genetic, when both ran.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub completion_rate_diff: f64,
    pub time_ratio: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub generated_at: DateTime<Utc>,
    pub scenario: ScenarioSummary,
    pub outcomes: Vec<PlanOutcome>,
    pub comparison: Option<Comparison>,
}

impl PlanReport {
    pub fn new(scenario: &Scenario, outcomes: Vec<PlanOutcome>) -> Self {
        let find = |strategy| outcomes.iter().find(|o| o.strategy == strategy);
        let comparison = match (find(Strategy::Coordinator), find(Strategy::Genetic)) {
            (Some(coordinator), Some(genetic)) => {
                let genetic_secs = genetic.metrics.execution_time.as_secs_f64();
                Some(Comparison {
                    completion_rate_diff: coordinator.metrics.completion_rate
                        - genetic.metrics.completion_rate,
                    time_ratio: if genetic_secs > 0.0 {
                        coordinator.metrics.execution_time.as_secs_f64() / genetic_secs
                    } else {
                        0.0
                    },
                })
            }
            _ => None,
        };

        Self {
            generated_at: Utc::now(),
            scenario: ScenarioSummary::from(scenario),
            outcomes,
            comparison,
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        write_json(path, self, "plan report")
    }
}

impl fmt::Display for PlanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Plan report {} ({} drones, {} deliveries, {} zones)",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.scenario.drones,
            self.scenario.deliveries,
            self.scenario.zones
        )?;

        for outcome in &self.outcomes {
            write_outcome(f, outcome)?;
        }

        if let Some(comparison) = &self.comparison {
            writeln!(f, "\nComparison (coordinator vs genetic)")?;
            writeln!(
                f,
                "  completion rate diff: {:+.2}%",
                comparison.completion_rate_diff
            )?;
            writeln!(f, "  time ratio: {:.2}", comparison.time_ratio)?;
        }
        Ok(())
    }
}

fn write_outcome(f: &mut fmt::Formatter<'_>, outcome: &PlanOutcome) -> fmt::Result {
    let metrics = &outcome.metrics;
    writeln!(f, "\n== {} ==", outcome.strategy)?;
    writeln!(
        f,
        "  completed {}/{} ({:.1}%)",
        metrics.completed, metrics.total_deliveries, metrics.completion_rate
    )?;
    writeln!(
        f,
        "  energy {:.2} (avg {:.2}/delivery), distance {:.2}",
        metrics.total_energy, metrics.avg_energy_per_delivery, metrics.total_distance
    )?;
    writeln!(
        f,
        "  active drones {} ({:.0}% utilization)",
        outcome.fleet.active_drones, outcome.fleet.utilization_percent
    )?;
    if let Some(fitness) = metrics.final_fitness {
        writeln!(f, "  final fitness {fitness:.2}")?;
    }
    writeln!(
        f,
        "  execution time {:.4}s",
        metrics.execution_time.as_secs_f64()
    )?;

    for (index, route) in outcome.routes.iter().enumerate() {
        let stops: Vec<String> = route
            .stops
            .iter()
            .map(|stop| format!("D{}@{:.1}", stop.delivery_id, stop.arrival_time))
            .collect();
        let listing = if stops.is_empty() {
            "-".to_string()
        } else {
            stops.join(" -> ")
        };
        writeln!(f, "  drone {}: {}", route.drone_id, listing)?;

        if let Some(stats) = outcome.path_stats.get(index).filter(|s| s.path_length > 0) {
            writeln!(
                f,
                "    path {:.2} units, {:.2} time, {:.2} energy, avg priority {:.1}, efficiency {:.4}",
                stats.total_distance,
                stats.total_time,
                stats.total_energy,
                stats.average_priority,
                stats.energy_efficiency
            )?;
        }
    }

    for diagnostic in &outcome.diagnostics {
        let reason = match &diagnostic.reason {
            TurnEndReason::NoFeasiblePath { remaining } => {
                format!("no feasible path ({remaining} deliveries left)")
            }
            TurnEndReason::LegRejected {
                delivery_id,
                rejection,
            } => format!("delivery {delivery_id} rejected: {rejection:?}"),
            TurnEndReason::UnknownDelivery { delivery_id } => {
                format!("delivery {delivery_id} is not in the graph")
            }
        };
        writeln!(f, "  ! drone {}: {}", diagnostic.drone_id, reason)?;
    }
    Ok(())
}

/// One benchmarked scenario size.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkRow {
    pub deliveries: u32,
    pub drones: u32,
    pub coordinator_completion_rate: f64,
    pub coordinator_secs: f64,
    pub genetic_completion_rate: f64,
    pub genetic_secs: f64,
    pub genetic_fitness: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub generated_at: DateTime<Utc>,
    pub seed: u64,
    pub zones: u32,
    pub rows: Vec<BenchmarkRow>,
}

impl BenchmarkReport {
    pub fn new(seed: u64, zones: u32) -> Self {
        Self {
            generated_at: Utc::now(),
            seed,
            zones,
            rows: Vec::new(),
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        write_json(path, self, "benchmark report")
    }
}

impl fmt::Display for BenchmarkRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>10} {:>8} {:>11.1}% {:>10.4} {:>11.1}% {:>10.4} {:>10.2}",
            self.deliveries,
            self.drones,
            self.coordinator_completion_rate,
            self.coordinator_secs,
            self.genetic_completion_rate,
            self.genetic_secs,
            self.genetic_fitness.unwrap_or_default()
        )
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T, what: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(value).with_context(|| format!("serializing {what}"))?;
    fs::write(path, json).with_context(|| format!("writing {what} {}", path.display()))?;
    tracing::info!(path = %path.display(), "Wrote {}", what);
    Ok(())
}
