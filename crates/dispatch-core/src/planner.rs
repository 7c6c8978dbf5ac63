//! Entry point running either strategy over a validated scenario.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::coordinator::{Coordinator, TurnDiagnostic};
use crate::error::PlanResult;
use crate::genetic::GeneticOptimizer;
use crate::graph::DeliveryGraph;
use crate::ledger::AssignmentLedger;
use crate::cost::CostModel;
use crate::metrics::{DroneRoute, FleetStatistics, PathStatistics, RunMetrics};
use crate::models::Scenario;
use crate::rules::PlannerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Coordinator,
    Genetic,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Coordinator => write!(f, "coordinator"),
            Strategy::Genetic => write!(f, "genetic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOutcome {
    pub strategy: Strategy,
    pub routes: Vec<DroneRoute>,
    /// Straight-line statistics per route, in route order
    pub path_stats: Vec<PathStatistics>,
    pub metrics: RunMetrics,
    pub fleet: FleetStatistics,
    pub diagnostics: Vec<TurnDiagnostic>,
    pub fitness_history: Vec<f64>,
}

/// Validated scenario plus its delivery graph. Every run starts from fresh
/// drone states and a fresh ledger, so runs never see each other's state.
#[derive(Debug, Clone)]
pub struct Planner {
    scenario: Scenario,
    config: PlannerConfig,
    graph: DeliveryGraph,
}

impl Planner {
    pub fn new(scenario: Scenario, config: PlannerConfig) -> PlanResult<Self> {
        scenario.validate()?;
        let graph = DeliveryGraph::with_rules(
            &scenario.deliveries,
            &scenario.zones,
            &config.graph,
            config.zone_sample_steps,
        );

        tracing::info!(
            drones = scenario.drones.len(),
            deliveries = scenario.deliveries.len(),
            zones = scenario.zones.len(),
            "Planner ready"
        );

        Ok(Self {
            scenario,
            config,
            graph,
        })
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn graph(&self) -> &DeliveryGraph {
        &self.graph
    }

    /// Statistics for each route's completed stops, priced by the shared cost model.
    pub fn path_statistics(&self, routes: &[DroneRoute]) -> Vec<PathStatistics> {
        let model = CostModel::new(self.graph.zones(), &self.config);
        routes
            .iter()
            .filter_map(|route| {
                let drone = self
                    .scenario
                    .drones
                    .iter()
                    .find(|drone| drone.id == route.drone_id)?;
                Some(PathStatistics::for_route(
                    drone,
                    &self.graph,
                    &model,
                    &route.delivery_ids(),
                ))
            })
            .collect()
    }

    pub fn run_coordinator(&self) -> PlanResult<PlanOutcome> {
        let started = Instant::now();
        let mut ledger = AssignmentLedger::new(self.graph.delivery_ids());
        let outcome =
            Coordinator::new(&self.graph, &self.scenario.drones, &self.config).run(&mut ledger)?;

        let metrics = RunMetrics::from_routes(
            &outcome.routes,
            self.graph.len(),
            started.elapsed(),
            None,
        );
        tracing::info!(
            completed = metrics.completed,
            total = metrics.total_deliveries,
            searches = outcome.searches,
            elapsed_ms = metrics.execution_time.as_millis() as u64,
            "Coordinator run finished"
        );

        Ok(PlanOutcome {
            strategy: Strategy::Coordinator,
            fleet: FleetStatistics::for_assignment(&outcome.routes, self.scenario.drones.len()),
            path_stats: self.path_statistics(&outcome.routes),
            routes: outcome.routes,
            metrics,
            diagnostics: outcome.diagnostics,
            fitness_history: Vec::new(),
        })
    }

    /// Seeds from `genetic.seed` when set, otherwise from OS entropy.
    pub fn run_genetic(&self) -> PlanResult<PlanOutcome> {
        let mut rng = match self.config.genetic.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        self.run_genetic_with(&mut rng)
    }

    pub fn run_genetic_with<R: Rng>(&self, rng: &mut R) -> PlanResult<PlanOutcome> {
        let started = Instant::now();
        let optimizer = GeneticOptimizer::new(&self.graph, &self.scenario.drones, &self.config);
        let outcome = optimizer.run(rng);

        let mut ledger = AssignmentLedger::new(self.graph.delivery_ids());
        let mut routes = Vec::with_capacity(self.scenario.drones.len());
        for drone in &self.scenario.drones {
            let ids = outcome.best.get(&drone.id).map_or(&[][..], Vec::as_slice);
            let replay = optimizer.replay_route(drone, ids);
            for stop in &replay.route.stops {
                ledger.assign(stop.delivery_id, drone.id)?;
            }
            routes.push(replay.route);
        }

        let metrics = RunMetrics::from_routes(
            &routes,
            self.graph.len(),
            started.elapsed(),
            Some(outcome.report.score),
        );
        tracing::info!(
            completed = metrics.completed,
            total = metrics.total_deliveries,
            fitness = outcome.report.score,
            elapsed_ms = metrics.execution_time.as_millis() as u64,
            "Genetic run finished"
        );

        Ok(PlanOutcome {
            strategy: Strategy::Genetic,
            fleet: FleetStatistics::for_assignment(&routes, self.scenario.drones.len()),
            path_stats: self.path_statistics(&routes),
            routes,
            metrics,
            diagnostics: Vec::new(),
            fitness_history: outcome.history,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanError;
    use crate::models::{Delivery, Drone, Point, TimeWindow};

    fn scenario() -> Scenario {
        Scenario {
            drones: vec![Drone {
                id: 1,
                max_weight: 5.0,
                battery: 5_000.0,
                speed: 2.0,
                start: Point::new(0.0, 0.0),
            }],
            deliveries: (1..=4)
                .map(|id| Delivery {
                    id,
                    position: Point::new(f64::from(id) * 3.0, 1.0),
                    weight: 1.0,
                    priority: 2,
                    window: TimeWindow::new(0.0, 200.0),
                })
                .collect(),
            zones: Vec::new(),
        }
    }

    #[test]
    fn invalid_scenario_is_rejected_up_front() {
        let mut bad = scenario();
        bad.drones[0].battery = -1.0;
        assert!(matches!(
            Planner::new(bad, PlannerConfig::default()),
            Err(PlanError::InvalidDroneSpec { drone_id: 1, .. })
        ));
    }

    #[test]
    fn coordinator_run_reports_metrics() {
        let planner = Planner::new(scenario(), PlannerConfig::default()).expect("valid scenario");
        let outcome = planner.run_coordinator().expect("coordinator run");

        assert_eq!(outcome.strategy, Strategy::Coordinator);
        assert_eq!(outcome.metrics.completed, 4);
        assert!((outcome.metrics.completion_rate - 100.0).abs() < 1e-9);
        assert_eq!(outcome.fleet.active_drones, 1);
        assert!(outcome.metrics.final_fitness.is_none());
    }

    #[test]
    fn coordinator_path_stats_match_flown_routes() {
        let planner = Planner::new(scenario(), PlannerConfig::default()).expect("valid scenario");
        let outcome = planner.run_coordinator().expect("coordinator run");

        assert_eq!(outcome.path_stats.len(), outcome.routes.len());
        let (route, stats) = (&outcome.routes[0], &outcome.path_stats[0]);
        assert_eq!(stats.path_length, 4);
        assert!((stats.total_distance - route.distance).abs() < 1e-9);
        assert!((stats.total_energy - route.energy).abs() < 1e-9);
        assert!((stats.average_priority - 2.0).abs() < 1e-12);
        assert!((stats.total_time - route.distance / 2.0).abs() < 1e-9);
    }

    #[test]
    fn genetic_path_stats_cover_every_route() {
        let mut config = PlannerConfig::default();
        config.genetic.population_size = 6;
        config.genetic.generations = 3;
        config.genetic.seed = Some(11);
        let planner = Planner::new(scenario(), config).expect("valid scenario");
        let outcome = planner.run_genetic().expect("genetic run");

        assert_eq!(outcome.path_stats.len(), outcome.routes.len());
        for (route, stats) in outcome.routes.iter().zip(&outcome.path_stats) {
            assert_eq!(stats.path_length, route.stops.len());
        }
    }

    #[test]
    fn repeated_runs_start_from_scratch() {
        let planner = Planner::new(scenario(), PlannerConfig::default()).expect("valid scenario");
        let first = planner.run_coordinator().expect("first run");
        let second = planner.run_coordinator().expect("second run");
        assert_eq!(first.routes, second.routes);
    }

    #[test]
    fn seeded_genetic_runs_are_reproducible() {
        let mut config = PlannerConfig::default();
        config.genetic.population_size = 10;
        config.genetic.generations = 8;
        config.genetic.seed = Some(2024);
        let planner = Planner::new(scenario(), config).expect("valid scenario");

        let first = planner.run_genetic().expect("first run");
        let second = planner.run_genetic().expect("second run");
        assert_eq!(first.routes, second.routes);
        assert_eq!(first.fitness_history, second.fitness_history);
        assert_eq!(first.metrics.final_fitness, second.metrics.final_fitness);
        assert_eq!(first.fitness_history.len(), 8);
    }
}
