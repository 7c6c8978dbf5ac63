//! End-to-end planning tests over small hand-built and seeded scenarios.

use std::collections::{BTreeSet, HashSet};

use dispatch_core::{
    Delivery, DeliveryGraph, Drone, LegState, NoFlyZone, PathSearch, PlanError, Planner,
    PlannerConfig, Point, Resolution, Scenario, TimeWindow,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn line_scenario(battery: f64) -> Scenario {
    Scenario {
        drones: vec![Drone {
            id: 1,
            max_weight: 10.0,
            battery,
            speed: 1.0,
            start: Point::new(0.0, 0.0),
        }],
        deliveries: vec![
            Delivery {
                id: 1,
                position: Point::new(1.0, 0.0),
                weight: 1.0,
                priority: 1,
                window: TimeWindow::new(0.0, 100.0),
            },
            Delivery {
                id: 2,
                position: Point::new(2.0, 0.0),
                weight: 1.0,
                priority: 1,
                window: TimeWindow::new(0.0, 100.0),
            },
        ],
        zones: Vec::new(),
    }
}

fn random_scenario(rng: &mut StdRng, drones: u32, deliveries: u32, zones: u32) -> Scenario {
    Scenario {
        drones: (1..=drones)
            .map(|id| Drone {
                id,
                max_weight: rng.random_range(2.0..6.0),
                battery: rng.random_range(2_000.0..5_000.0),
                speed: rng.random_range(5.0..12.0),
                start: Point::new(rng.random_range(0.0..100.0), rng.random_range(0.0..100.0)),
            })
            .collect(),
        deliveries: (1..=deliveries)
            .map(|id| {
                let open = rng.random_range(0.0..60.0);
                Delivery {
                    id,
                    position: Point::new(rng.random_range(0.0..100.0), rng.random_range(0.0..100.0)),
                    weight: rng.random_range(0.5..5.0),
                    priority: rng.random_range(1..=5),
                    window: TimeWindow::new(open, open + rng.random_range(20.0..80.0)),
                }
            })
            .collect(),
        zones: (1..=zones)
            .map(|id| {
                let x = rng.random_range(10.0..80.0);
                let y = rng.random_range(10.0..80.0);
                let size = rng.random_range(5.0..15.0);
                let open = rng.random_range(0.0..60.0);
                NoFlyZone {
                    id,
                    polygon: vec![
                        Point::new(x, y),
                        Point::new(x + size, y),
                        Point::new(x + size, y + size),
                        Point::new(x, y + size),
                    ],
                    active: TimeWindow::new(open, open + rng.random_range(30.0..90.0)),
                }
            })
            .collect(),
    }
}

/// Two collinear parcels with enough battery for both legs are served in order.
#[test]
fn test_collinear_pair_with_ample_battery() {
    let scenario = line_scenario(100.0);
    let graph = DeliveryGraph::new(&scenario.deliveries, &scenario.zones);
    let config = PlannerConfig::default();
    let drone = &scenario.drones[0];
    let search = PathSearch::new(&graph, drone, &config);
    let targets: BTreeSet<_> = graph.delivery_ids().collect();

    let outcome = search.find_path(&LegState::from(&drone.fresh_state()), &targets);
    assert_eq!(outcome.path, vec![1, 2]);
    assert_eq!(outcome.resolution, Resolution::Optimal);

    let planner = Planner::new(scenario, config).expect("valid scenario");
    let plan = planner.run_coordinator().expect("coordinator run");
    let stops = &plan.routes[0].stops;
    let positions: Vec<Point> = stops.iter().map(|stop| stop.position).collect();
    assert_eq!(positions, vec![Point::new(1.0, 0.0), Point::new(2.0, 0.0)]);
    // 12 energy per leg, no recharge delay in the arrival times
    assert!((plan.routes[0].energy - 24.0).abs() < 1e-9);
    assert!((stops[1].arrival_time - 2.0).abs() < 1e-12);
}

/// A single unit leg at weight 1 already needs 12 energy, beyond a 10-unit pack.
#[test]
fn test_collinear_pair_with_ten_unit_battery_is_unreachable() {
    let scenario = line_scenario(10.0);
    let graph = DeliveryGraph::new(&scenario.deliveries, &scenario.zones);
    let config = PlannerConfig::default();
    let drone = &scenario.drones[0];
    let search = PathSearch::new(&graph, drone, &config);
    let targets: BTreeSet<_> = graph.delivery_ids().collect();

    let outcome = search.find_path(&LegState::from(&drone.fresh_state()), &targets);
    assert!(outcome.path.is_empty(), "got {:?}", outcome.path);

    let planner = Planner::new(scenario, config).expect("valid scenario");
    let plan = planner.run_coordinator().expect("coordinator run");
    assert_eq!(plan.metrics.completed, 0);
    assert_eq!(plan.diagnostics.len(), 1);
}

/// Coordinator output never repeats a delivery across or within routes.
#[test]
fn test_coordinator_assigns_each_delivery_once() {
    let mut rng = StdRng::seed_from_u64(17);
    for _ in 0..5 {
        let scenario = random_scenario(&mut rng, 4, 15, 3);
        let total = scenario.deliveries.len();
        let planner = Planner::new(scenario, PlannerConfig::default()).expect("valid scenario");
        let plan = planner.run_coordinator().expect("coordinator run");

        let mut seen = HashSet::new();
        for route in &plan.routes {
            for id in route.delivery_ids() {
                assert!(seen.insert(id), "delivery {id} assigned twice");
            }
        }
        assert_eq!(plan.metrics.completed, seen.len());
        assert!(seen.len() <= total);
    }
}

/// Search paths visit each requested id at most once.
#[test]
fn test_search_paths_have_unique_ids() {
    let mut rng = StdRng::seed_from_u64(99);
    let config = PlannerConfig::default();
    for _ in 0..10 {
        let scenario = random_scenario(&mut rng, 1, 8, 2);
        let graph = DeliveryGraph::new(&scenario.deliveries, &scenario.zones);
        let drone = &scenario.drones[0];
        let search = PathSearch::new(&graph, drone, &config);
        let targets: BTreeSet<_> = graph.delivery_ids().collect();

        let outcome = search.find_path(&LegState::from(&drone.fresh_state()), &targets);
        let unique: HashSet<_> = outcome.path.iter().collect();
        assert_eq!(unique.len(), outcome.path.len(), "path {:?}", outcome.path);
        assert!(outcome.path.iter().all(|id| targets.contains(id)));
    }
}

/// Identical seeds give identical genetic plans.
#[test]
fn test_genetic_plan_is_reproducible_with_seed() {
    let mut rng = StdRng::seed_from_u64(5);
    let scenario = random_scenario(&mut rng, 3, 12, 2);
    let mut config = PlannerConfig::default();
    config.genetic.population_size = 12;
    config.genetic.generations = 15;
    let planner = Planner::new(scenario, config).expect("valid scenario");

    let first = planner
        .run_genetic_with(&mut StdRng::seed_from_u64(321))
        .expect("first run");
    let second = planner
        .run_genetic_with(&mut StdRng::seed_from_u64(321))
        .expect("second run");

    assert_eq!(first.routes, second.routes);
    assert_eq!(first.fitness_history, second.fitness_history);
    assert_eq!(first.metrics.final_fitness, second.metrics.final_fitness);
}

/// Genetic routes list only completed stops, each delivery at most once.
#[test]
fn test_genetic_plan_completions_are_unique() {
    let mut rng = StdRng::seed_from_u64(8);
    let scenario = random_scenario(&mut rng, 3, 12, 3);
    let mut config = PlannerConfig::default();
    config.genetic.population_size = 10;
    config.genetic.generations = 10;
    config.genetic.seed = Some(8);
    let planner = Planner::new(scenario, config).expect("valid scenario");

    let plan = planner.run_genetic().expect("genetic run");
    let mut seen = HashSet::new();
    for route in &plan.routes {
        for stop in &route.stops {
            assert!(seen.insert(stop.delivery_id), "delivery {} repeated", stop.delivery_id);
        }
    }
    assert_eq!(plan.metrics.completed, seen.len());
    assert_eq!(plan.fitness_history.len(), 10);
}

/// Malformed input is rejected before any planning happens.
#[test]
fn test_duplicate_zone_ids_are_rejected() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut scenario = random_scenario(&mut rng, 1, 2, 2);
    scenario.zones[1].id = scenario.zones[0].id;

    let err = Planner::new(scenario, PlannerConfig::default()).expect_err("duplicate zone");
    assert_eq!(err, PlanError::DuplicateId { kind: "zone", id: 1 });
}
