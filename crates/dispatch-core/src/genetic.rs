//! Genetic optimizer over whole-fleet assignments.
//!
//! An individual maps every drone to an ordered delivery list. Fitness
//! replays each list through [`CostModel::replay`], so scores use the same
//! leg rules as the path search. All randomness comes from the caller's RNG.

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::cost::{CostModel, LegState, ReplayStep};
use crate::graph::DeliveryGraph;
use crate::metrics::{DroneRoute, RouteStop};
use crate::models::{Delivery, DeliveryId, Drone, DroneId};
use crate::rules::{GeneticConfig, PlannerConfig};

pub type Individual = BTreeMap<DroneId, Vec<DeliveryId>>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessReport {
    pub completions: usize,
    pub energy: f64,
    pub violations: u32,
    pub score: f64,
}

/// Result of replaying one drone's delivery list.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteReplay {
    pub route: DroneRoute,
    pub violations: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneticOutcome {
    pub best: Individual,
    pub report: FitnessReport,
    /// Best score of each generation
    pub history: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    Swap,
    Move,
    Reverse,
    Shuffle,
}

const MUTATIONS: [Mutation; 4] = [
    Mutation::Swap,
    Mutation::Move,
    Mutation::Reverse,
    Mutation::Shuffle,
];

pub struct GeneticOptimizer<'a> {
    graph: &'a DeliveryGraph,
    drones: &'a [Drone],
    model: CostModel<'a>,
    config: &'a GeneticConfig,
}

impl<'a> GeneticOptimizer<'a> {
    pub fn new(graph: &'a DeliveryGraph, drones: &'a [Drone], config: &'a PlannerConfig) -> Self {
        Self {
            graph,
            drones,
            model: CostModel::new(graph.zones(), config),
            config: &config.genetic,
        }
    }

    pub fn run<R: Rng>(&self, rng: &mut R) -> GeneticOutcome {
        let population_size = self.config.population_size.max(1);
        let elite = self.config.elite_count().clamp(1, population_size);

        let mut population: Vec<Individual> = (0..population_size)
            .map(|_| self.random_individual(rng))
            .collect();
        let mut best: Option<(Individual, FitnessReport)> = None;
        let mut history = Vec::with_capacity(self.config.generations);

        for generation in 0..self.config.generations {
            let evaluated = self.rank(population);
            let (leader, leader_report) = &evaluated[0];

            if best
                .as_ref()
                .is_none_or(|(_, report)| leader_report.score > report.score)
            {
                best = Some((leader.clone(), *leader_report));
            }
            history.push(leader_report.score);
            tracing::debug!(
                generation,
                score = leader_report.score,
                completions = leader_report.completions,
                violations = leader_report.violations,
                "Generation ranked"
            );

            let mut next: Vec<Individual> = evaluated
                .iter()
                .take(elite)
                .map(|(individual, _)| individual.clone())
                .collect();
            while next.len() < population_size {
                let first = self.tournament(&evaluated, rng);
                let second = self.tournament(&evaluated, rng);
                let mut child = self.crossover(first, second, rng);
                if rng.random::<f64>() < self.config.mutation_rate {
                    self.mutate(&mut child, rng);
                }
                next.push(child);
            }
            population = next;
        }

        let (best, report) = match best {
            Some(found) => found,
            None => self.rank(population).swap_remove(0),
        };

        tracing::info!(
            generations = self.config.generations,
            population = population_size,
            score = report.score,
            completions = report.completions,
            "Genetic search finished"
        );

        GeneticOutcome {
            best,
            report,
            history,
        }
    }

    /// Spread deliveries over drones in random order, preferring drones that
    /// can still make the window. Parcels no drone can lift stay out.
    pub fn random_individual<R: Rng>(&self, rng: &mut R) -> Individual {
        let mut individual = self.empty_individual();
        let mut order: Vec<DeliveryId> = self.graph.delivery_ids().collect();
        order.shuffle(rng);

        for id in order {
            let Some(delivery) = self.graph.delivery(id) else {
                continue;
            };
            if let Some(drone_id) = self.pick_drone(&individual, delivery, rng) {
                individual.entry(drone_id).or_default().push(id);
            }
        }

        individual
    }

    pub fn fitness(&self, individual: &Individual) -> FitnessReport {
        let mut completions = 0usize;
        let mut energy = 0.0;
        let mut violations = 0u32;

        for drone in self.drones {
            let Some(ids) = individual.get(&drone.id) else {
                continue;
            };
            let replay = self.replay_route(drone, ids);
            completions += replay.route.stops.len();
            energy += replay.route.energy;
            violations += replay.violations;
        }

        let score = completions as f64 * self.config.completion_reward
            - energy * self.config.energy_weight
            - f64::from(violations) * self.config.violation_penalty;

        FitnessReport {
            completions,
            energy,
            violations,
            score,
        }
    }

    /// Fly `ids` in order from the drone's fresh state. Only completions become
    /// stops; every flown leg counts towards distance and energy.
    pub fn replay_route(&self, drone: &Drone, ids: &[DeliveryId]) -> RouteReplay {
        let mut state = LegState::from(&drone.fresh_state());
        let mut route = DroneRoute::new(drone.id);
        let mut violations = 0u32;

        for id in ids {
            let Some(delivery) = self.graph.delivery(*id) else {
                violations += 1;
                continue;
            };
            let step = self.model.replay(drone, delivery, &state);
            violations += step.violations();
            if let ReplayStep::Flown { leg, .. } = &step {
                route.record_leg(leg);
                if step.is_completion() {
                    route.stops.push(RouteStop::from_leg(delivery, leg));
                }
                state = leg.next_state();
            }
        }

        RouteReplay { route, violations }
    }

    /// Prefix of one parent's route joined with a suffix of the other's, per
    /// drone. Deliveries lost on the way are reassigned afterwards.
    pub fn crossover<R: Rng>(
        &self,
        first: &Individual,
        second: &Individual,
        rng: &mut R,
    ) -> Individual {
        let mut child = self.empty_individual();
        let mut assigned: BTreeSet<DeliveryId> = BTreeSet::new();
        let empty = Vec::new();

        for drone in self.drones {
            let left = first.get(&drone.id).unwrap_or(&empty);
            let right = second.get(&drone.id).unwrap_or(&empty);

            let candidates: Vec<DeliveryId> = match (left.is_empty(), right.is_empty()) {
                (false, false) => {
                    let cut_left = rng.random_range(0..=left.len());
                    let cut_right = rng.random_range(0..=right.len());
                    left[..cut_left]
                        .iter()
                        .chain(&right[cut_right..])
                        .copied()
                        .collect()
                }
                (false, true) => left[..left.len() / 2].to_vec(),
                (true, false) => right[..right.len() / 2].to_vec(),
                (true, true) => Vec::new(),
            };

            let route = child.entry(drone.id).or_default();
            for id in candidates {
                if assigned.insert(id) {
                    route.push(id);
                }
            }
        }

        let missing: Vec<DeliveryId> = self
            .graph
            .delivery_ids()
            .filter(|id| !assigned.contains(id))
            .collect();
        for id in missing {
            let Some(delivery) = self.graph.delivery(id) else {
                continue;
            };
            if let Some(drone_id) = self.pick_drone(&child, delivery, rng) {
                child.entry(drone_id).or_default().push(id);
            }
        }

        child
    }

    /// Apply one of the four operators, chosen uniformly.
    pub fn mutate<R: Rng>(&self, individual: &mut Individual, rng: &mut R) {
        let Some(&mutation) = MUTATIONS.choose(rng) else {
            return;
        };
        match mutation {
            Mutation::Swap => self.swap_between_drones(individual, rng),
            Mutation::Move => self.move_delivery(individual, rng),
            Mutation::Reverse => reverse_segment(individual, rng),
            Mutation::Shuffle => shuffle_segment(individual, rng),
        }
    }

    fn swap_between_drones<R: Rng>(&self, individual: &mut Individual, rng: &mut R) {
        let busy = busy_drones(individual, 1);
        let picked: Vec<DroneId> = busy.choose_multiple(rng, 2).copied().collect();
        let &[first, second] = picked.as_slice() else {
            return;
        };
        let (Some(first_drone), Some(second_drone)) = (self.drone(first), self.drone(second)) else {
            return;
        };

        let first_len = individual.get(&first).map_or(0, Vec::len);
        let second_len = individual.get(&second).map_or(0, Vec::len);
        if first_len == 0 || second_len == 0 {
            return;
        }
        let i = rng.random_range(0..first_len);
        let j = rng.random_range(0..second_len);

        let a = individual[&first][i];
        let b = individual[&second][j];
        let (Some(parcel_a), Some(parcel_b)) = (self.graph.delivery(a), self.graph.delivery(b)) else {
            return;
        };
        if !second_drone.can_lift(parcel_a) || !first_drone.can_lift(parcel_b) {
            return;
        }

        if let Some(route) = individual.get_mut(&first) {
            route[i] = b;
        }
        if let Some(route) = individual.get_mut(&second) {
            route[j] = a;
        }
    }

    fn move_delivery<R: Rng>(&self, individual: &mut Individual, rng: &mut R) {
        let busy = busy_drones(individual, 1);
        let Some(&source) = busy.choose(rng) else {
            return;
        };
        let Some(route) = individual.get_mut(&source) else {
            return;
        };
        let index = rng.random_range(0..route.len());
        let id = route.remove(index);

        let targets: Vec<DroneId> = match self.graph.delivery(id) {
            Some(delivery) => self
                .drones
                .iter()
                .filter(|drone| drone.id != source && drone.can_lift(delivery))
                .map(|drone| drone.id)
                .collect(),
            None => Vec::new(),
        };

        match targets.choose(rng) {
            Some(&target) => individual.entry(target).or_default().push(id),
            None => {
                if let Some(route) = individual.get_mut(&source) {
                    route.insert(index, id);
                }
            }
        }
    }

    fn tournament<'p, R: Rng>(
        &self,
        evaluated: &'p [(Individual, FitnessReport)],
        rng: &mut R,
    ) -> &'p Individual {
        let size = self.config.tournament_size.clamp(1, evaluated.len());
        evaluated
            .choose_multiple(rng, size)
            .max_by(|a, b| a.1.score.total_cmp(&b.1.score))
            .map(|(individual, _)| individual)
            .unwrap_or(&evaluated[0].0)
    }

    /// Score every individual, best first.
    fn rank(&self, population: Vec<Individual>) -> Vec<(Individual, FitnessReport)> {
        let mut evaluated: Vec<(Individual, FitnessReport)> = population
            .into_iter()
            .map(|individual| {
                let report = self.fitness(&individual);
                (individual, report)
            })
            .collect();
        evaluated.sort_by(|a, b| b.1.score.total_cmp(&a.1.score));
        evaluated
    }

    /// Uniform pick among drones that can lift the parcel and still make its
    /// window after their current list, else among drones that can lift it.
    fn pick_drone<R: Rng>(
        &self,
        individual: &Individual,
        delivery: &Delivery,
        rng: &mut R,
    ) -> Option<DroneId> {
        let capable: Vec<&Drone> = self
            .drones
            .iter()
            .filter(|drone| drone.can_lift(delivery))
            .collect();
        let on_time: Vec<&Drone> = capable
            .iter()
            .copied()
            .filter(|drone| {
                let route = individual.get(&drone.id).map_or(&[][..], Vec::as_slice);
                self.can_deliver_in_time(drone, delivery, route)
            })
            .collect();

        let pool = if on_time.is_empty() { &capable } else { &on_time };
        pool.choose(rng).map(|drone| drone.id)
    }

    /// Replays `route`, then checks the raw arrival at `delivery` against its window.
    fn can_deliver_in_time(&self, drone: &Drone, delivery: &Delivery, route: &[DeliveryId]) -> bool {
        let mut state = LegState::from(&drone.fresh_state());
        for parcel in route.iter().filter_map(|id| self.graph.delivery(*id)) {
            if let ReplayStep::Flown { leg, .. } = self.model.replay(drone, parcel, &state) {
                state = leg.next_state();
            }
        }

        match self.model.replay(drone, delivery, &state) {
            ReplayStep::Flown { leg, .. } => delivery.window.contains(leg.arrival_time),
            ReplayStep::Skipped(_) => false,
        }
    }

    fn drone(&self, id: DroneId) -> Option<&'a Drone> {
        self.drones.iter().find(|drone| drone.id == id)
    }

    fn empty_individual(&self) -> Individual {
        self.drones.iter().map(|drone| (drone.id, Vec::new())).collect()
    }
}

/// Drones holding at least `min_len` deliveries.
fn busy_drones(individual: &Individual, min_len: usize) -> Vec<DroneId> {
    individual
        .iter()
        .filter(|(_, route)| route.len() >= min_len)
        .map(|(id, _)| *id)
        .collect()
}

fn reverse_segment<R: Rng>(individual: &mut Individual, rng: &mut R) {
    let busy = busy_drones(individual, 2);
    let Some(route) = busy.choose(rng).and_then(|id| individual.get_mut(id)) else {
        return;
    };
    let start = rng.random_range(0..=route.len() - 2);
    let end = rng.random_range(start + 2..=route.len());
    route[start..end].reverse();
}

fn shuffle_segment<R: Rng>(individual: &mut Individual, rng: &mut R) {
    let busy = busy_drones(individual, 3);
    let Some(route) = busy.choose(rng).and_then(|id| individual.get_mut(id)) else {
        return;
    };
    let start = rng.random_range(0..=route.len() - 3);
    let end = rng.random_range(start + 3..=route.len());
    route[start..end].shuffle(rng);
}
