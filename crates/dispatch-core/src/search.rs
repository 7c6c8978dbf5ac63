//! Single-drone path search over delivery subsets.
//!
//! Tier 1 is a budget-bounded A* over (last delivery, visited set, time,
//! battery) states. When it runs out of budget or states, tier 2 builds a
//! greedy path from the same start. Every edge goes through
//! [`CostModel::evaluate`], so infeasible legs are pruned before scoring.

use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};

use crate::cost::{CostModel, LegState};
use crate::geometry::{distance, point_in_polygon, segment_intersects_polygon_sampled};
use crate::graph::DeliveryGraph;
use crate::models::{Delivery, DeliveryId, Drone, Point};
use crate::rules::{PlannerConfig, SearchConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    Searching,
    Exhausted,
    GreedyFallback,
    Done,
}

/// How a search produced its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Nothing was requested
    Empty,
    /// A* reached a state covering every target
    Optimal,
    /// Greedy path after A* exhaustion; may be partial or empty
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstarOutcome {
    Found {
        path: Vec<DeliveryId>,
        expansions: usize,
    },
    Exhausted {
        expansions: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub path: Vec<DeliveryId>,
    pub resolution: Resolution,
    pub expansions: usize,
}

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Exact state identity; floats compare bit for bit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StateKey {
    last: Option<DeliveryId>,
    visited: BTreeSet<DeliveryId>,
    time_bits: u64,
    battery_bits: u64,
}

#[derive(Debug, Clone)]
struct SearchNode {
    key: StateKey,
    leg_state: LegState,
    parent: Option<usize>,
    /// Delivery that led into this node
    via: Option<DeliveryId>,
}

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    f_score: FloatOrd,
    g_score: FloatOrd,
    seq: usize,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_score
            .cmp(&other.f_score)
            .then_with(|| self.g_score.cmp(&other.g_score))
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Arena of reached states plus the open list over them.
#[derive(Debug, Default)]
struct Frontier {
    arena: Vec<SearchNode>,
    open_set: BinaryHeap<Reverse<OpenNode>>,
    g_score: HashMap<StateKey, f64>,
}

impl Frontier {
    /// Queue `node` unless its state was already reached at an equal or lower g.
    fn offer(&mut self, node: SearchNode, g: f64, h: f64) -> bool {
        if self.g_score.get(&node.key).is_some_and(|&best| g >= best) {
            return false;
        }
        self.g_score.insert(node.key.clone(), g);

        let seq = self.arena.len();
        self.arena.push(node);
        self.open_set.push(Reverse(OpenNode {
            f_score: FloatOrd(g + h),
            g_score: FloatOrd(g),
            seq,
        }));
        true
    }

    fn pop(&mut self) -> Option<OpenNode> {
        self.open_set.pop().map(|Reverse(node)| node)
    }

    fn node(&self, seq: usize) -> &SearchNode {
        &self.arena[seq]
    }

    fn trace_path(&self, goal: usize) -> Vec<DeliveryId> {
        let mut path = Vec::new();
        let mut cursor = Some(goal);
        while let Some(index) = cursor {
            let node = &self.arena[index];
            if let Some(id) = node.via {
                path.push(id);
            }
            cursor = node.parent;
        }
        path.reverse();
        path
    }
}

/// Path search for one drone against a shared, read-only graph.
#[derive(Debug, Clone, Copy)]
pub struct PathSearch<'a> {
    graph: &'a DeliveryGraph,
    drone: &'a Drone,
    model: CostModel<'a>,
    config: &'a SearchConfig,
}

impl<'a> PathSearch<'a> {
    pub fn new(graph: &'a DeliveryGraph, drone: &'a Drone, config: &'a PlannerConfig) -> Self {
        Self {
            graph,
            drone,
            model: CostModel::new(graph.zones(), config),
            config: &config.search,
        }
    }

    /// Run A* and fall back to the greedy tier when it gives up.
    pub fn find_path(&self, start: &LegState, targets: &BTreeSet<DeliveryId>) -> SearchOutcome {
        let targets = self.known(targets);
        let mut phase = if targets.is_empty() {
            SearchPhase::Done
        } else {
            SearchPhase::Searching
        };
        let mut outcome = SearchOutcome {
            path: Vec::new(),
            resolution: Resolution::Empty,
            expansions: 0,
        };

        loop {
            phase = match phase {
                SearchPhase::Searching => match self.astar(start, &targets) {
                    AstarOutcome::Found { path, expansions } => {
                        outcome = SearchOutcome {
                            path,
                            resolution: Resolution::Optimal,
                            expansions,
                        };
                        SearchPhase::Done
                    }
                    AstarOutcome::Exhausted { expansions } => {
                        outcome.expansions = expansions;
                        SearchPhase::Exhausted
                    }
                },
                SearchPhase::Exhausted => {
                    tracing::debug!(
                        drone_id = self.drone.id,
                        targets = targets.len(),
                        expansions = outcome.expansions,
                        "A* exhausted, switching to greedy fallback"
                    );
                    SearchPhase::GreedyFallback
                }
                SearchPhase::GreedyFallback => {
                    outcome.path = self.greedy_fallback(start, &targets);
                    outcome.resolution = Resolution::Fallback;
                    SearchPhase::Done
                }
                SearchPhase::Done => break,
            };
        }

        outcome
    }

    /// Tier 1. Stops on the first popped state that covers every target.
    pub fn astar(&self, start: &LegState, targets: &BTreeSet<DeliveryId>) -> AstarOutcome {
        let targets = self.known(targets);
        if targets.is_empty() {
            return AstarOutcome::Found {
                path: Vec::new(),
                expansions: 0,
            };
        }

        let start_key = StateKey {
            last: None,
            visited: BTreeSet::new(),
            time_bits: start.time.to_bits(),
            battery_bits: start.battery.to_bits(),
        };

        let mut frontier = Frontier::default();
        let mut closed_set: HashSet<StateKey> = HashSet::new();

        let start_h = self.heuristic(start.position, start.time, targets.iter().copied());
        frontier.offer(
            SearchNode {
                key: start_key,
                leg_state: *start,
                parent: None,
                via: None,
            },
            0.0,
            start_h,
        );

        let mut expansions = 0usize;
        while expansions < self.config.max_expansions {
            let Some(current) = frontier.pop() else {
                break;
            };
            let node = frontier.node(current.seq).clone();
            if !closed_set.insert(node.key.clone()) {
                continue;
            }
            expansions += 1;

            if node.key.visited == targets {
                return AstarOutcome::Found {
                    path: frontier.trace_path(current.seq),
                    expansions,
                };
            }

            for &next_id in targets.difference(&node.key.visited) {
                let Some(delivery) = self.graph.delivery(next_id) else {
                    continue;
                };
                let Ok(leg) = self.model.evaluate(self.drone, delivery, &node.leg_state) else {
                    continue;
                };

                let next = leg.next_state();
                let mut visited = node.key.visited.clone();
                visited.insert(next_id);
                let key = StateKey {
                    last: Some(next_id),
                    visited,
                    time_bits: next.time.to_bits(),
                    battery_bits: next.battery.to_bits(),
                };

                let h_score = self.heuristic(
                    next.position,
                    next.time,
                    targets.difference(&key.visited).copied(),
                );
                frontier.offer(
                    SearchNode {
                        key,
                        leg_state: next,
                        parent: Some(current.seq),
                        via: Some(next_id),
                    },
                    current.g_score.0 + leg.edge_cost,
                    h_score,
                );
            }
        }

        AstarOutcome::Exhausted { expansions }
    }

    /// Tier 2. Repeatedly takes the feasible delivery with the lowest
    /// distance minus weighted priority until none is left.
    pub fn greedy_fallback(
        &self,
        start: &LegState,
        targets: &BTreeSet<DeliveryId>,
    ) -> Vec<DeliveryId> {
        let mut remaining = self.known(targets);
        let mut state = *start;
        let mut path = Vec::new();

        loop {
            let mut best: Option<(f64, DeliveryId, LegState)> = None;
            for &id in &remaining {
                let Some(delivery) = self.graph.delivery(id) else {
                    continue;
                };
                let Ok(leg) = self.model.evaluate(self.drone, delivery, &state) else {
                    continue;
                };
                let score =
                    leg.distance - f64::from(delivery.priority) * self.config.greedy_priority_weight;
                if best.as_ref().is_none_or(|(best_score, _, _)| score < *best_score) {
                    best = Some((score, id, leg.next_state()));
                }
            }

            let Some((_, id, next)) = best else {
                break;
            };
            path.push(id);
            remaining.remove(&id);
            state = next;
        }

        path
    }

    /// Cheapest straight hop to any remaining delivery, inflated for zones
    /// active at the estimated arrival. Zero when nothing remains.
    pub fn heuristic(
        &self,
        from: Point,
        time: f64,
        remaining: impl IntoIterator<Item = DeliveryId>,
    ) -> f64 {
        remaining
            .into_iter()
            .filter_map(|id| self.graph.delivery(id))
            .map(|delivery| {
                let dist = distance(from, delivery.position);
                dist + self.zone_penalty(from, delivery, time + dist / self.drone.speed)
            })
            .min_by(f64::total_cmp)
            .unwrap_or(0.0)
    }

    fn zone_penalty(&self, from: Point, delivery: &Delivery, at: f64) -> f64 {
        self.model
            .zones()
            .iter()
            .filter(|zone| zone.is_active_at(at))
            .map(|zone| {
                let mut penalty = 0.0;
                if segment_intersects_polygon_sampled(
                    from,
                    delivery.position,
                    &zone.polygon,
                    self.model.sample_steps(),
                ) {
                    penalty += self.config.route_zone_penalty;
                }
                if point_in_polygon(delivery.position, &zone.polygon) {
                    penalty += self.config.destination_zone_penalty;
                }
                penalty
            })
            .sum()
    }

    fn known(&self, targets: &BTreeSet<DeliveryId>) -> BTreeSet<DeliveryId> {
        targets
            .iter()
            .copied()
            .filter(|id| self.graph.delivery(*id).is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NoFlyZone, TimeWindow};

    fn drone() -> Drone {
        Drone {
            id: 1,
            max_weight: 10.0,
            battery: 10_000.0,
            speed: 1.0,
            start: Point::new(0.0, 0.0),
        }
    }

    fn delivery(id: DeliveryId, x: f64, y: f64, priority: u8) -> Delivery {
        Delivery {
            id,
            position: Point::new(x, y),
            weight: 1.0,
            priority,
            window: TimeWindow::new(0.0, 1_000.0),
        }
    }

    fn start(drone: &Drone) -> LegState {
        LegState::from(&drone.fresh_state())
    }

    fn all(graph: &DeliveryGraph) -> BTreeSet<DeliveryId> {
        graph.delivery_ids().collect()
    }

    #[test]
    fn empty_target_set_returns_immediately() {
        let graph = DeliveryGraph::new(&[delivery(1, 1.0, 0.0, 1)], &[]);
        let drone = drone();
        let config = PlannerConfig::default();
        let search = PathSearch::new(&graph, &drone, &config);

        let outcome = search.find_path(&start(&drone), &BTreeSet::new());
        assert!(outcome.path.is_empty());
        assert_eq!(outcome.resolution, Resolution::Empty);
        assert_eq!(outcome.expansions, 0);
    }

    #[test]
    fn astar_covers_collinear_deliveries_in_order() {
        let graph = DeliveryGraph::new(
            &[
                delivery(1, 1.0, 0.0, 1),
                delivery(2, 2.0, 0.0, 1),
                delivery(3, 3.0, 0.0, 1),
            ],
            &[],
        );
        let drone = drone();
        let config = PlannerConfig::default();
        let search = PathSearch::new(&graph, &drone, &config);

        match search.astar(&start(&drone), &all(&graph)) {
            AstarOutcome::Found { path, expansions } => {
                assert_eq!(path, vec![1, 2, 3]);
                assert!(expansions <= config.search.max_expansions);
            }
            other => panic!("expected a goal state, got {other:?}"),
        }
    }

    #[test]
    fn spent_budget_falls_back_to_greedy() {
        let graph = DeliveryGraph::new(
            &[
                delivery(1, 1.0, 0.0, 1),
                delivery(2, 2.0, 0.0, 1),
                delivery(3, 3.0, 0.0, 1),
            ],
            &[],
        );
        let drone = drone();
        let mut config = PlannerConfig::default();
        config.search.max_expansions = 1;
        let search = PathSearch::new(&graph, &drone, &config);

        assert_eq!(
            search.astar(&start(&drone), &all(&graph)),
            AstarOutcome::Exhausted { expansions: 1 }
        );

        let outcome = search.find_path(&start(&drone), &all(&graph));
        assert_eq!(outcome.resolution, Resolution::Fallback);
        assert_eq!(outcome.path, vec![1, 2, 3]);
    }

    #[test]
    fn greedy_prefers_high_priority_when_close() {
        // 5 - 1*2 = 3 versus 6 - 5*2 = -4
        let graph = DeliveryGraph::new(&[delivery(1, 5.0, 0.0, 1), delivery(2, 0.0, 6.0, 5)], &[]);
        let drone = drone();
        let config = PlannerConfig::default();
        let search = PathSearch::new(&graph, &drone, &config);

        let path = search.greedy_fallback(&start(&drone), &all(&graph));
        assert_eq!(path.first(), Some(&2));
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn unreachable_targets_give_empty_fallback() {
        let mut weak = drone();
        weak.battery = 5.0;
        let graph = DeliveryGraph::new(&[delivery(1, 10.0, 0.0, 1), delivery(2, 20.0, 0.0, 1)], &[]);
        let config = PlannerConfig::default();
        let search = PathSearch::new(&graph, &weak, &config);

        let outcome = search.find_path(&start(&weak), &all(&graph));
        assert_eq!(outcome.resolution, Resolution::Fallback);
        assert!(outcome.path.is_empty());
        assert_eq!(outcome.expansions, 1);
    }

    #[test]
    fn partial_coverage_returns_feasible_subset() {
        let mut late = delivery(2, 50.0, 0.0, 1);
        late.window = TimeWindow::new(0.0, 10.0);
        let graph = DeliveryGraph::new(&[delivery(1, 1.0, 0.0, 1), late], &[]);
        let drone = drone();
        let config = PlannerConfig::default();
        let search = PathSearch::new(&graph, &drone, &config);

        let outcome = search.find_path(&start(&drone), &all(&graph));
        assert_eq!(outcome.resolution, Resolution::Fallback);
        assert_eq!(outcome.path, vec![1]);
    }

    #[test]
    fn heuristic_adds_zone_penalties() {
        let zone = NoFlyZone {
            id: 1,
            polygon: vec![
                Point::new(8.0, -2.0),
                Point::new(12.0, -2.0),
                Point::new(12.0, 2.0),
                Point::new(8.0, 2.0),
            ],
            active: TimeWindow::new(0.0, 100.0),
        };
        let graph = DeliveryGraph::new(&[delivery(1, 10.0, 0.0, 1)], &[zone]);
        let drone = drone();
        let config = PlannerConfig::default();
        let search = PathSearch::new(&graph, &drone, &config);

        let h = search.heuristic(Point::new(0.0, 0.0), 0.0, [1]);
        assert!((h - (10.0 + 50.0 + 100.0)).abs() < 1e-9, "got {h}");

        // Estimated arrival 210 is after the zone closes.
        let later = search.heuristic(Point::new(0.0, 0.0), 200.0, [1]);
        assert!((later - 10.0).abs() < 1e-9, "got {later}");

        assert_eq!(search.heuristic(Point::new(0.0, 0.0), 0.0, []), 0.0);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let graph = DeliveryGraph::new(&[delivery(1, 1.0, 0.0, 1)], &[]);
        let drone = drone();
        let config = PlannerConfig::default();
        let search = PathSearch::new(&graph, &drone, &config);

        let targets: BTreeSet<DeliveryId> = [1, 99].into_iter().collect();
        let outcome = search.find_path(&start(&drone), &targets);
        assert_eq!(outcome.path, vec![1]);
        assert_eq!(outcome.resolution, Resolution::Optimal);
    }

    fn open(f: f64, g: f64, seq: usize) -> Reverse<OpenNode> {
        Reverse(OpenNode {
            f_score: FloatOrd(f),
            g_score: FloatOrd(g),
            seq,
        })
    }

    fn reached(visited: &[DeliveryId], time: f64, battery: f64) -> SearchNode {
        SearchNode {
            key: StateKey {
                last: visited.last().copied(),
                visited: visited.iter().copied().collect(),
                time_bits: time.to_bits(),
                battery_bits: battery.to_bits(),
            },
            leg_state: LegState {
                position: Point::new(1.0, 0.0),
                time,
                battery,
            },
            parent: Some(0),
            via: visited.last().copied(),
        }
    }

    #[test]
    fn open_list_pops_lowest_f_then_lowest_g_then_oldest() {
        let mut open_set = BinaryHeap::new();
        open_set.push(open(5.0, 3.0, 0));
        open_set.push(open(5.0, 1.0, 1));
        open_set.push(open(4.0, 4.0, 2));
        open_set.push(open(5.0, 1.0, 3));
        open_set.push(open(6.0, 0.0, 4));

        let order: Vec<usize> = std::iter::from_fn(|| open_set.pop())
            .map(|Reverse(node)| node.seq)
            .collect();
        assert_eq!(order, vec![2, 1, 3, 0, 4]);
    }

    #[test]
    fn state_is_requeued_only_when_g_strictly_improves() {
        let mut frontier = Frontier::default();

        assert!(frontier.offer(reached(&[1, 2], 10.0, 50.0), 7.0, 1.0));
        assert!(!frontier.offer(reached(&[1, 2], 10.0, 50.0), 7.0, 1.0));
        assert!(!frontier.offer(reached(&[1, 2], 10.0, 50.0), 9.0, 0.0));
        assert_eq!(frontier.arena.len(), 1);
        assert_eq!(frontier.open_set.len(), 1);

        // Same deliveries but a different battery is a different state.
        assert!(frontier.offer(reached(&[1, 2], 10.0, 49.0), 7.0, 1.0));
        assert!(frontier.offer(reached(&[1, 2], 10.0, 50.0), 6.5, 1.0));
        assert_eq!(frontier.arena.len(), 3);
        assert_eq!(frontier.open_set.len(), 3);

        assert_eq!(frontier.pop().map(|node| node.seq), Some(2));
        assert_eq!(frontier.g_score[&reached(&[1, 2], 10.0, 50.0).key], 6.5);
    }

    #[test]
    fn mirrored_orders_meet_in_one_state() {
        // 1 -> 2 and 2 -> 1 fly the same legs in swapped order, and both wait
        // for 3's window, so the goal key is identical either way.
        let mut goal = delivery(3, 0.0, 5.0, 1);
        goal.window = TimeWindow::new(500.0, 1_000.0);
        let graph =
            DeliveryGraph::new(&[delivery(1, 1.0, 0.0, 1), delivery(2, -1.0, 0.0, 1), goal], &[]);
        let drone = drone();
        let config = PlannerConfig::default();
        let search = PathSearch::new(&graph, &drone, &config);

        match search.astar(&start(&drone), &all(&graph)) {
            AstarOutcome::Found { path, .. } => {
                assert_eq!(path.len(), 3);
                assert_eq!(path.last(), Some(&3));
            }
            other => panic!("expected a goal state, got {other:?}"),
        }
    }
}
