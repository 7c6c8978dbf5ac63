//! Greedy multi-drone coordinator.
//!
//! Drones take turns in input order. Each turn repeatedly searches the shared
//! pool from the drone's live state, commits only the first delivery of the
//! returned path and searches again, until the pool is empty or no path is
//! found.

use serde::{Deserialize, Serialize};

use crate::cost::{CostModel, Leg, LegState, Rejection};
use crate::error::PlanResult;
use crate::graph::DeliveryGraph;
use crate::ledger::AssignmentLedger;
use crate::metrics::{DroneRoute, RouteStop};
use crate::models::{Delivery, DeliveryId, Drone, DroneId, DroneState};
use crate::rules::PlannerConfig;
use crate::search::PathSearch;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnEndReason {
    /// Search returned nothing for the remaining pool
    NoFeasiblePath { remaining: usize },
    /// First hop of a returned path failed re-evaluation
    LegRejected {
        delivery_id: DeliveryId,
        rejection: Rejection,
    },
    /// First hop of a returned path is not in the delivery graph
    UnknownDelivery { delivery_id: DeliveryId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnDiagnostic {
    pub drone_id: DroneId,
    pub reason: TurnEndReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorOutcome {
    pub routes: Vec<DroneRoute>,
    pub diagnostics: Vec<TurnDiagnostic>,
    /// Path searches issued across all turns
    pub searches: usize,
}

pub struct Coordinator<'a> {
    graph: &'a DeliveryGraph,
    drones: &'a [Drone],
    config: &'a PlannerConfig,
}

impl<'a> Coordinator<'a> {
    pub fn new(graph: &'a DeliveryGraph, drones: &'a [Drone], config: &'a PlannerConfig) -> Self {
        Self {
            graph,
            drones,
            config,
        }
    }

    /// One turn per drone in input order, assigning into `ledger`.
    pub fn run(&self, ledger: &mut AssignmentLedger) -> PlanResult<CoordinatorOutcome> {
        let model = CostModel::new(self.graph.zones(), self.config);
        let mut routes = Vec::with_capacity(self.drones.len());
        let mut diagnostics = Vec::new();
        let mut searches = 0usize;

        for drone in self.drones {
            let search = PathSearch::new(self.graph, drone, self.config);
            let mut state = drone.fresh_state();
            let mut route = DroneRoute::new(drone.id);

            while !ledger.is_complete() {
                let outcome = search.find_path(&LegState::from(&state), ledger.unassigned());
                searches += 1;

                let Some(&delivery_id) = outcome.path.first() else {
                    let remaining = ledger.unassigned().len();
                    tracing::warn!(drone_id = drone.id, remaining, "No feasible path, ending turn");
                    diagnostics.push(TurnDiagnostic {
                        drone_id: drone.id,
                        reason: TurnEndReason::NoFeasiblePath { remaining },
                    });
                    break;
                };
                let (delivery, leg) = match self.first_leg(&model, drone, &state, delivery_id) {
                    Ok(found) => found,
                    Err(reason) => {
                        tracing::warn!(drone_id = drone.id, delivery_id, ?reason, "First hop rejected");
                        diagnostics.push(TurnDiagnostic {
                            drone_id: drone.id,
                            reason,
                        });
                        break;
                    }
                };

                ledger.assign(delivery_id, drone.id)?;
                leg.apply_to(&mut state, delivery.weight);
                route.record_leg(&leg);
                route.stops.push(RouteStop::from_leg(delivery, &leg));

                tracing::debug!(
                    drone_id = drone.id,
                    delivery_id,
                    clock = state.clock,
                    battery = state.battery,
                    recharged = leg.recharged(),
                    resolution = ?outcome.resolution,
                    "Assigned delivery"
                );
            }

            tracing::info!(
                drone_id = drone.id,
                deliveries = route.stops.len(),
                energy = route.energy,
                "Drone turn finished"
            );
            routes.push(route);
        }

        Ok(CoordinatorOutcome {
            routes,
            diagnostics,
            searches,
        })
    }

    /// Re-check the first hop of a search result against the live state.
    fn first_leg(
        &self,
        model: &CostModel<'_>,
        drone: &Drone,
        state: &DroneState,
        delivery_id: DeliveryId,
    ) -> Result<(&'a Delivery, Leg), TurnEndReason> {
        let delivery = self
            .graph
            .delivery(delivery_id)
            .ok_or(TurnEndReason::UnknownDelivery { delivery_id })?;
        model
            .evaluate(drone, delivery, &LegState::from(state))
            .map(|leg| (delivery, leg))
            .map_err(|rejection| TurnEndReason::LegRejected {
                delivery_id,
                rejection,
            })
    }
}
