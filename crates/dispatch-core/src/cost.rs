//! Feasibility and cost model shared by every planner.
//!
//! [`CostModel::evaluate`] gives the hard verdict used by the path search, its
//! greedy fallback and the coordinator. [`CostModel::replay`] runs the same
//! stages non-fatally for the genetic fitness. Both are built on
//! `prepare` and `zone_conflict`, so a leg is accepted by `evaluate` exactly
//! when `replay` flies it on time and clear of every active zone.

use serde::{Deserialize, Serialize};

use crate::geometry::{distance, point_in_polygon, segment_intersects_polygon_sampled};
use crate::models::{Delivery, DeliveryId, Drone, DroneState, NoFlyZone, Point, ZoneId};
use crate::rules::{EnergyRules, PlannerConfig};

/// Position, clock and battery a leg departs from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegState {
    pub position: Point,
    pub time: f64,
    pub battery: f64,
}

impl From<&DroneState> for LegState {
    fn from(state: &DroneState) -> Self {
        Self {
            position: state.position,
            time: state.clock,
            battery: state.battery,
        }
    }
}

/// A single flight from the current position to one delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    pub delivery_id: DeliveryId,
    pub destination: Point,
    pub distance: f64,
    pub energy: f64,
    pub travel_time: f64,
    pub recharge_delay: f64,
    pub wait_time: f64,
    /// Departure time + travel + recharge
    pub arrival_time: f64,
    /// Arrival clamped up to the window opening
    pub effective_arrival: f64,
    pub edge_cost: f64,
    pub time_cost: f64,
    pub battery_after: f64,
}

impl Leg {
    pub fn recharged(&self) -> bool {
        self.recharge_delay > 0.0
    }

    /// State after handing over the parcel.
    pub fn next_state(&self) -> LegState {
        LegState {
            position: self.destination,
            time: self.effective_arrival,
            battery: self.battery_after.max(0.0),
        }
    }

    /// Apply this leg to a drone's runtime state. `payload` is the weight
    /// just handed over.
    pub fn apply_to(&self, state: &mut DroneState, payload: f64) {
        let next = self.next_state();
        state.position = next.position;
        state.clock = next.time;
        state.battery = next.battery;
        state.last_payload = payload;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneHit {
    /// Straight path crosses the zone
    Route,
    /// Delivery point lies inside the zone
    Destination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConflict {
    pub zone_id: ZoneId,
    pub hit: ZoneHit,
}

/// Why a leg cannot be flown. Expected outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    Overweight { weight: f64, max_weight: f64 },
    /// Even a full battery cannot cover the leg
    EnergyDeficit { energy: f64, capacity: f64 },
    MissedWindow { arrival: f64, close: f64 },
    Zone(ZoneConflict),
}

/// Non-fatal evaluation of one leg during a route replay.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayStep {
    /// Weight or energy failure; the drone stays where it is.
    Skipped(Rejection),
    Flown {
        leg: Leg,
        late: bool,
        zone: Option<ZoneConflict>,
    },
}

impl ReplayStep {
    pub fn violations(&self) -> u32 {
        match self {
            ReplayStep::Skipped(_) => 1,
            ReplayStep::Flown { late, zone, .. } => u32::from(*late) + u32::from(zone.is_some()),
        }
    }

    pub fn is_completion(&self) -> bool {
        matches!(self, ReplayStep::Flown { late: false, zone: None, .. })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CostModel<'a> {
    zones: &'a [NoFlyZone],
    rules: &'a EnergyRules,
    sample_steps: usize,
}

impl<'a> CostModel<'a> {
    pub fn new(zones: &'a [NoFlyZone], config: &'a PlannerConfig) -> Self {
        Self {
            zones,
            rules: &config.energy,
            sample_steps: config.zone_sample_steps,
        }
    }

    pub fn zones(&self) -> &'a [NoFlyZone] {
        self.zones
    }

    pub fn sample_steps(&self) -> usize {
        self.sample_steps
    }

    /// Energy for carrying `weight` over `distance`.
    pub fn energy_for(&self, distance: f64, weight: f64) -> f64 {
        distance * self.rules.base_consumption * (1.0 + weight * self.rules.weight_factor)
    }

    /// Hard feasibility verdict for flying `drone` from `state` to `delivery`.
    pub fn evaluate(
        &self,
        drone: &Drone,
        delivery: &Delivery,
        state: &LegState,
    ) -> Result<Leg, Rejection> {
        let leg = self.prepare(drone, delivery, state)?;
        if leg.arrival_time > delivery.window.close {
            return Err(Rejection::MissedWindow {
                arrival: leg.arrival_time,
                close: delivery.window.close,
            });
        }
        if let Some(conflict) =
            self.zone_conflict(state.position, delivery.position, leg.effective_arrival)
        {
            return Err(Rejection::Zone(conflict));
        }
        Ok(leg)
    }

    /// Same stages as [`Self::evaluate`], reporting violations instead of stopping.
    pub fn replay(&self, drone: &Drone, delivery: &Delivery, state: &LegState) -> ReplayStep {
        match self.prepare(drone, delivery, state) {
            Err(rejection) => ReplayStep::Skipped(rejection),
            Ok(leg) => {
                let late = leg.arrival_time > delivery.window.close;
                let zone =
                    self.zone_conflict(state.position, delivery.position, leg.effective_arrival);
                ReplayStep::Flown { leg, late, zone }
            }
        }
    }

    /// Route crossing is reported ahead of a destination inside a zone.
    pub fn zone_conflict(&self, from: Point, to: Point, at: f64) -> Option<ZoneConflict> {
        let mut active = self.zones.iter().filter(|zone| zone.is_active_at(at));

        let crossed = active.clone().find(|zone| {
            segment_intersects_polygon_sampled(from, to, &zone.polygon, self.sample_steps)
        });
        if let Some(zone) = crossed {
            return Some(ZoneConflict {
                zone_id: zone.id,
                hit: ZoneHit::Route,
            });
        }

        active
            .find(|zone| point_in_polygon(to, &zone.polygon))
            .map(|zone| ZoneConflict {
                zone_id: zone.id,
                hit: ZoneHit::Destination,
            })
    }

    /// Weight, energy and timing stages.
    fn prepare(
        &self,
        drone: &Drone,
        delivery: &Delivery,
        state: &LegState,
    ) -> Result<Leg, Rejection> {
        if !drone.can_lift(delivery) {
            return Err(Rejection::Overweight {
                weight: delivery.weight,
                max_weight: drone.max_weight,
            });
        }

        let dist = distance(state.position, delivery.position);
        let energy = self.energy_for(dist, delivery.weight);

        let (battery_before, recharge_delay) = if energy > state.battery {
            (drone.battery, self.rules.recharge_delay)
        } else {
            (state.battery, 0.0)
        };
        if energy > battery_before {
            return Err(Rejection::EnergyDeficit {
                energy,
                capacity: drone.battery,
            });
        }

        let travel_time = dist / drone.speed;
        let arrival_time = state.time + travel_time + recharge_delay;
        let wait_time = (delivery.window.open - arrival_time).max(0.0);
        let effective_arrival = arrival_time.max(delivery.window.open);

        let priority_bonus =
            f64::from(delivery.priority.saturating_sub(1)) * self.rules.priority_discount;

        Ok(Leg {
            delivery_id: delivery.id,
            destination: delivery.position,
            distance: dist,
            energy,
            travel_time,
            recharge_delay,
            wait_time,
            arrival_time,
            effective_arrival,
            edge_cost: dist - priority_bonus,
            time_cost: travel_time + recharge_delay + wait_time,
            battery_after: (battery_before - energy).max(0.0),
        })
    }
}
