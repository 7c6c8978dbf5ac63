//! Core data models for the dispatch planner.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{PlanError, PlanResult};

pub type DeliveryId = u32;
pub type DroneId = u32;
pub type ZoneId = u32;

/// Planar position in abstract distance units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Closed time interval `[open, close]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub open: f64,
    pub close: f64,
}

impl TimeWindow {
    pub const fn new(open: f64, close: f64) -> Self {
        Self { open, close }
    }

    /// Inclusive at both ends.
    pub fn contains(&self, t: f64) -> bool {
        self.open <= t && t <= self.close
    }

    fn validate(&self, owner: impl FnOnce() -> String) -> PlanResult<()> {
        if !self.open.is_finite() || !self.close.is_finite() || self.open > self.close {
            return Err(PlanError::InvalidTimeWindow {
                owner: owner(),
                open: self.open,
                close: self.close,
            });
        }
        Ok(())
    }
}

/// A parcel waiting to be dropped at a fixed position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: DeliveryId,
    pub position: Point,
    pub weight: f64,
    /// 1 (lowest) to 5 (highest)
    pub priority: u8,
    pub window: TimeWindow,
}

impl Delivery {
    pub fn validate(&self) -> PlanResult<()> {
        let invalid = |reason: &str| PlanError::InvalidDelivery {
            delivery_id: self.id,
            reason: reason.to_string(),
        };

        if !self.position.is_finite() {
            return Err(invalid("position must be finite"));
        }
        if !(self.weight.is_finite() && self.weight > 0.0) {
            return Err(invalid("weight must be positive"));
        }
        if !(1..=5).contains(&self.priority) {
            return Err(invalid("priority must be between 1 and 5"));
        }
        self.window.validate(|| format!("delivery {}", self.id))
    }
}

/// Static drone specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drone {
    pub id: DroneId,
    pub max_weight: f64,
    /// Full battery capacity in energy units
    pub battery: f64,
    pub speed: f64,
    pub start: Point,
}

impl Drone {
    /// Runtime state at the beginning of a planning run.
    pub fn fresh_state(&self) -> DroneState {
        DroneState {
            position: self.start,
            battery: self.battery,
            last_payload: 0.0,
            clock: 0.0,
        }
    }

    pub fn can_lift(&self, delivery: &Delivery) -> bool {
        delivery.weight <= self.max_weight
    }

    pub fn validate(&self) -> PlanResult<()> {
        let invalid = |reason: &str| PlanError::InvalidDroneSpec {
            drone_id: self.id,
            reason: reason.to_string(),
        };

        if !(self.max_weight.is_finite() && self.max_weight > 0.0) {
            return Err(invalid("max_weight must be positive"));
        }
        if !(self.battery.is_finite() && self.battery > 0.0) {
            return Err(invalid("battery must be positive"));
        }
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(invalid("speed must be positive"));
        }
        if !self.start.is_finite() {
            return Err(invalid("start position must be finite"));
        }
        Ok(())
    }
}

/// Mutable per-run drone state. Never shared between planning runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneState {
    pub position: Point,
    pub battery: f64,
    /// Weight of the most recently delivered parcel; zero before the first hand-over
    pub last_payload: f64,
    pub clock: f64,
}

/// Polygonal airspace closed for a time interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoFlyZone {
    pub id: ZoneId,
    /// Ordered vertices; the ring is closed implicitly.
    pub polygon: Vec<Point>,
    pub active: TimeWindow,
}

impl NoFlyZone {
    pub fn is_active_at(&self, t: f64) -> bool {
        self.active.contains(t)
    }

    pub fn validate(&self) -> PlanResult<()> {
        if self.polygon.len() < 3 {
            return Err(PlanError::InvalidGeometry {
                zone_id: self.id,
                reason: format!(
                    "polygon must have at least 3 vertices, got {}",
                    self.polygon.len()
                ),
            });
        }
        if self.polygon.iter().any(|p| !p.is_finite()) {
            return Err(PlanError::InvalidGeometry {
                zone_id: self.id,
                reason: "polygon vertices must be finite".to_string(),
            });
        }
        self.active.validate(|| format!("zone {}", self.id))
    }
}

/// Typed input bundle handed to the planner by a loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub drones: Vec<Drone>,
    pub deliveries: Vec<Delivery>,
    #[serde(default)]
    pub zones: Vec<NoFlyZone>,
}

impl Scenario {
    /// Check every record and reject duplicate ids.
    pub fn validate(&self) -> PlanResult<()> {
        let mut seen = HashSet::new();
        for drone in &self.drones {
            drone.validate()?;
            if !seen.insert(drone.id) {
                return Err(PlanError::DuplicateId {
                    kind: "drone",
                    id: drone.id,
                });
            }
        }

        seen.clear();
        for delivery in &self.deliveries {
            delivery.validate()?;
            if !seen.insert(delivery.id) {
                return Err(PlanError::DuplicateId {
                    kind: "delivery",
                    id: delivery.id,
                });
            }
        }

        seen.clear();
        for zone in &self.zones {
            zone.validate()?;
            if !seen.insert(zone.id) {
                return Err(PlanError::DuplicateId {
                    kind: "zone",
                    id: zone.id,
                });
            }
        }
        Ok(())
    }
}
