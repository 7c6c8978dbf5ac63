//! Route records and summary statistics for a planning run.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cost::{CostModel, Leg};
use crate::geometry::distance;
use crate::graph::DeliveryGraph;
use crate::models::{Delivery, DeliveryId, Drone, DroneId, Point};

/// One completed hand-over on a drone's route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStop {
    pub delivery_id: DeliveryId,
    pub position: Point,
    pub arrival_time: f64,
    pub weight: f64,
    pub priority: u8,
}

impl RouteStop {
    pub fn from_leg(delivery: &Delivery, leg: &Leg) -> Self {
        Self {
            delivery_id: delivery.id,
            position: delivery.position,
            arrival_time: leg.arrival_time,
            weight: delivery.weight,
            priority: delivery.priority,
        }
    }
}

/// Ordered stops of one drone plus the distance and energy it flew.
///
/// Totals count every flown leg, which for genetic plans can include legs
/// that arrived late or crossed a zone and therefore have no stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneRoute {
    pub drone_id: DroneId,
    pub stops: Vec<RouteStop>,
    pub distance: f64,
    pub energy: f64,
}

impl DroneRoute {
    pub fn new(drone_id: DroneId) -> Self {
        Self {
            drone_id,
            stops: Vec::new(),
            distance: 0.0,
            energy: 0.0,
        }
    }

    pub fn record_leg(&mut self, leg: &Leg) {
        self.distance += leg.distance;
        self.energy += leg.energy;
    }

    pub fn delivery_ids(&self) -> Vec<DeliveryId> {
        self.stops.iter().map(|stop| stop.delivery_id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub completed: usize,
    pub total_deliveries: usize,
    /// Percent of requested deliveries completed
    pub completion_rate: f64,
    pub total_energy: f64,
    pub total_distance: f64,
    pub avg_energy_per_delivery: f64,
    #[serde(with = "duration_secs")]
    pub execution_time: Duration,
    pub final_fitness: Option<f64>,
}

impl RunMetrics {
    pub fn from_routes(
        routes: &[DroneRoute],
        total_deliveries: usize,
        execution_time: Duration,
        final_fitness: Option<f64>,
    ) -> Self {
        let completed: usize = routes.iter().map(|route| route.stops.len()).sum();
        let total_energy: f64 = routes.iter().map(|route| route.energy).sum();
        let total_distance: f64 = routes.iter().map(|route| route.distance).sum();

        let completion_rate = if total_deliveries == 0 {
            0.0
        } else {
            completed as f64 / total_deliveries as f64 * 100.0
        };
        let avg_energy_per_delivery = if completed == 0 {
            0.0
        } else {
            total_energy / completed as f64
        };

        Self {
            completed,
            total_deliveries,
            completion_rate,
            total_energy,
            total_distance,
            avg_energy_per_delivery,
            execution_time,
            final_fitness,
        }
    }
}

/// Straight-line statistics for an ordered delivery path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStatistics {
    pub total_distance: f64,
    pub total_time: f64,
    pub total_energy: f64,
    pub path_length: usize,
    pub average_priority: f64,
    /// Distance per energy unit
    pub energy_efficiency: f64,
}

impl PathStatistics {
    /// Ids missing from the graph are skipped.
    pub fn for_route(
        drone: &Drone,
        graph: &DeliveryGraph,
        model: &CostModel<'_>,
        path: &[DeliveryId],
    ) -> Self {
        let mut position = drone.start;
        let mut total_distance = 0.0;
        let mut total_energy = 0.0;
        let mut priorities = Vec::with_capacity(path.len());

        for delivery in path.iter().filter_map(|id| graph.delivery(*id)) {
            let dist = distance(position, delivery.position);
            total_distance += dist;
            total_energy += model.energy_for(dist, delivery.weight);
            priorities.push(f64::from(delivery.priority));
            position = delivery.position;
        }

        let average_priority = if priorities.is_empty() {
            0.0
        } else {
            priorities.iter().sum::<f64>() / priorities.len() as f64
        };

        Self {
            total_distance,
            total_time: total_distance / drone.speed,
            total_energy,
            path_length: priorities.len(),
            average_priority,
            energy_efficiency: if total_energy > 0.0 {
                total_distance / total_energy
            } else {
                0.0
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetStatistics {
    pub total_assigned: usize,
    pub active_drones: usize,
    pub utilization_percent: f64,
    pub deliveries_per_active_drone: f64,
}

impl FleetStatistics {
    pub fn for_assignment(routes: &[DroneRoute], fleet_size: usize) -> Self {
        let total_assigned: usize = routes.iter().map(|route| route.stops.len()).sum();
        let active_drones = routes.iter().filter(|route| !route.is_empty()).count();

        Self {
            total_assigned,
            active_drones,
            utilization_percent: if fleet_size == 0 {
                0.0
            } else {
                active_drones as f64 / fleet_size as f64 * 100.0
            },
            deliveries_per_active_drone: if active_drones == 0 {
                0.0
            } else {
                total_assigned as f64 / active_drones as f64
            },
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
