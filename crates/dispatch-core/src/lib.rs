pub mod coordinator;
pub mod cost;
pub mod error;
pub mod genetic;
pub mod geometry;
pub mod graph;
pub mod ledger;
pub mod metrics;
pub mod models;
pub mod planner;
pub mod rules;
pub mod search;

pub use coordinator::{Coordinator, CoordinatorOutcome, TurnDiagnostic, TurnEndReason};
pub use cost::{CostModel, Leg, LegState, Rejection, ReplayStep, ZoneConflict, ZoneHit};
pub use error::{PlanError, PlanResult};
pub use genetic::{FitnessReport, GeneticOptimizer, GeneticOutcome, Individual, RouteReplay};
pub use geometry::{
    distance, point_in_polygon, polygon_centroid, segment_intersects_polygon,
    segment_intersects_polygon_sampled, SEGMENT_SAMPLE_STEPS,
};
pub use graph::{DeliveryGraph, GraphEdge};
pub use ledger::AssignmentLedger;
pub use metrics::{DroneRoute, FleetStatistics, PathStatistics, RouteStop, RunMetrics};
pub use models::{
    Delivery, DeliveryId, Drone, DroneId, DroneState, NoFlyZone, Point, Scenario, TimeWindow,
    ZoneId,
};
pub use planner::{PlanOutcome, Planner, Strategy};
pub use rules::{EnergyRules, GeneticConfig, GraphRules, PlannerConfig, SearchConfig};
pub use search::{AstarOutcome, PathSearch, Resolution, SearchOutcome, SearchPhase};
