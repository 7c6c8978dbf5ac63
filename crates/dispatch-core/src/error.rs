//! Error kinds raised at the planner boundary.
//!
//! Expected infeasibility (an unreachable delivery, an exhausted search) is
//! never an error; see [`crate::cost::Rejection`]. These variants cover
//! malformed input and ledger misuse only.

use thiserror::Error;

use crate::models::{DeliveryId, DroneId, ZoneId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("zone {zone_id}: {reason}")]
    InvalidGeometry { zone_id: ZoneId, reason: String },

    #[error("drone {drone_id}: {reason}")]
    InvalidDroneSpec { drone_id: DroneId, reason: String },

    #[error("{owner}: time window [{open}, {close}] is invalid")]
    InvalidTimeWindow { owner: String, open: f64, close: f64 },

    #[error("delivery {delivery_id}: {reason}")]
    InvalidDelivery { delivery_id: DeliveryId, reason: String },

    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: u32 },

    #[error("unknown delivery {0}")]
    UnknownDelivery(DeliveryId),

    #[error("delivery {delivery_id} already assigned to drone {drone_id}")]
    AlreadyAssigned {
        delivery_id: DeliveryId,
        drone_id: DroneId,
    },
}

pub type PlanResult<T> = Result<T, PlanError>;
