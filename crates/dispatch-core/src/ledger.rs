//! Per-run record of which delivery went to which drone.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{PlanError, PlanResult};
use crate::models::{DeliveryId, DroneId};

#[derive(Debug, Clone, Default)]
pub struct AssignmentLedger {
    pending: BTreeSet<DeliveryId>,
    assigned: BTreeMap<DeliveryId, DroneId>,
}

impl AssignmentLedger {
    pub fn new(ids: impl IntoIterator<Item = DeliveryId>) -> Self {
        Self {
            pending: ids.into_iter().collect(),
            assigned: BTreeMap::new(),
        }
    }

    pub fn is_assigned(&self, delivery_id: DeliveryId) -> bool {
        self.assigned.contains_key(&delivery_id)
    }

    /// Move a pending delivery onto a drone. Each delivery transitions once.
    pub fn assign(&mut self, delivery_id: DeliveryId, drone_id: DroneId) -> PlanResult<()> {
        if let Some(&owner) = self.assigned.get(&delivery_id) {
            return Err(PlanError::AlreadyAssigned {
                delivery_id,
                drone_id: owner,
            });
        }
        if !self.pending.remove(&delivery_id) {
            return Err(PlanError::UnknownDelivery(delivery_id));
        }
        self.assigned.insert(delivery_id, drone_id);
        Ok(())
    }

    /// Deliveries still waiting for a drone, ascending by id.
    pub fn unassigned(&self) -> &BTreeSet<DeliveryId> {
        &self.pending
    }

    pub fn assigned_count(&self) -> usize {
        self.assigned.len()
    }

    pub fn assignee(&self, delivery_id: DeliveryId) -> Option<DroneId> {
        self.assigned.get(&delivery_id).copied()
    }

    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }
}
