//! Static pairwise delivery graph.
//!
//! Built once per request and immutable afterwards. The zone penalty baked
//! into each edge ignores zone activity times, so the graph is advisory only:
//! hard feasibility always goes through [`crate::cost::CostModel`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::geometry::{distance, segment_intersects_polygon_sampled, SEGMENT_SAMPLE_STEPS};
use crate::models::{Delivery, DeliveryId, NoFlyZone};
use crate::rules::GraphRules;

/// Directed edge between two deliveries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub to: DeliveryId,
    pub cost: f64,
    pub distance: f64,
    /// Straight segment crosses some zone, regardless of when it is active
    pub violates_nfz: bool,
}

#[derive(Debug, Clone)]
pub struct DeliveryGraph {
    deliveries: BTreeMap<DeliveryId, Delivery>,
    zones: Vec<NoFlyZone>,
    edges: BTreeMap<DeliveryId, Vec<GraphEdge>>,
}

impl DeliveryGraph {
    pub fn new(deliveries: &[Delivery], zones: &[NoFlyZone]) -> Self {
        Self::with_rules(deliveries, zones, &GraphRules::default(), SEGMENT_SAMPLE_STEPS)
    }

    pub fn with_rules(
        deliveries: &[Delivery],
        zones: &[NoFlyZone],
        rules: &GraphRules,
        sample_steps: usize,
    ) -> Self {
        let deliveries: BTreeMap<DeliveryId, Delivery> =
            deliveries.iter().map(|d| (d.id, d.clone())).collect();

        let mut edges: BTreeMap<DeliveryId, Vec<GraphEdge>> = BTreeMap::new();
        let mut crossing_edges = 0usize;

        for (from_id, from) in &deliveries {
            let outgoing = edges.entry(*from_id).or_default();
            for (to_id, to) in &deliveries {
                if from_id == to_id {
                    continue;
                }
                let dist = distance(from.position, to.position);
                let mut cost = dist * to.weight + f64::from(to.priority) * rules.priority_cost;

                let violates_nfz = zones.iter().any(|zone| {
                    segment_intersects_polygon_sampled(
                        from.position,
                        to.position,
                        &zone.polygon,
                        sample_steps,
                    )
                });
                if violates_nfz {
                    cost += rules.zone_penalty;
                    crossing_edges += 1;
                }

                outgoing.push(GraphEdge {
                    to: *to_id,
                    cost,
                    distance: dist,
                    violates_nfz,
                });
            }
        }

        tracing::debug!(
            deliveries = deliveries.len(),
            zones = zones.len(),
            crossing_edges,
            "Built delivery graph"
        );

        Self {
            deliveries,
            zones: zones.to_vec(),
            edges,
        }
    }

    pub fn delivery(&self, id: DeliveryId) -> Option<&Delivery> {
        self.deliveries.get(&id)
    }

    /// Deliveries in ascending id order.
    pub fn deliveries(&self) -> impl Iterator<Item = &Delivery> {
        self.deliveries.values()
    }

    pub fn delivery_ids(&self) -> impl Iterator<Item = DeliveryId> + '_ {
        self.deliveries.keys().copied()
    }

    pub fn zones(&self) -> &[NoFlyZone] {
        &self.zones
    }

    pub fn edges_from(&self, id: DeliveryId) -> &[GraphEdge] {
        self.edges.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edge(&self, from: DeliveryId, to: DeliveryId) -> Option<&GraphEdge> {
        self.edges_from(from).iter().find(|edge| edge.to == to)
    }

    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }
}
