//! Seeded random scenarios for demos and benchmarks.

use rand::Rng;

use dispatch_core::{Delivery, Drone, Point, Scenario, TimeWindow};

use crate::scenario::rectangle_zone;

/// Zones never stay active past this time.
const ZONE_HORIZON: f64 = 120.0;

#[derive(Debug, Clone, Copy)]
pub struct ScenarioGenerator {
    pub map_width: f64,
    pub map_height: f64,
}

impl Default for ScenarioGenerator {
    fn default() -> Self {
        Self {
            map_width: 100.0,
            map_height: 100.0,
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl ScenarioGenerator {
    pub fn generate<R: Rng>(
        &self,
        rng: &mut R,
        drones: u32,
        deliveries: u32,
        zones: u32,
    ) -> Scenario {
        Scenario {
            drones: (1..=drones).map(|id| self.drone(rng, id)).collect(),
            deliveries: (1..=deliveries).map(|id| self.delivery(rng, id)).collect(),
            zones: (1..=zones)
                .map(|id| {
                    let cx = rng.random_range(20.0..=self.map_width - 20.0);
                    let cy = rng.random_range(20.0..=self.map_height - 20.0);
                    let half_w = rng.random_range(10.0..=30.0) / 2.0;
                    let half_h = rng.random_range(10.0..=30.0) / 2.0;
                    let open = f64::from(rng.random_range(0..=60u32));
                    let close = (open + f64::from(rng.random_range(30..=60u32))).min(ZONE_HORIZON);
                    rectangle_zone(
                        id,
                        (round1(cx - half_w), round1(cy - half_h)),
                        (round1(cx + half_w), round1(cy + half_h)),
                        TimeWindow::new(open, close),
                    )
                })
                .collect(),
        }
    }

    fn drone<R: Rng>(&self, rng: &mut R, id: u32) -> Drone {
        Drone {
            id,
            max_weight: round1(rng.random_range(2.0..=6.0)),
            battery: f64::from(rng.random_range(8_000..=20_000u32)),
            speed: round1(rng.random_range(5.0..=15.0)),
            start: self.position(rng),
        }
    }

    fn delivery<R: Rng>(&self, rng: &mut R, id: u32) -> Delivery {
        let open = f64::from(rng.random_range(0..=60u32));
        let close = open + f64::from(rng.random_range(20..=60u32));
        Delivery {
            id,
            position: self.position(rng),
            weight: round1(rng.random_range(0.5..=5.0)),
            priority: rng.random_range(1..=5),
            window: TimeWindow::new(open, close),
        }
    }

    fn position<R: Rng>(&self, rng: &mut R) -> Point {
        Point::new(
            round1(rng.random_range(0.0..=self.map_width)),
            round1(rng.random_range(0.0..=self.map_height)),
        )
    }
}
