//! Scenario files and the built-in demo fleet.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use dispatch_core::{Delivery, Drone, NoFlyZone, Point, Scenario, TimeWindow};

pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading scenario file {}", path.display()))?;
    let scenario: Scenario = serde_json::from_str(&raw)
        .with_context(|| format!("parsing scenario file {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        drones = scenario.drones.len(),
        deliveries = scenario.deliveries.len(),
        zones = scenario.zones.len(),
        "Loaded scenario"
    );
    Ok(scenario)
}

pub fn save_scenario(path: &Path, scenario: &Scenario) -> Result<()> {
    let json = serde_json::to_string_pretty(scenario).context("serializing scenario")?;
    fs::write(path, json).with_context(|| format!("writing scenario file {}", path.display()))?;
    tracing::info!(path = %path.display(), "Saved scenario");
    Ok(())
}

/// Five drones, twenty deliveries and three zones on a 100x100 map.
pub fn default_scenario() -> Scenario {
    let drones = [
        (1, 4.0, 12_000.0, 8.0, (10.0, 10.0)),
        (2, 3.5, 10_000.0, 10.0, (20.0, 30.0)),
        (3, 5.0, 15_000.0, 7.0, (50.0, 50.0)),
        (4, 2.0, 8_000.0, 12.0, (80.0, 20.0)),
        (5, 6.0, 20_000.0, 5.0, (40.0, 70.0)),
    ]
    .into_iter()
    .map(|(id, max_weight, battery, speed, start)| Drone {
        id,
        max_weight,
        battery,
        speed,
        start: Point::from(start),
    })
    .collect();

    let deliveries = [
        (1, (15.0, 25.0), 1.5, 3, (0.0, 60.0)),
        (2, (30.0, 40.0), 2.0, 5, (0.0, 30.0)),
        (3, (70.0, 80.0), 3.0, 2, (20.0, 80.0)),
        (4, (90.0, 10.0), 1.0, 4, (10.0, 40.0)),
        (5, (45.0, 60.0), 4.0, 1, (30.0, 90.0)),
        (6, (25.0, 15.0), 2.5, 3, (0.0, 50.0)),
        (7, (60.0, 30.0), 1.0, 5, (5.0, 25.0)),
        (8, (85.0, 90.0), 3.5, 2, (40.0, 100.0)),
        (9, (10.0, 80.0), 2.0, 4, (15.0, 45.0)),
        (10, (95.0, 50.0), 1.5, 3, (0.0, 60.0)),
        (11, (55.0, 20.0), 0.5, 5, (0.0, 20.0)),
        (12, (35.0, 75.0), 2.0, 1, (50.0, 120.0)),
        (13, (75.0, 40.0), 3.0, 3, (10.0, 50.0)),
        (14, (20.0, 90.0), 1.5, 4, (30.0, 70.0)),
        (15, (65.0, 65.0), 4.5, 2, (25.0, 75.0)),
        (16, (40.0, 10.0), 2.0, 5, (0.0, 30.0)),
        (17, (5.0, 50.0), 1.0, 3, (15.0, 55.0)),
        (18, (50.0, 85.0), 3.0, 1, (60.0, 100.0)),
        (19, (80.0, 70.0), 2.5, 4, (20.0, 60.0)),
        (20, (30.0, 55.0), 1.5, 2, (40.0, 80.0)),
    ]
    .into_iter()
    .map(|(id, position, weight, priority, (open, close))| Delivery {
        id,
        position: Point::from(position),
        weight,
        priority,
        window: TimeWindow::new(open, close),
    })
    .collect();

    let zones = vec![
        rectangle_zone(1, (40.0, 30.0), (60.0, 50.0), TimeWindow::new(0.0, 120.0)),
        rectangle_zone(2, (70.0, 10.0), (90.0, 30.0), TimeWindow::new(30.0, 90.0)),
        rectangle_zone(3, (10.0, 60.0), (30.0, 80.0), TimeWindow::new(0.0, 60.0)),
    ];

    Scenario {
        drones,
        deliveries,
        zones,
    }
}

/// Axis-aligned zone from its lower-left and upper-right corners.
pub fn rectangle_zone(id: u32, min: (f64, f64), max: (f64, f64), active: TimeWindow) -> NoFlyZone {
    NoFlyZone {
        id,
        polygon: vec![
            Point::new(min.0, min.1),
            Point::new(max.0, min.1),
            Point::new(max.0, max.1),
            Point::new(min.0, max.1),
        ],
        active,
    }
}
