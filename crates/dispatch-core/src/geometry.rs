//! Planar geometry for no-fly-zone checks and distance calculations.

use crate::models::Point;

/// Parameter steps used when sampling a segment against a polygon.
/// A segment is tested at `SEGMENT_SAMPLE_STEPS + 1` evenly spaced points.
pub const SEGMENT_SAMPLE_STEPS: usize = 20;

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Ray-casting parity test. The polygon may be concave.
///
/// Each edge only toggles when `min(y1, y2) < y <= max(y1, y2)`, so horizontal
/// edges never toggle and a ray through a shared vertex is counted once.
/// Points on a bottom edge therefore read as outside, points on a top edge as
/// inside.
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut p1 = polygon[0];
    for i in 1..=n {
        let p2 = polygon[i % n];
        if point.y > p1.y.min(p2.y) && point.y <= p1.y.max(p2.y) && point.x <= p1.x.max(p2.x) {
            // The strict lower bound guarantees p1.y != p2.y here.
            let x_cross = (point.y - p1.y) * (p2.x - p1.x) / (p2.y - p1.y) + p1.x;
            if p1.x == p2.x || point.x <= x_cross {
                inside = !inside;
            }
        }
        p1 = p2;
    }

    inside
}

/// Check whether the straight segment `p1 -> p2` enters the polygon.
///
/// This is a sampling approximation, not an exact intersection test: the
/// segment is sampled at 21 evenly spaced points (0/20 .. 20/20) and zones
/// narrower than one sampling step can be missed.
pub fn segment_intersects_polygon(p1: Point, p2: Point, polygon: &[Point]) -> bool {
    segment_intersects_polygon_sampled(p1, p2, polygon, SEGMENT_SAMPLE_STEPS)
}

/// Same as [`segment_intersects_polygon`] with an explicit step count.
/// Returns on the first sample found inside.
pub fn segment_intersects_polygon_sampled(
    p1: Point,
    p2: Point,
    polygon: &[Point],
    steps: usize,
) -> bool {
    let steps = steps.max(1);
    (0..=steps).any(|i| {
        let t = i as f64 / steps as f64;
        let sample = Point::new(p1.x + t * (p2.x - p1.x), p1.y + t * (p2.y - p1.y));
        point_in_polygon(sample, polygon)
    })
}

/// Vertex average of a polygon. Lies inside any convex polygon.
pub fn polygon_centroid(polygon: &[Point]) -> Option<Point> {
    if polygon.is_empty() {
        return None;
    }
    let n = polygon.len() as f64;
    let (sx, sy) = polygon
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point::new(sx / n, sy / n))
}
