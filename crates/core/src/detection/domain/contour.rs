use serde::{Deserialize, Serialize};

use crate::shared::point::{closed_arc_length, signed_polygon_area, Point};

/// Closed boundary polyline of one connected mask region.
///
/// The last point connects back to the first; it is not repeated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Contour {
    points: Vec<Point>,
}

impl Contour {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Builds a contour keeping only the vertices where the boundary changes
    /// direction. Enclosed area and arc length are unchanged.
    pub fn simplified(points: Vec<Point>) -> Self {
        Self {
            points: collapse_collinear(points),
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Enclosed area by the shoelace formula, independent of orientation.
    pub fn area(&self) -> f64 {
        signed_polygon_area(&self.points).abs()
    }

    /// Arc length of the closed curve.
    pub fn perimeter(&self) -> f64 {
        closed_arc_length(&self.points)
    }

    /// `4π·area/perimeter²`: 1.0 for a circle, smaller for anything else.
    pub fn circularity(&self) -> f64 {
        let perimeter = self.perimeter();
        if perimeter <= f64::EPSILON {
            return 0.0;
        }
        4.0 * std::f64::consts::PI * self.area() / (perimeter * perimeter)
    }
}

fn collapse_collinear(mut points: Vec<Point>) -> Vec<Point> {
    points.dedup();
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    let n = points.len();
    if n < 3 {
        return points;
    }

    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let curr = points[i];
            let next = points[(i + 1) % n];
            let straight = prev.cross(curr, next) == 0;
            let forward = (curr.x - prev.x) as i64 * (next.x - curr.x) as i64
                + (curr.y - prev.y) as i64 * (next.y - curr.y) as i64
                > 0;
            !(straight && forward)
        })
        .map(|i| points[i])
        .collect()
}
