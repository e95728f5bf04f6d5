use serde::{Deserialize, Serialize};

/// Integer pixel coordinate. `x` grows to the right, `y` grows downward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Z component of `(a - self) × (b - self)`.
    ///
    /// Positive when `self → a → b` turns counter-clockwise in a y-up frame.
    pub fn cross(self, a: Point, b: Point) -> i64 {
        let (ax, ay) = (a.x as i64 - self.x as i64, a.y as i64 - self.y as i64);
        let (bx, by) = (b.x as i64 - self.x as i64, b.y as i64 - self.y as i64);
        ax * by - ay * bx
    }

    pub fn distance(self, other: Point) -> f64 {
        let dx = (other.x - self.x) as f64;
        let dy = (other.y - self.y) as f64;
        dx.hypot(dy)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Signed shoelace sum over a closed polygon, halved.
pub(crate) fn signed_polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p, q)| p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64)
        .sum();
    twice as f64 / 2.0
}

/// Length of the closed polyline through `points`.
pub(crate) fn closed_arc_length(points: &[Point]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p, q)| p.distance(*q))
        .sum()
}
