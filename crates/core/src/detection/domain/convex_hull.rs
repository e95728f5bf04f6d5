use serde::{Deserialize, Serialize};

use crate::shared::point::{signed_polygon_area, Point};

/// Minimal convex polygon around a point set, counter-clockwise in a y-up
/// frame, without a repeated closing point.
///
/// Built from fewer than three distinct points, or from collinear points,
/// the hull is degenerate: it holds the distinct points (at most the two
/// extremes) and encloses zero area.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConvexHull {
    points: Vec<Point>,
}

impl ConvexHull {
    /// Andrew's monotone chain.
    pub fn of(points: &[Point]) -> Self {
        let mut sorted = points.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() < 3 {
            return Self { points: sorted };
        }

        let mut lower: Vec<Point> = Vec::with_capacity(sorted.len());
        for &p in &sorted {
            push_turning_left(&mut lower, p);
        }
        let mut upper: Vec<Point> = Vec::with_capacity(sorted.len());
        for &p in sorted.iter().rev() {
            push_turning_left(&mut upper, p);
        }

        // Each chain ends where the other begins
        lower.pop();
        upper.pop();
        lower.append(&mut upper);
        Self { points: lower }
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

    pub fn area(&self) -> f64 {
        signed_polygon_area(&self.points).abs()
    }

    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 3 || self.area() <= f64::EPSILON
    }
}

fn push_turning_left(chain: &mut Vec<Point>, p: Point) {
    while chain.len() >= 2 && chain[chain.len() - 2].cross(chain[chain.len() - 1], p) <= 0 {
        chain.pop();
    }
    chain.push(p);
}
