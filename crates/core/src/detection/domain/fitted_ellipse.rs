use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::shared::point::Point;

/// Ellipse in pixel coordinates.
///
/// `major` and `minor` are full axis lengths (diameters), `major >= minor`.
/// `angle` is the direction of the major axis in radians, measured from the
/// +x axis towards +y (clockwise on screen), normalised to `[0, π)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FittedEllipse {
    pub center_x: f64,
    pub center_y: f64,
    pub major: f64,
    pub minor: f64,
    pub angle: f64,
}

impl FittedEllipse {
    /// Converts conic coefficients of `a·x² + b·xy + c·y² + d·x + e·y + f = 0`.
    ///
    /// Returns `None` unless the conic is a real, non-degenerate ellipse.
    pub fn from_conic(coeffs: [f64; 6]) -> Option<Self> {
        let [a, b, c, d, e, f] = coeffs;
        let det = 4.0 * a * c - b * b;
        if !det.is_finite() || det <= 0.0 {
            return None;
        }

        let center_x = (b * e - 2.0 * c * d) / det;
        let center_y = (b * d - 2.0 * a * e) / det;
        // Conic value at the center
        let f0 = a * center_x * center_x
            + b * center_x * center_y
            + c * center_y * center_y
            + d * center_x
            + e * center_y
            + f;

        // Eigenvalues of the quadratic form; `steep` is along `theta`
        let mean = (a + c) / 2.0;
        let spread = ((a - c) * (a - c) + b * b).sqrt() / 2.0;
        let steep = mean + spread;
        let shallow = mean - spread;
        let theta = 0.5 * b.atan2(a - c);

        let along_theta = -f0 / steep;
        let across_theta = -f0 / shallow;
        if !(along_theta > 0.0 && across_theta > 0.0) {
            return None;
        }
        let (semi_theta, semi_across) = (along_theta.sqrt(), across_theta.sqrt());

        let (major, minor, angle) = if semi_across >= semi_theta {
            (2.0 * semi_across, 2.0 * semi_theta, theta + PI / 2.0)
        } else {
            (2.0 * semi_theta, 2.0 * semi_across, theta)
        };

        let ellipse = Self {
            center_x,
            center_y,
            major,
            minor,
            angle: angle.rem_euclid(PI),
        };
        ellipse.is_finite().then_some(ellipse)
    }

    /// `π × (major/2) × (minor/2)`.
    pub fn area(&self) -> f64 {
        PI * (self.major / 2.0) * (self.minor / 2.0)
    }

    /// Center truncated to integer pixel coordinates.
    pub fn center(&self) -> Point {
        Point::new(self.center_x as i32, self.center_y as i32)
    }

    /// `n` points evenly spaced in parameter around the ellipse outline.
    pub fn sample_points(&self, n: usize) -> Vec<(f64, f64)> {
        let (sin, cos) = self.angle.sin_cos();
        let (semi_major, semi_minor) = (self.major / 2.0, self.minor / 2.0);
        (0..n)
            .map(|i| {
                let t = 2.0 * PI * i as f64 / n as f64;
                let (u, v) = (semi_major * t.cos(), semi_minor * t.sin());
                (
                    self.center_x + u * cos - v * sin,
                    self.center_y + u * sin + v * cos,
                )
            })
            .collect()
    }

    fn is_finite(&self) -> bool {
        [self.center_x, self.center_y, self.major, self.minor, self.angle]
            .iter()
            .all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_circle_conic() {
        // (x - 3)² + (y - 4)² = 25
        let ellipse = FittedEllipse::from_conic([1.0, 0.0, 1.0, -6.0, -8.0, 0.0]).unwrap();
        assert_relative_eq!(ellipse.center_x, 3.0, epsilon = 1e-9);
        assert_relative_eq!(ellipse.center_y, 4.0, epsilon = 1e-9);
        assert_relative_eq!(ellipse.major, 10.0, epsilon = 1e-9);
        assert_relative_eq!(ellipse.minor, 10.0, epsilon = 1e-9);
        assert_relative_eq!(ellipse.area(), 25.0 * PI, epsilon = 1e-9);
        assert_eq!(ellipse.center(), Point::new(3, 4));
    }

    #[test]
    fn test_axis_aligned_ellipse_wide() {
        // x²/100 + y²/25 = 1, scaled by 100
        let ellipse = FittedEllipse::from_conic([1.0, 0.0, 4.0, 0.0, 0.0, -100.0]).unwrap();
        assert_relative_eq!(ellipse.major, 20.0, epsilon = 1e-9);
        assert_relative_eq!(ellipse.minor, 10.0, epsilon = 1e-9);
        assert_relative_eq!(ellipse.angle, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_axis_aligned_ellipse_tall() {
        let ellipse = FittedEllipse::from_conic([4.0, 0.0, 1.0, 0.0, 0.0, -100.0]).unwrap();
        assert_relative_eq!(ellipse.major, 20.0, epsilon = 1e-9);
        assert_relative_eq!(ellipse.minor, 10.0, epsilon = 1e-9);
        assert_relative_eq!(ellipse.angle, PI / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_scaled_and_negated_conic_is_same_ellipse() {
        let base = FittedEllipse::from_conic([1.0, 0.0, 4.0, 0.0, 0.0, -100.0]).unwrap();
        let negated = FittedEllipse::from_conic([-3.0, 0.0, -12.0, 0.0, 0.0, 300.0]).unwrap();
        assert_relative_eq!(base.major, negated.major, epsilon = 1e-9);
        assert_relative_eq!(base.minor, negated.minor, epsilon = 1e-9);
    }

    #[test]
    fn test_rotated_ellipse_roundtrips_through_samples() {
        let ellipse = FittedEllipse {
            center_x: 50.0,
            center_y: 40.0,
            major: 30.0,
            minor: 12.0,
            angle: 0.6,
        };
        let (sin, cos) = ellipse.angle.sin_cos();
        for (x, y) in ellipse.sample_points(16) {
            let (dx, dy) = (x - 50.0, y - 40.0);
            let u = dx * cos + dy * sin;
            let v = -dx * sin + dy * cos;
            assert_relative_eq!((u / 15.0).powi(2) + (v / 6.0).powi(2), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_hyperbola_and_imaginary_conics_rejected() {
        assert!(FittedEllipse::from_conic([1.0, 0.0, -1.0, 0.0, 0.0, -1.0]).is_none());
        assert!(FittedEllipse::from_conic([1.0, 0.0, 1.0, 0.0, 0.0, 1.0]).is_none());
        assert!(FittedEllipse::from_conic([0.0; 6]).is_none());
    }
}
