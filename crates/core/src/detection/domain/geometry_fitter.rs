use nalgebra::{DMatrix, Matrix3, Vector3};
use thiserror::Error;

use super::contour::Contour;
use super::convex_hull::ConvexHull;
use super::fitted_ellipse::FittedEllipse;
use crate::shared::constants::MIN_ELLIPSE_FIT_POINTS;
use crate::shared::point::Point;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("ellipse fit needs at least {needed} points, got {got}")]
    TooFewPoints { needed: usize, got: usize },
    #[error("points do not determine an ellipse")]
    DegenerateFit,
}

/// Convex hull of a contour's points. Never fails.
pub fn convex_hull(contour: &Contour) -> ConvexHull {
    ConvexHull::of(contour.points())
}

/// Least-squares ellipse through `points` (Fitzgibbon direct fit).
///
/// Minimises algebraic distance subject to `4ac - b² = 1`, which always
/// yields an ellipse when one exists. Collinear or otherwise degenerate
/// input is reported as [`GeometryError::DegenerateFit`].
pub fn fit_ellipse(points: &[Point]) -> Result<FittedEllipse, GeometryError> {
    if points.len() < MIN_ELLIPSE_FIT_POINTS {
        return Err(GeometryError::TooFewPoints {
            needed: MIN_ELLIPSE_FIT_POINTS,
            got: points.len(),
        });
    }

    if all_collinear(points) {
        return Err(GeometryError::DegenerateFit);
    }

    let frame = Normalization::of(points);
    let n = points.len();
    let mut design = DMatrix::<f64>::zeros(n, 6);
    for (row, p) in points.iter().enumerate() {
        let (x, y) = frame.apply(*p);
        design[(row, 0)] = x * x;
        design[(row, 1)] = x * y;
        design[(row, 2)] = y * y;
        design[(row, 3)] = x;
        design[(row, 4)] = y;
        design[(row, 5)] = 1.0;
    }
    let scatter = design.transpose() * &design;

    let quad: Matrix3<f64> = scatter.fixed_view::<3, 3>(0, 0).into_owned();
    let mixed: Matrix3<f64> = scatter.fixed_view::<3, 3>(0, 3).into_owned();
    let linear: Matrix3<f64> = scatter.fixed_view::<3, 3>(3, 3).into_owned();

    let linear_inv = linear.try_inverse().ok_or(GeometryError::DegenerateFit)?;
    // Linear part expressed in terms of the quadratic part
    let elimination = -linear_inv * mixed.transpose();
    let reduced = quad + mixed * elimination;

    // C⁻¹ for the constraint matrix [[0,0,2],[0,-1,0],[2,0,0]]
    let constraint_inv = Matrix3::new(0.0, 0.0, 0.5, 0.0, -1.0, 0.0, 0.5, 0.0, 0.0);
    let system = constraint_inv * reduced;

    let quadratic = elliptic_eigenvector(&system).ok_or(GeometryError::DegenerateFit)?;
    let linear_part = elimination * quadratic;

    let coeffs = frame.restore([
        quadratic[0],
        quadratic[1],
        quadratic[2],
        linear_part[0],
        linear_part[1],
        linear_part[2],
    ]);
    FittedEllipse::from_conic(coeffs).ok_or(GeometryError::DegenerateFit)
}

fn all_collinear(points: &[Point]) -> bool {
    let origin = points[0];
    let Some(&far) = points.iter().find(|&&p| p != origin) else {
        return true;
    };
    points.iter().all(|&p| origin.cross(far, p) == 0)
}

/// Eigenvector of `system` with `4ac - b² > 0` and the eigenvalue closest
/// to zero, i.e. the smallest algebraic residual among elliptic solutions.
fn elliptic_eigenvector(system: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let mut best: Option<(f64, Vector3<f64>)> = None;
    for lambda in real_eigenvalues(system) {
        let Some(v) = null_vector(&(system - Matrix3::identity() * lambda)) else {
            continue;
        };
        if 4.0 * v[0] * v[2] - v[1] * v[1] <= 0.0 {
            continue;
        }
        if best.map_or(true, |(best_lambda, _)| lambda.abs() < best_lambda.abs()) {
            best = Some((lambda, v));
        }
    }
    best.map(|(_, v)| v)
}

/// Real roots of the characteristic polynomial of a 3×3 matrix.
fn real_eigenvalues(m: &Matrix3<f64>) -> Vec<f64> {
    let trace = m.trace();
    let minors = m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)]
        + m[(0, 0)] * m[(2, 2)]
        - m[(0, 2)] * m[(2, 0)]
        + m[(1, 1)] * m[(2, 2)]
        - m[(1, 2)] * m[(2, 1)];
    // λ³ − trace·λ² + minors·λ − det = 0
    cubic_roots(-trace, minors, -m.determinant())
}

/// Real roots of `x³ + b·x² + c·x + d`.
fn cubic_roots(b: f64, c: f64, d: f64) -> Vec<f64> {
    // Depressed form t³ + p·t + q with x = t − b/3
    let shift = -b / 3.0;
    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;
    let discriminant = q * q / 4.0 + p * p * p / 27.0;

    if discriminant > 0.0 {
        let root = discriminant.sqrt();
        return vec![(-q / 2.0 + root).cbrt() + (-q / 2.0 - root).cbrt() + shift];
    }
    if p.abs() < f64::EPSILON {
        return vec![shift];
    }
    let radius = 2.0 * (-p / 3.0).sqrt();
    let phi = ((3.0 * q) / (p * radius)).clamp(-1.0, 1.0).acos() / 3.0;
    (0..3)
        .map(|k| radius * (phi - 2.0 * std::f64::consts::PI * k as f64 / 3.0).cos() + shift)
        .collect()
}

/// Null vector of a rank-2 matrix: the longest cross product of two rows.
fn null_vector(m: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let rows = [
        m.row(0).transpose(),
        m.row(1).transpose(),
        m.row(2).transpose(),
    ];
    let v = [
        rows[0].cross(&rows[1]),
        rows[0].cross(&rows[2]),
        rows[1].cross(&rows[2]),
    ]
    .into_iter()
    .max_by(|a, b| a.norm_squared().total_cmp(&b.norm_squared()))?;
    let norm = v.norm();
    (norm > 1e-15).then(|| v / norm)
}

/// Centroid shift and isotropic scale that bring the points to a mean
/// distance of √2 from the origin.
struct Normalization {
    mean_x: f64,
    mean_y: f64,
    scale: f64,
}

impl Normalization {
    fn of(points: &[Point]) -> Self {
        let n = points.len() as f64;
        let mean_x = points.iter().map(|p| p.x as f64).sum::<f64>() / n;
        let mean_y = points.iter().map(|p| p.y as f64).sum::<f64>() / n;
        let spread = points
            .iter()
            .map(|p| (p.x as f64 - mean_x).hypot(p.y as f64 - mean_y))
            .sum::<f64>()
            / n;
        let scale = if spread > f64::EPSILON {
            std::f64::consts::SQRT_2 / spread
        } else {
            1.0
        };
        Self {
            mean_x,
            mean_y,
            scale,
        }
    }

    fn apply(&self, p: Point) -> (f64, f64) {
        (
            (p.x as f64 - self.mean_x) * self.scale,
            (p.y as f64 - self.mean_y) * self.scale,
        )
    }

    /// Rewrites a conic in normalised coordinates as one in pixel coordinates.
    fn restore(&self, [a, b, c, d, e, f]: [f64; 6]) -> [f64; 6] {
        let s = self.scale;
        let (mx, my) = (self.mean_x, self.mean_y);
        let (a2, b2, c2) = (a * s * s, b * s * s, c * s * s);
        [
            a2,
            b2,
            c2,
            d * s - 2.0 * a2 * mx - b2 * my,
            e * s - b2 * mx - 2.0 * c2 * my,
            a2 * mx * mx + b2 * mx * my + c2 * my * my - d * s * mx - e * s * my + f,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn pts(coords: &[(i32, i32)]) -> Vec<Point> {
        coords.iter().map(|&c| Point::from(c)).collect()
    }

    fn sampled(ellipse: &FittedEllipse, n: usize) -> Vec<Point> {
        ellipse
            .sample_points(n)
            .into_iter()
            .map(|(x, y)| Point::new(x.round() as i32, y.round() as i32))
            .collect()
    }

    #[rstest]
    #[case(0)]
    #[case(3)]
    #[case(4)]
    fn test_too_few_points(#[case] n: usize) {
        let points: Vec<Point> = (0..n as i32).map(|i| Point::new(i, i * i)).collect();
        assert_eq!(
            fit_ellipse(&points),
            Err(GeometryError::TooFewPoints { needed: 5, got: n })
        );
    }

    #[test]
    fn test_quarter_arc_recovers_full_circle() {
        // Integer points exactly on a circle of radius 25 around (100, 100)
        let arc = pts(&[(125, 100), (124, 107), (120, 115), (115, 120), (107, 124), (100, 125)]);
        let ellipse = fit_ellipse(&arc).unwrap();
        assert_relative_eq!(ellipse.center_x, 100.0, epsilon = 1e-6);
        assert_relative_eq!(ellipse.center_y, 100.0, epsilon = 1e-6);
        assert_relative_eq!(ellipse.major, 50.0, epsilon = 1e-6);
        assert_relative_eq!(ellipse.minor, 50.0, epsilon = 1e-6);
    }

    #[test]
    fn test_five_points_are_enough() {
        let ellipse = fit_ellipse(&pts(&[(25, 0), (0, 25), (-25, 0), (0, -25), (15, 20)])).unwrap();
        assert_relative_eq!(ellipse.center_x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ellipse.center_y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ellipse.major, 50.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rotated_ellipse_from_samples() {
        let truth = FittedEllipse {
            center_x: 160.0,
            center_y: 120.0,
            major: 120.0,
            minor: 60.0,
            angle: 0.5,
        };
        let ellipse = fit_ellipse(&sampled(&truth, 72)).unwrap();
        assert_relative_eq!(ellipse.center_x, 160.0, epsilon = 0.5);
        assert_relative_eq!(ellipse.center_y, 120.0, epsilon = 0.5);
        assert_relative_eq!(ellipse.major, 120.0, epsilon = 1.5);
        assert_relative_eq!(ellipse.minor, 60.0, epsilon = 1.5);
        assert_relative_eq!(ellipse.angle, 0.5, epsilon = 0.05);
    }

    #[test]
    fn test_collinear_points_are_degenerate() {
        let line: Vec<Point> = (0..10).map(|i| Point::new(i, 2 * i)).collect();
        assert_eq!(fit_ellipse(&line), Err(GeometryError::DegenerateFit));
    }

    #[test]
    fn test_repeated_point_is_degenerate() {
        let same = vec![Point::new(7, 7); 8];
        assert_eq!(fit_ellipse(&same), Err(GeometryError::DegenerateFit));
    }

    #[test]
    fn test_convex_hull_of_contour() {
        let contour = Contour::new(pts(&[(0, 0), (4, 0), (2, 1), (4, 4), (0, 4)]));
        let hull = convex_hull(&contour);
        assert_eq!(hull.len(), 4);
        assert_relative_eq!(hull.area(), 16.0);
    }

    #[test]
    fn test_cubic_roots_three_real() {
        // (x − 1)(x − 2)(x + 3) = x³ − 7x + 6
        let mut roots = cubic_roots(0.0, -7.0, 6.0);
        roots.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(roots.len(), 3);
        assert_relative_eq!(roots[0], -3.0, epsilon = 1e-9);
        assert_relative_eq!(roots[1], 1.0, epsilon = 1e-9);
        assert_relative_eq!(roots[2], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cubic_roots_single_real() {
        // x³ + x + 2 = (x + 1)(x² − x + 2)
        let roots = cubic_roots(0.0, 1.0, 2.0);
        assert_eq!(roots.len(), 1);
        assert_relative_eq!(roots[0], -1.0, epsilon = 1e-9);
    }
}
