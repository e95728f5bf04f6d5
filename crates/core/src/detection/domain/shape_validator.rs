use std::fmt;

use super::contour::Contour;
use super::convex_hull::ConvexHull;
use super::detector_config::DetectorConfig;
use super::fitted_ellipse::FittedEllipse;
use super::geometry_fitter::{convex_hull, fit_ellipse};

/// Why a candidate was turned down.
#[derive(Clone, Debug, PartialEq)]
pub enum Rejection {
    AreaTooSmall { area: f64, min_area: f64 },
    NotCircular { circularity: f64, min: f64 },
    /// The hull could not support an ellipse fit.
    DegenerateHull,
    /// Hull fills too little of its fitted ellipse.
    NotDisk { ratio: f64, threshold: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AreaTooSmall { area, min_area } => {
                write!(f, "area {area:.1} below {min_area:.1}")
            }
            Self::NotCircular { circularity, min } => {
                write!(f, "circularity {circularity:.3} below {min:.3}")
            }
            Self::DegenerateHull => write!(f, "hull too degenerate for an ellipse fit"),
            Self::NotDisk { ratio, threshold } => {
                write!(f, "hull/ellipse ratio {ratio:.3} not above {threshold:.3}")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Validation {
    Accepted {
        hull: ConvexHull,
        ellipse: FittedEllipse,
    },
    Rejected(Rejection),
}

impl Validation {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Sequential shape gate: area floor, optional circularity, then the
/// hull-to-ellipse fill ratio. Stops at the first failing test.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeValidator {
    min_area: f64,
    circularity_min: Option<f64>,
    hull_ratio_threshold: f64,
}

impl ShapeValidator {
    pub fn new(min_area: f64, circularity_min: Option<f64>, hull_ratio_threshold: f64) -> Self {
        Self {
            min_area,
            circularity_min,
            hull_ratio_threshold,
        }
    }

    pub fn from_config(config: &DetectorConfig) -> Self {
        Self::new(
            config.min_area,
            config.circularity_min,
            config.hull_ratio_threshold,
        )
    }

    pub fn validate(&self, contour: &Contour) -> Validation {
        let area = contour.area();
        if area < self.min_area {
            return Validation::Rejected(Rejection::AreaTooSmall {
                area,
                min_area: self.min_area,
            });
        }

        if let Some(min) = self.circularity_min {
            let circularity = contour.circularity();
            if circularity < min {
                return Validation::Rejected(Rejection::NotCircular { circularity, min });
            }
        }

        let hull = convex_hull(contour);
        let ellipse = match fit_ellipse(hull.points()) {
            Ok(ellipse) => ellipse,
            Err(e) => {
                log::debug!("Ellipse fit failed on {}-point hull: {e}", hull.len());
                return Validation::Rejected(Rejection::DegenerateHull);
            }
        };
        let ellipse_area = ellipse.area();
        if ellipse_area <= f64::EPSILON {
            return Validation::Rejected(Rejection::DegenerateHull);
        }

        let ratio = hull.area() / ellipse_area;
        if ratio <= self.hull_ratio_threshold {
            return Validation::Rejected(Rejection::NotDisk {
                ratio,
                threshold: self.hull_ratio_threshold,
            });
        }

        Validation::Accepted { hull, ellipse }
    }
}

impl Default for ShapeValidator {
    fn default() -> Self {
        Self::from_config(&DetectorConfig::default())
    }
}
