use super::contour::Contour;
use super::convex_hull::ConvexHull;
use super::fitted_ellipse::FittedEllipse;
use super::shape_validator::{Rejection, Validation};
use crate::shared::point::Point;

/// Per-frame detector output.
///
/// `contour` is the frame's candidate, present whenever the mask had any
/// region, accepted or not. `hull`, `ellipse` and `center` are present only
/// for accepted detections.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionResult {
    pub accepted: bool,
    pub contour: Option<Contour>,
    pub hull: Option<ConvexHull>,
    pub ellipse: Option<FittedEllipse>,
    pub center: Option<Point>,
    pub rejection: Option<Rejection>,
}

impl DetectionResult {
    /// Nothing in the frame matched the color range.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_validation(contour: Contour, validation: Validation) -> Self {
        match validation {
            Validation::Accepted { hull, ellipse } => Self {
                accepted: true,
                contour: Some(contour),
                hull: Some(hull),
                center: Some(ellipse.center()),
                ellipse: Some(ellipse),
                rejection: None,
            },
            Validation::Rejected(rejection) => Self {
                accepted: false,
                contour: Some(contour),
                rejection: Some(rejection),
                ..Self::default()
            },
        }
    }

    pub fn has_candidate(&self) -> bool {
        self.contour.is_some()
    }
}
