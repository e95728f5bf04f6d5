use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::detection::domain::candidate_selector::select_candidate;
use crate::detection::domain::contour::Contour;
use crate::detection::domain::detection_result::DetectionResult;
use crate::shared::frame::Frame;
use crate::shared::point::Point;

pub const ELLIPSE_COLOR: [u8; 3] = [255, 0, 255];
pub const HULL_COLOR: [u8; 3] = [0, 255, 0];
pub const CONTOUR_COLOR: [u8; 3] = [255, 255, 255];
pub const CENTER_COLOR: [u8; 3] = [255, 0, 0];
pub const LARGEST_CONTOUR_COLOR: [u8; 3] = [0, 0, 255];

const ELLIPSE_SEGMENTS: usize = 90;
const CENTER_RADIUS: i32 = 3;

/// Line-art overlay drawn with `imageproc`.
///
/// Accepted detections get contour, hull, fitted ellipse and a center dot.
/// Rejected or empty results leave the frame untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct OverlayAnnotator;

impl OverlayAnnotator {
    pub fn new() -> Self {
        Self
    }
}

impl FrameAnnotator for OverlayAnnotator {
    fn annotate(&self, frame: &mut Frame, result: &DetectionResult) {
        if !result.accepted {
            return;
        }
        draw_on(frame, |canvas| {
            if let Some(contour) = &result.contour {
                draw_closed(canvas, &to_f32(contour.points()), CONTOUR_COLOR);
            }
            if let Some(hull) = &result.hull {
                draw_closed(canvas, &to_f32(hull.points()), HULL_COLOR);
            }
            if let Some(ellipse) = &result.ellipse {
                let outline: Vec<(f32, f32)> = ellipse
                    .sample_points(ELLIPSE_SEGMENTS)
                    .into_iter()
                    .map(|(x, y)| (x as f32, y as f32))
                    .collect();
                draw_closed(canvas, &outline, ELLIPSE_COLOR);
            }
            if let Some(center) = result.center {
                draw_filled_circle_mut(canvas, (center.x, center.y), CENTER_RADIUS, Rgb(CENTER_COLOR));
            }
        });
    }

    fn annotate_contours(&self, frame: &mut Frame, contours: &[Contour]) {
        if contours.is_empty() {
            return;
        }
        let largest = select_candidate(contours);
        draw_on(frame, |canvas| {
            for contour in contours {
                draw_closed(canvas, &to_f32(contour.points()), HULL_COLOR);
            }
            if let Some(contour) = largest {
                draw_closed(canvas, &to_f32(contour.points()), LARGEST_CONTOUR_COLOR);
            }
        });
    }
}

/// Runs `draw` on an image view of the frame and copies the pixels back.
fn draw_on(frame: &mut Frame, draw: impl FnOnce(&mut RgbImage)) {
    let Some(mut canvas) = frame.to_rgb_image() else {
        log::warn!("Frame {} has inconsistent dimensions, not annotated", frame.index());
        return;
    };
    draw(&mut canvas);
    frame.data_mut().copy_from_slice(canvas.as_raw());
}

fn to_f32(points: &[Point]) -> Vec<(f32, f32)> {
    points.iter().map(|p| (p.x as f32, p.y as f32)).collect()
}

/// Polyline through `points`, closed back to the first point.
fn draw_closed(canvas: &mut RgbImage, points: &[(f32, f32)], color: [u8; 3]) {
    match points {
        [] => {}
        [only] => draw_line_segment_mut(canvas, *only, *only, Rgb(color)),
        _ => {
            for (start, end) in points.iter().zip(points.iter().cycle().skip(1)) {
                draw_line_segment_mut(canvas, *start, *end, Rgb(color));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::convex_hull::ConvexHull;
    use crate::detection::domain::fitted_ellipse::FittedEllipse;
    use crate::detection::domain::shape_validator::Validation;

    fn square(x: i32, y: i32, side: i32) -> Contour {
        Contour::new(vec![
            Point::new(x, y),
            Point::new(x + side, y),
            Point::new(x + side, y + side),
            Point::new(x, y + side),
        ])
    }

    fn accepted() -> DetectionResult {
        let contour = square(20, 20, 40);
        let hull = ConvexHull::of(contour.points());
        let ellipse = FittedEllipse {
            center_x: 40.0,
            center_y: 40.0,
            major: 50.0,
            minor: 30.0,
            angle: 0.0,
        };
        DetectionResult::from_validation(contour, Validation::Accepted { hull, ellipse })
    }

    #[test]
    fn test_accepted_result_draws_every_layer() {
        let mut frame = Frame::filled(80, 80, [0, 0, 0], 0);
        OverlayAnnotator::new().annotate(&mut frame, &accepted());

        assert_eq!(frame.pixel(40, 40), Some(CENTER_COLOR));
        // Hull drawn over the identical contour
        assert_eq!(frame.pixel(40, 20), Some(HULL_COLOR));
        // Ellipse vertices at center ± semi-major along x
        assert_eq!(frame.pixel(65, 40), Some(ELLIPSE_COLOR));
        assert_eq!(frame.pixel(15, 40), Some(ELLIPSE_COLOR));
        assert_eq!(frame.pixel(2, 2), Some([0, 0, 0]));
    }

    #[test]
    fn test_rejected_result_leaves_frame_untouched() {
        let mut frame = Frame::filled(40, 40, [9, 9, 9], 0);
        let before = frame.clone();
        let rejected = DetectionResult {
            contour: Some(square(5, 5, 10)),
            ..DetectionResult::none()
        };
        OverlayAnnotator::new().annotate(&mut frame, &rejected);
        assert_eq!(frame, before);
    }

    #[test]
    fn test_contour_overlay_highlights_largest() {
        let mut frame = Frame::filled(100, 60, [0, 0, 0], 0);
        let contours = vec![square(5, 5, 10), square(40, 10, 30)];
        OverlayAnnotator::new().annotate_contours(&mut frame, &contours);

        assert_eq!(frame.pixel(5, 10), Some(HULL_COLOR));
        assert_eq!(frame.pixel(40, 20), Some(LARGEST_CONTOUR_COLOR));
        assert_eq!(frame.pixel(55, 25), Some([0, 0, 0]));
    }

    #[test]
    fn test_shapes_partly_outside_frame_are_clipped() {
        let mut frame = Frame::filled(30, 30, [0, 0, 0], 0);
        let contours = vec![square(-10, -10, 25)];
        OverlayAnnotator::new().annotate_contours(&mut frame, &contours);
        assert_eq!(frame.pixel(15, 5), Some(LARGEST_CONTOUR_COLOR));
    }
}
