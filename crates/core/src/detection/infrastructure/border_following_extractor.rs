use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};

use crate::detection::domain::contour::Contour;
use crate::detection::domain::contour_extractor::ContourExtractor;
use crate::detection::domain::mask::Mask;
use crate::shared::point::Point;

/// Suzuki–Abe border following via `imageproc`, keeping external borders only.
///
/// Each traced border is simplified down to its direction-change vertices.
#[derive(Clone, Copy, Debug, Default)]
pub struct BorderFollowingExtractor;

impl BorderFollowingExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl ContourExtractor for BorderFollowingExtractor {
    fn extract(&self, mask: &Mask) -> Vec<Contour> {
        if mask.is_empty() {
            return Vec::new();
        }
        find_contours::<i32>(&padded(mask))
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .map(|c| {
                Contour::simplified(
                    c.points
                        .iter()
                        .map(|p| Point::new(p.x - 1, p.y - 1))
                        .collect(),
                )
            })
            .collect()
    }
}

/// Copy of the mask inside a one-pixel background frame.
///
/// Border following misclassifies regions that touch the image edge at the
/// origin, so every region must be surrounded by background.
fn padded(mask: &Mask) -> GrayImage {
    let source = mask.as_gray_image();
    let mut image = GrayImage::new(source.width() + 2, source.height() + 2);
    for (x, y, pixel) in source.enumerate_pixels() {
        image.put_pixel(x + 1, y + 1, *pixel);
    }
    image
}
