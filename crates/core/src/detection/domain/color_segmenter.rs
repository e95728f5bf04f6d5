use super::color_range::ColorRange;
use super::mask::Mask;
use crate::shared::frame::Frame;

/// Marks every pixel whose channels all fall inside `range`.
pub fn segment(frame: &Frame, range: &ColorRange) -> Mask {
    Mask::from_bits(
        frame.width(),
        frame.height(),
        frame.pixels().map(|px| range.contains(px)),
    )
}
