use std::path::Path;

use crate::detection::domain::mask::Mask;
use crate::shared::frame::Frame;

/// Persists frames and masks as image files.
pub trait ImageWriter: Send + Sync {
    fn write_frame(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Writes a mask as an 8-bit grayscale image (0 or 255).
    fn write_mask(&self, path: &Path, mask: &Mask) -> Result<(), Box<dyn std::error::Error>>;
}
