use std::path::Path;

use crate::detection::domain::mask::Mask;
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

/// Writes images with the `image` crate; the format follows the extension.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

impl ImageWriter for ImageFileWriter {
    fn write_frame(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        ensure_parent(path)?;
        let image = frame
            .to_rgb_image()
            .ok_or("Frame data does not match its dimensions")?;
        image.save(path)?;
        Ok(())
    }

    fn write_mask(&self, path: &Path, mask: &Mask) -> Result<(), Box<dyn std::error::Error>> {
        ensure_parent(path)?;
        mask.as_gray_image().save(path)?;
        Ok(())
    }
}
