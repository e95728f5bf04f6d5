use std::path::{Path, PathBuf};

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// Still images as a frame source: a single file, or every image in a
/// directory in file-name order.
///
/// Reported with `fps = 0`. All images must share the first one's
/// dimensions; a mismatch is an acquisition failure.
pub struct ImageFileReader {
    paths: Vec<PathBuf>,
    size: Option<(u32, u32)>,
}

impl ImageFileReader {
    pub fn new() -> Self {
        Self {
            paths: Vec::new(),
            size: None,
        }
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image_path(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn load_frame(path: &Path, index: usize) -> Result<Frame, Box<dyn std::error::Error>> {
    let image = image::open(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?
        .to_rgb8();
    Ok(Frame::from_rgb_image(image, index))
}

impl VideoReader for ImageFileReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        let paths = if path.is_dir() {
            list_images(path)?
        } else {
            vec![path.to_path_buf()]
        };
        let first = paths
            .first()
            .ok_or_else(|| format!("No images found in {}", path.display()))?;
        let (width, height) = image::image_dimensions(first)
            .map_err(|e| format!("Failed to read {}: {e}", first.display()))?;

        let metadata = VideoMetadata {
            width,
            height,
            fps: 0.0,
            total_frames: paths.len(),
            codec: String::new(),
            source_path: Some(path.to_path_buf()),
        };
        log::info!(
            "Opened {} image(s) from {} ({width}x{height})",
            paths.len(),
            path.display()
        );

        self.paths = paths;
        self.size = Some((width, height));
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let Some(expected) = self.size else {
            return Box::new(std::iter::once(Err("ImageFileReader: not opened".into())));
        };
        Box::new(self.paths.iter().enumerate().map(move |(index, path)| {
            let frame = load_frame(path, index)?;
            if (frame.width(), frame.height()) != expected {
                return Err(format!(
                    "{} is {}x{}, expected {}x{}",
                    path.display(),
                    frame.width(),
                    frame.height(),
                    expected.0,
                    expected.1
                )
                .into());
            }
            Ok(frame)
        }))
    }

    fn close(&mut self) {
        self.paths.clear();
        self.size = None;
    }
}
