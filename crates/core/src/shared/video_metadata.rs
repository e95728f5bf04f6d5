use std::path::PathBuf;

/// Properties of an opened frame source.
///
/// Live capture devices report `total_frames == 0` because the stream has
/// no known end.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    pub fn is_live(&self) -> bool {
        self.total_frames == 0 && self.fps > 0.0
    }
}
