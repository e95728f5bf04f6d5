use super::detection_result::DetectionResult;
use crate::shared::frame::Frame;

/// Wall-clock milliseconds spent in each named detection stage.
pub type StageTimings = Vec<(&'static str, f64)>;

/// Locates the note in a single frame.
///
/// Detection holds no state between calls, so one detector can serve
/// several threads. Not finding a note is a normal result, not an error.
pub trait NoteDetector: Send + Sync {
    fn detect(&self, frame: &Frame) -> DetectionResult;

    /// Same as [`detect`](Self::detect), also reporting per-stage timings.
    /// Implementations without stages report none.
    fn detect_timed(&self, frame: &Frame) -> (DetectionResult, StageTimings) {
        (self.detect(frame), Vec::new())
    }
}
