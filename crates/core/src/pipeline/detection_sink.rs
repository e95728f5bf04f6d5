use crate::detection::domain::detection_result::DetectionResult;
use crate::shared::frame::Frame;

/// Downstream consumer of per-frame results.
///
/// Receives the original (unsmoothed) frame alongside its result. A sink
/// error ends the session.
pub trait DetectionSink: Send {
    fn consume(
        &mut self,
        frame: &Frame,
        result: &DetectionResult,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Called once after the last frame. Default: nothing to flush.
    fn finish(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}
