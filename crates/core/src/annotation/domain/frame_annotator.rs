use crate::detection::domain::contour::Contour;
use crate::detection::domain::detection_result::DetectionResult;
use crate::shared::frame::Frame;

/// Draws detection output onto frames for display or inspection.
///
/// Drawing never feeds back into detection; it always runs on the original
/// unsmoothed frame after the result is known.
pub trait FrameAnnotator: Send + Sync {
    fn annotate(&self, frame: &mut Frame, result: &DetectionResult);

    /// Overlay for tuning the color range: every contour, largest highlighted.
    fn annotate_contours(&self, frame: &mut Frame, contours: &[Contour]);
}
