use crate::shared::frame::Frame;

/// Noise suppression applied to a frame before color segmentation.
///
/// Modifies the frame in place; callers that still need the raw pixels
/// smooth a copy.
pub trait FrameSmoother: Send + Sync {
    fn smooth(&self, frame: &mut Frame);
}
