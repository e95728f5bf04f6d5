use std::path::{Path, PathBuf};

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::detection::domain::detection_result::DetectionResult;
use crate::pipeline::detection_sink::DetectionSink;
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

/// Draws each result onto a copy of its frame and saves it as
/// `frame_NNNNNN.png` in the output directory.
pub struct AnnotatedFrameSink {
    output_dir: PathBuf,
    annotator: Box<dyn FrameAnnotator>,
    writer: Box<dyn ImageWriter>,
    accepted_only: bool,
}

impl AnnotatedFrameSink {
    pub fn new(
        output_dir: &Path,
        annotator: Box<dyn FrameAnnotator>,
        writer: Box<dyn ImageWriter>,
    ) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            annotator,
            writer,
            accepted_only: false,
        }
    }

    /// Skip frames without an accepted detection.
    pub fn accepted_only(mut self, accepted_only: bool) -> Self {
        self.accepted_only = accepted_only;
        self
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.output_dir.join(format!("frame_{index:06}.png"))
    }
}

impl DetectionSink for AnnotatedFrameSink {
    fn consume(
        &mut self,
        frame: &Frame,
        result: &DetectionResult,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if self.accepted_only && !result.accepted {
            return Ok(());
        }
        let mut annotated = frame.clone();
        self.annotator.annotate(&mut annotated, result);
        self.writer
            .write_frame(&self.frame_path(frame.index()), &annotated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::contour::Contour;
    use crate::detection::domain::mask::Mask;
    use std::sync::{Arc, Mutex};

    type Written = Arc<Mutex<Vec<(PathBuf, Frame)>>>;

    struct StubWriter {
        written: Written,
    }

    impl ImageWriter for StubWriter {
        fn write_frame(
            &self,
            path: &Path,
            frame: &Frame,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.written
                .lock()
                .unwrap()
                .push((path.to_path_buf(), frame.clone()));
            Ok(())
        }

        fn write_mask(&self, _path: &Path, _mask: &Mask) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }
    }

    /// Paints the first pixel white when the result is accepted.
    struct MarkingAnnotator;

    impl FrameAnnotator for MarkingAnnotator {
        fn annotate(&self, frame: &mut Frame, result: &DetectionResult) {
            if result.accepted {
                frame.data_mut()[..3].copy_from_slice(&[255, 255, 255]);
            }
        }

        fn annotate_contours(&self, _frame: &mut Frame, _contours: &[Contour]) {}
    }

    fn sink(accepted_only: bool) -> (AnnotatedFrameSink, Written) {
        let written = Written::default();
        let sink = AnnotatedFrameSink::new(
            Path::new("/out"),
            Box::new(MarkingAnnotator),
            Box::new(StubWriter {
                written: written.clone(),
            }),
        )
        .accepted_only(accepted_only);
        (sink, written)
    }

    fn accepted() -> DetectionResult {
        DetectionResult {
            accepted: true,
            ..DetectionResult::none()
        }
    }

    #[test]
    fn test_writes_annotated_copy_named_by_index() {
        let (mut sink, written) = sink(false);
        let frame = Frame::filled(4, 4, [0, 0, 0], 12);
        sink.consume(&frame, &accepted()).unwrap();

        let written = written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].0, PathBuf::from("/out/frame_000012.png"));
        assert_eq!(written[0].1.pixel(0, 0), Some([255, 255, 255]));
        // The caller's frame is not modified
        assert_eq!(frame.pixel(0, 0), Some([0, 0, 0]));
    }

    #[test]
    fn test_accepted_only_skips_misses() {
        let (mut sink, written) = sink(true);
        let frame = Frame::filled(4, 4, [0, 0, 0], 0);
        sink.consume(&frame, &DetectionResult::none()).unwrap();
        sink.consume(&frame, &accepted()).unwrap();
        assert_eq!(written.lock().unwrap().len(), 1);
    }
}
