use std::path::{Path, PathBuf};

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::detection::domain::candidate_selector::select_candidate;
use crate::detection::infrastructure::color_note_detector::ColorNoteDetector;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;

use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CalibrationSummary {
    pub frames_processed: usize,
    /// Frames whose mask had at least one region.
    pub frames_with_regions: usize,
    /// Largest region area seen over the whole session.
    pub largest_area: Option<f64>,
}

/// Offline color-range tuning.
///
/// For every frame writes the thresholded mask (`mask_NNNNNN.png`) and an
/// overlay of all extracted contours with the largest highlighted
/// (`overlay_NNNNNN.png`), so bounds can be adjusted between runs.
pub struct CalibrateBoundsUseCase {
    reader: Box<dyn VideoReader>,
    detector: ColorNoteDetector,
    annotator: Box<dyn FrameAnnotator>,
    writer: Box<dyn ImageWriter>,
    logger: Box<dyn PipelineLogger>,
    max_frames: Option<usize>,
}

impl CalibrateBoundsUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        detector: ColorNoteDetector,
        annotator: Box<dyn FrameAnnotator>,
        writer: Box<dyn ImageWriter>,
    ) -> Self {
        Self {
            reader,
            detector,
            annotator,
            writer,
            logger: Box::new(NullPipelineLogger),
            max_frames: None,
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_max_frames(mut self, max_frames: Option<usize>) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn execute(
        &mut self,
        input: &Path,
        output_dir: &Path,
    ) -> Result<CalibrationSummary, Box<dyn std::error::Error>> {
        let metadata = self.reader.open(input)?;
        self.logger.info(&format!(
            "Calibrating on {} ({}x{}), writing to {}",
            input.display(),
            metadata.width,
            metadata.height,
            output_dir.display()
        ));
        let total = self
            .max_frames
            .map_or(metadata.total_frames, |limit| match metadata.total_frames {
                0 => limit,
                n => limit.min(n),
            });

        let outcome = self.run_loop(output_dir, total);
        self.reader.close();
        let summary = outcome?;

        self.logger.info(&format!(
            "Calibration done: {} frames, {} with regions, largest area {}",
            summary.frames_processed,
            summary.frames_with_regions,
            summary
                .largest_area
                .map_or_else(|| "n/a".to_string(), |a| format!("{a:.1}"))
        ));
        self.logger.summary();
        Ok(summary)
    }

    fn run_loop(
        &mut self,
        output_dir: &Path,
        total: usize,
    ) -> Result<CalibrationSummary, Box<dyn std::error::Error>> {
        let mut summary = CalibrationSummary::default();

        let limit = self.max_frames.unwrap_or(usize::MAX);
        for frame in self.reader.frames().take(limit) {
            let frame = frame?;
            let (mask, contours) = self.detector.segment_and_extract(&frame);
            let largest = select_candidate(&contours).map(|c| c.area());

            log::info!(
                "Frame {}: {} contours, largest area {}",
                frame.index(),
                contours.len(),
                largest.map_or_else(|| "n/a".to_string(), |a| format!("{a:.1}"))
            );
            self.logger.metric("contours", contours.len() as f64);
            if let Some(area) = largest {
                self.logger.metric("largest_area", area);
                summary.frames_with_regions += 1;
                summary.largest_area = Some(summary.largest_area.map_or(area, |a| a.max(area)));
            }

            self.writer
                .write_mask(&mask_path(output_dir, frame.index()), &mask)?;
            let mut overlay = frame;
            self.annotator.annotate_contours(&mut overlay, &contours);
            self.writer
                .write_frame(&overlay_path(output_dir, overlay.index()), &overlay)?;

            summary.frames_processed += 1;
            self.logger.progress(summary.frames_processed, total);
        }

        Ok(summary)
    }
}

pub fn mask_path(output_dir: &Path, index: usize) -> PathBuf {
    output_dir.join(format!("mask_{index:06}.png"))
}

pub fn overlay_path(output_dir: &Path, index: usize) -> PathBuf {
    output_dir.join(format!("overlay_{index:06}.png"))
}
