use std::time::Instant;

use crate::detection::domain::candidate_selector::select_candidate;
use crate::detection::domain::color_range::ColorRange;
use crate::detection::domain::color_segmenter::segment;
use crate::detection::domain::contour::Contour;
use crate::detection::domain::contour_extractor::ContourExtractor;
use crate::detection::domain::detection_result::DetectionResult;
use crate::detection::domain::detector_config::{ConfigError, DetectorConfig};
use crate::detection::domain::frame_smoother::FrameSmoother;
use crate::detection::domain::mask::Mask;
use crate::detection::domain::note_detector::{NoteDetector, StageTimings};
use crate::detection::domain::shape_validator::{ShapeValidator, Validation};
use crate::shared::frame::Frame;

use super::border_following_extractor::BorderFollowingExtractor;
use super::gaussian_smoother::GaussianSmoother;

/// Color-threshold note detector.
///
/// Per frame: smooth a copy, segment by color range, trace external
/// contours, take the largest one and run it through the shape gate.
pub struct ColorNoteDetector {
    range: ColorRange,
    smoother: Box<dyn FrameSmoother>,
    extractor: Box<dyn ContourExtractor>,
    validator: ShapeValidator,
}

impl ColorNoteDetector {
    /// Validates `config` and wires the default smoother and extractor.
    pub fn new(config: &DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_components(
            config.color_range(),
            Box::new(GaussianSmoother::new(config.blur_kernel_size)),
            Box::new(BorderFollowingExtractor::new()),
            ShapeValidator::from_config(config),
        ))
    }

    pub fn with_components(
        range: ColorRange,
        smoother: Box<dyn FrameSmoother>,
        extractor: Box<dyn ContourExtractor>,
        validator: ShapeValidator,
    ) -> Self {
        Self {
            range,
            smoother,
            extractor,
            validator,
        }
    }

    /// Smoothing, segmentation and contour tracing without validation.
    pub fn segment_and_extract(&self, frame: &Frame) -> (Mask, Vec<Contour>) {
        let mut timings = Vec::new();
        self.segment_and_extract_timed(frame, &mut timings)
    }

    fn segment_and_extract_timed(
        &self,
        frame: &Frame,
        timings: &mut StageTimings,
    ) -> (Mask, Vec<Contour>) {
        let start = Instant::now();
        let mut smoothed = frame.clone();
        self.smoother.smooth(&mut smoothed);
        timings.push(("smooth", elapsed_ms(start)));

        let start = Instant::now();
        let mask = segment(&smoothed, &self.range);
        timings.push(("segment", elapsed_ms(start)));

        let start = Instant::now();
        let contours = self.extractor.extract(&mask);
        timings.push(("extract", elapsed_ms(start)));

        (mask, contours)
    }
}

impl NoteDetector for ColorNoteDetector {
    fn detect(&self, frame: &Frame) -> DetectionResult {
        self.detect_timed(frame).0
    }

    fn detect_timed(&self, frame: &Frame) -> (DetectionResult, StageTimings) {
        let mut timings = Vec::with_capacity(4);
        let (_, contours) = self.segment_and_extract_timed(frame, &mut timings);

        let Some(candidate) = select_candidate(&contours) else {
            log::debug!("Frame {}: no region in color range", frame.index());
            return (DetectionResult::none(), timings);
        };

        let start = Instant::now();
        let validation = self.validator.validate(candidate);
        timings.push(("validate", elapsed_ms(start)));

        match &validation {
            Validation::Accepted { ellipse, .. } => log::debug!(
                "Frame {}: note at ({:.1}, {:.1}) from {} contours",
                frame.index(),
                ellipse.center_x,
                ellipse.center_y,
                contours.len()
            ),
            Validation::Rejected(reason) => {
                log::debug!("Frame {}: candidate rejected, {reason}", frame.index())
            }
        }

        (
            DetectionResult::from_validation(candidate.clone(), validation),
            timings,
        )
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
