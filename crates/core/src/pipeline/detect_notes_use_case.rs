use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::detection::domain::note_detector::NoteDetector;
use crate::video::domain::video_reader::VideoReader;

use super::detection_sink::DetectionSink;
use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};

/// Why a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The source ran out of frames.
    Exhausted,
    FrameLimit,
    /// The progress callback returned `false` or the cancel flag was set.
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames_processed: usize,
    pub frames_accepted: usize,
    pub stop_reason: StopReason,
}

/// Frame-at-a-time detection session: read → detect → sinks.
///
/// Frames are handled strictly in capture order and dropped once every sink
/// has seen them. The loop can stop between frames (frame limit, progress
/// callback, cancel flag); an acquisition or sink error ends the session
/// with that error.
pub struct DetectNotesUseCase {
    reader: Box<dyn VideoReader>,
    detector: Box<dyn NoteDetector>,
    sinks: Vec<Box<dyn DetectionSink>>,
    logger: Box<dyn PipelineLogger>,
    max_frames: Option<usize>,
    on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    cancelled: Arc<AtomicBool>,
}

impl DetectNotesUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        detector: Box<dyn NoteDetector>,
        sinks: Vec<Box<dyn DetectionSink>>,
    ) -> Self {
        Self {
            reader,
            detector,
            sinks,
            logger: Box::new(NullPipelineLogger),
            max_frames: None,
            on_progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
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

    /// `callback(processed, total)`; returning `false` stops after the
    /// current frame. `total` is 0 for live sources.
    pub fn with_progress(mut self, callback: Box<dyn Fn(usize, usize) -> bool + Send>) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub fn execute(&mut self, input: &Path) -> Result<SessionSummary, Box<dyn std::error::Error>> {
        let metadata = self.reader.open(input)?;
        if metadata.total_frames == 0 && !metadata.is_live() {
            log::warn!("{} reports no frames and no frame rate", input.display());
        }
        self.logger.info(&format!(
            "Detecting in {} ({}x{})",
            input.display(),
            metadata.width,
            metadata.height
        ));

        let total = match self.max_frames {
            Some(limit) if metadata.total_frames > 0 => limit.min(metadata.total_frames),
            Some(limit) => limit,
            None => metadata.total_frames,
        };

        let outcome = self.run_loop(total);
        self.reader.close();
        let summary = outcome?;

        for sink in &mut self.sinks {
            sink.finish()?;
        }
        self.logger.info(&format!(
            "Session ended ({:?}): {} of {} frames accepted",
            summary.stop_reason, summary.frames_accepted, summary.frames_processed
        ));
        self.logger.summary();
        Ok(summary)
    }

    fn run_loop(&mut self, total: usize) -> Result<SessionSummary, Box<dyn std::error::Error>> {
        let mut summary = SessionSummary {
            frames_processed: 0,
            frames_accepted: 0,
            stop_reason: StopReason::Exhausted,
        };

        // Stop checks come before the pull so a live source is not read again
        let mut frames = self.reader.frames();
        loop {
            if self.cancelled.load(Ordering::Relaxed) {
                summary.stop_reason = StopReason::Cancelled;
                break;
            }
            if self.max_frames.is_some_and(|limit| summary.frames_processed >= limit) {
                summary.stop_reason = StopReason::FrameLimit;
                break;
            }
            let Some(frame) = frames.next() else {
                break;
            };

            let frame = frame?;
            let start = Instant::now();
            let (result, stages) = self.detector.detect_timed(&frame);
            self.logger
                .timing("detect", start.elapsed().as_secs_f64() * 1000.0);
            for (stage, ms) in stages {
                self.logger.timing(stage, ms);
            }
            self.logger
                .metric("accepted", if result.accepted { 1.0 } else { 0.0 });
            if let Some(contour) = &result.contour {
                self.logger.metric("candidate_area", contour.area());
            }

            for sink in &mut self.sinks {
                sink.consume(&frame, &result)?;
            }

            summary.frames_processed += 1;
            if result.accepted {
                summary.frames_accepted += 1;
            }
            self.logger.progress(summary.frames_processed, total);

            if let Some(callback) = &self.on_progress {
                if !callback(summary.frames_processed, total) {
                    summary.stop_reason = StopReason::Cancelled;
                    break;
                }
            }
        }

        Ok(summary)
    }
}
