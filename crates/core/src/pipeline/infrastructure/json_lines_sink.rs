use std::io::Write;

use serde::Serialize;

use crate::detection::domain::convex_hull::ConvexHull;
use crate::detection::domain::detection_result::DetectionResult;
use crate::detection::domain::fitted_ellipse::FittedEllipse;
use crate::pipeline::detection_sink::DetectionSink;
use crate::shared::frame::Frame;
use crate::shared::point::Point;

/// One JSON line per frame.
#[derive(Debug, Serialize)]
struct DetectionRecord<'a> {
    frame: usize,
    accepted: bool,
    center: Option<Point>,
    ellipse: Option<&'a FittedEllipse>,
    hull: Option<&'a ConvexHull>,
    contour_area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejection: Option<String>,
}

impl<'a> DetectionRecord<'a> {
    fn new(frame: &Frame, result: &'a DetectionResult) -> Self {
        Self {
            frame: frame.index(),
            accepted: result.accepted,
            center: result.center,
            ellipse: result.ellipse.as_ref(),
            hull: result.hull.as_ref(),
            contour_area: result.contour.as_ref().map(|c| c.area()),
            rejection: result.rejection.as_ref().map(ToString::to_string),
        }
    }
}

/// Streams results as JSON Lines to any writer (file, stdout, buffer).
pub struct JsonLinesSink<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> DetectionSink for JsonLinesSink<W> {
    fn consume(
        &mut self,
        frame: &Frame,
        result: &DetectionResult,
    ) -> Result<(), Box<dyn std::error::Error>> {
        serde_json::to_writer(&mut self.out, &DetectionRecord::new(frame, result))?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.out.flush()?;
        Ok(())
    }
}
