use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use note_finder_core::annotation::infrastructure::overlay_annotator::OverlayAnnotator;
use note_finder_core::detection::domain::detector_config::DetectorConfig;
use note_finder_core::detection::infrastructure::color_note_detector::ColorNoteDetector;
use note_finder_core::pipeline::calibrate_bounds_use_case::CalibrateBoundsUseCase;
use note_finder_core::pipeline::detect_notes_use_case::DetectNotesUseCase;
use note_finder_core::pipeline::detection_sink::DetectionSink;
use note_finder_core::pipeline::infrastructure::annotated_frame_sink::AnnotatedFrameSink;
use note_finder_core::pipeline::infrastructure::json_lines_sink::JsonLinesSink;
use note_finder_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use note_finder_core::video::domain::video_reader::VideoReader;
use note_finder_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use note_finder_core::video::infrastructure::image_file_reader::{is_image_path, ImageFileReader};
use note_finder_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Finds a colored disk ("note") in camera streams, videos and images.
#[derive(Parser)]
#[command(name = "note-finder", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect the note in every frame and report one JSON line per frame.
    Detect(DetectArgs),
    /// Write masks and contour overlays to tune the color range.
    Calibrate(CalibrateArgs),
}

#[derive(Args)]
struct DetectArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    detector: DetectorArgs,

    /// Save annotated frames to this directory.
    #[arg(long)]
    annotate_dir: Option<PathBuf>,

    /// Only save annotated frames that have a detection.
    #[arg(long, requires = "annotate_dir")]
    accepted_only: bool,

    /// JSON lines output file (default: stdout).
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct CalibrateArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Directory for mask_NNNNNN.png and overlay_NNNNNN.png files.
    out_dir: PathBuf,

    #[command(flatten)]
    detector: DetectorArgs,

    /// Write the effective detector config as JSON after the run.
    #[arg(long)]
    save_config: Option<PathBuf>,
}

#[derive(Args)]
struct SourceArgs {
    /// Video file, image, image directory, or capture device.
    input: PathBuf,

    /// FFmpeg input format for capture devices (e.g. v4l2, avfoundation).
    #[arg(long)]
    input_format: Option<String>,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,
}

#[derive(Args)]
struct DetectorArgs {
    /// JSON detector config; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Lower color bound as R,G,B.
    #[arg(long, value_parser = parse_rgb)]
    lower: Option<[u8; 3]>,

    /// Upper color bound as R,G,B.
    #[arg(long, value_parser = parse_rgb)]
    upper: Option<[u8; 3]>,

    /// Minimum contour area in pixels.
    #[arg(long)]
    min_area: Option<f64>,

    /// Minimum circularity 4πA/P² (0.0-1.0].
    #[arg(long, conflicts_with = "no_circularity")]
    circularity_min: Option<f64>,

    /// Disable the circularity check.
    #[arg(long)]
    no_circularity: bool,

    /// Hull-to-ellipse area ratio a note must exceed (0.0-1.0).
    #[arg(long)]
    hull_ratio: Option<f64>,

    /// Gaussian kernel applied before thresholding (odd, 0 or 1 disables).
    #[arg(long)]
    blur_kernel: Option<usize>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Detect(args) => run_detect(args),
        Command::Calibrate(args) => run_calibrate(args),
    }
}

fn run_detect(args: DetectArgs) -> Result<(), Box<dyn std::error::Error>> {
    args.source.validate()?;
    let config = args.detector.to_config()?;
    let detector = ColorNoteDetector::new(&config)?;

    let mut sinks: Vec<Box<dyn DetectionSink>> = Vec::new();
    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| format!("Failed to create {}: {e}", path.display()))?;
            sinks.push(Box::new(JsonLinesSink::new(BufWriter::new(file))));
        }
        None => sinks.push(Box::new(JsonLinesSink::new(io::stdout()))),
    }
    if let Some(dir) = &args.annotate_dir {
        sinks.push(Box::new(
            AnnotatedFrameSink::new(
                dir,
                Box::new(OverlayAnnotator::new()),
                Box::new(ImageFileWriter::new()),
            )
            .accepted_only(args.accepted_only),
        ));
    }

    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(|current, total| {
        if total > 0 {
            eprint!("\rProcessing frame {current}/{total}");
        } else {
            eprint!("\rProcessing frame {current}");
        }
        true
    });

    let mut use_case =
        DetectNotesUseCase::new(open_reader(&args.source), Box::new(detector), sinks)
            .with_logger(Box::new(StdoutPipelineLogger::default()))
            .with_max_frames(args.source.max_frames)
            .with_progress(progress);
    let summary = use_case.execute(&args.source.input)?;
    eprintln!();
    log::info!(
        "Note found in {} of {} frames",
        summary.frames_accepted,
        summary.frames_processed
    );
    if let Some(path) = &args.output {
        log::info!("Detections written to {}", path.display());
    }
    Ok(())
}

fn run_calibrate(args: CalibrateArgs) -> Result<(), Box<dyn std::error::Error>> {
    args.source.validate()?;
    let config = args.detector.to_config()?;
    let detector = ColorNoteDetector::new(&config)?;

    let mut use_case = CalibrateBoundsUseCase::new(
        open_reader(&args.source),
        detector,
        Box::new(OverlayAnnotator::new()),
        Box::new(ImageFileWriter::new()),
    )
    .with_logger(Box::new(StdoutPipelineLogger::default()))
    .with_max_frames(args.source.max_frames);
    let summary = use_case.execute(&args.source.input, &args.out_dir)?;
    log::info!(
        "Wrote {} mask/overlay pairs to {}",
        summary.frames_processed,
        args.out_dir.display()
    );

    if let Some(path) = &args.save_config {
        config.save(path)?;
        log::info!("Config saved to {}", path.display());
    }
    Ok(())
}

impl SourceArgs {
    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        // Device names like "0" or "testsrc" are not paths.
        if self.input_format.is_none() && !self.input.exists() {
            return Err(format!("Input not found: {}", self.input.display()).into());
        }
        if self.max_frames == Some(0) {
            return Err("--max-frames must be at least 1".into());
        }
        Ok(())
    }
}

impl DetectorArgs {
    /// Config file (or defaults) with command-line overrides applied,
    /// validated once after layering.
    fn to_config(&self) -> Result<DetectorConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => DetectorConfig::read(path)?,
            None => DetectorConfig::default(),
        };
        if let Some(lower) = self.lower {
            config.lower_bound = lower;
        }
        if let Some(upper) = self.upper {
            config.upper_bound = upper;
        }
        if let Some(min_area) = self.min_area {
            config.min_area = min_area;
        }
        if self.no_circularity {
            config.circularity_min = None;
        } else if let Some(c) = self.circularity_min {
            config.circularity_min = Some(c);
        }
        if let Some(ratio) = self.hull_ratio {
            config.hull_ratio_threshold = ratio;
        }
        if let Some(kernel) = self.blur_kernel {
            config.blur_kernel_size = kernel;
        }
        config.validate()?;
        Ok(config)
    }
}

fn open_reader(source: &SourceArgs) -> Box<dyn VideoReader> {
    match &source.input_format {
        Some(format) => Box::new(FfmpegReader::with_input_format(format.clone())),
        None if source.input.is_dir() || is_image_path(&source.input) => {
            Box::new(ImageFileReader::new())
        }
        None => Box::new(FfmpegReader::new()),
    }
}

fn parse_rgb(value: &str) -> Result<[u8; 3], String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let [r, g, b] = parts[..] else {
        return Err(format!("expected R,G,B, got '{value}'"));
    };
    let channel = |s: &str| {
        s.parse::<u8>()
            .map_err(|_| format!("channel '{s}' is not an integer in 0-255"))
    };
    Ok([channel(r)?, channel(g)?, channel(b)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn detect_args(argv: &[&str]) -> DetectArgs {
        let mut full = vec!["note-finder", "detect"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Command::Detect(args) => args,
            Command::Calibrate(_) => panic!("expected detect"),
        }
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_rgb() {
        assert_eq!(parse_rgb("191,54,0"), Ok([191, 54, 0]));
        assert_eq!(parse_rgb(" 1, 2 ,3"), Ok([1, 2, 3]));
        assert!(parse_rgb("1,2").is_err());
        assert!(parse_rgb("1,2,3,4").is_err());
        assert!(parse_rgb("1,2,256").is_err());
        assert!(parse_rgb("a,b,c").is_err());
    }

    #[test]
    fn test_defaults_without_overrides() {
        let args = detect_args(&["cam.mp4"]);
        assert_eq!(args.detector.to_config().unwrap(), DetectorConfig::default());
        assert!(args.output.is_none());
        assert!(args.source.max_frames.is_none());
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = detect_args(&[
            "cam.mp4",
            "--lower",
            "10,20,30",
            "--upper",
            "200,210,220",
            "--min-area",
            "50",
            "--hull-ratio",
            "0.7",
            "--blur-kernel",
            "0",
            "--no-circularity",
        ]);
        let config = args.detector.to_config().unwrap();
        assert_eq!(config.lower_bound, [10, 20, 30]);
        assert_eq!(config.upper_bound, [200, 210, 220]);
        assert_eq!(config.min_area, 50.0);
        assert_eq!(config.hull_ratio_threshold, 0.7);
        assert_eq!(config.blur_kernel_size, 0);
        assert_eq!(config.circularity_min, None);
    }

    #[test]
    fn test_circularity_flags_conflict() {
        let result = Cli::try_parse_from([
            "note-finder",
            "detect",
            "cam.mp4",
            "--circularity-min",
            "0.5",
            "--no-circularity",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_inverted_bounds_fail_validation() {
        let args = detect_args(&["cam.mp4", "--lower", "200,0,0", "--upper", "100,255,255"]);
        let err = args.detector.to_config().unwrap_err();
        assert!(err.to_string().contains("channel 0"));
    }

    #[test]
    fn test_flags_layer_over_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.json");
        DetectorConfig {
            min_area: 900.0,
            lower_bound: [100, 100, 100],
            ..DetectorConfig::default()
        }
        .save(&path)
        .unwrap();

        let args = detect_args(&[
            "cam.mp4",
            "--config",
            path.to_str().unwrap(),
            "--min-area",
            "1200",
        ]);
        let config = args.detector.to_config().unwrap();
        assert_eq!(config.min_area, 1200.0);
        assert_eq!(config.lower_bound, [100, 100, 100]);
    }

    #[test]
    fn test_flags_can_repair_invalid_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inverted.json");
        std::fs::write(
            &path,
            r#"{ "lower_bound": [255, 0, 0], "upper_bound": [0, 255, 255] }"#,
        )
        .unwrap();
        let path = path.to_str().unwrap();

        let unfixed = detect_args(&["cam.mp4", "--config", path]);
        assert!(unfixed.detector.to_config().is_err());

        let fixed = detect_args(&["cam.mp4", "--config", path, "--lower", "0,0,0"]);
        let config = fixed.detector.to_config().unwrap();
        assert_eq!(config.lower_bound, [0, 0, 0]);
        assert_eq!(config.upper_bound, [0, 255, 255]);
    }

    #[test]
    fn test_calibrate_arguments() {
        let cli = Cli::try_parse_from([
            "note-finder",
            "calibrate",
            "/dev/video1",
            "out",
            "--input-format",
            "v4l2",
            "--max-frames",
            "30",
            "--save-config",
            "note.json",
        ])
        .unwrap();
        let Command::Calibrate(args) = cli.command else {
            panic!("expected calibrate");
        };
        assert_eq!(args.source.input, PathBuf::from("/dev/video1"));
        assert_eq!(args.out_dir, PathBuf::from("out"));
        assert_eq!(args.source.input_format.as_deref(), Some("v4l2"));
        assert_eq!(args.source.max_frames, Some(30));
        assert_eq!(args.save_config, Some(PathBuf::from("note.json")));
    }

    #[test]
    fn test_missing_input_file_is_reported() {
        let args = detect_args(&["/no/such/clip.mp4"]);
        let err = args.source.validate().unwrap_err();
        assert!(err.to_string().contains("Input not found"));
    }

    #[test]
    fn test_device_input_skips_existence_check() {
        let args = detect_args(&["testsrc", "--input-format", "lavfi"]);
        assert!(args.source.validate().is_ok());
    }

    #[test]
    fn test_zero_frame_limit_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let args = detect_args(&[dir.path().to_str().unwrap(), "--max-frames", "0"]);
        assert!(args.source.validate().is_err());
    }

    #[test]
    fn test_accepted_only_requires_annotate_dir() {
        let result = Cli::try_parse_from(["note-finder", "detect", "cam.mp4", "--accepted-only"]);
        assert!(result.is_err());
    }
}
