pub mod calibrate_bounds_use_case;
pub mod detect_notes_use_case;
pub mod detection_sink;
pub mod infrastructure;
pub mod pipeline_logger;
