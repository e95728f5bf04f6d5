pub mod annotated_frame_sink;
pub mod json_lines_sink;
