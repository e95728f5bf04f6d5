pub mod constants;
pub mod frame;
pub mod point;
pub mod video_metadata;
