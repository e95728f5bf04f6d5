pub mod border_following_extractor;
pub mod color_note_detector;
pub mod gaussian_smoother;
