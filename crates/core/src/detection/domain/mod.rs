pub mod candidate_selector;
pub mod color_range;
pub mod color_segmenter;
pub mod contour;
pub mod contour_extractor;
pub mod convex_hull;
pub mod detection_result;
pub mod detector_config;
pub mod fitted_ellipse;
pub mod frame_smoother;
pub mod geometry_fitter;
pub mod mask;
pub mod note_detector;
pub mod shape_validator;
