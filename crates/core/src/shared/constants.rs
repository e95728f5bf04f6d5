/// Default lower color bound, in frame channel order (R, G, B).
pub const DEFAULT_LOWER_RGB: [u8; 3] = [191, 54, 0];
/// Default upper color bound, in frame channel order (R, G, B).
pub const DEFAULT_UPPER_RGB: [u8; 3] = [255, 185, 108];

/// Smallest contour area (square pixels) that can still be a note.
pub const DEFAULT_MIN_CONTOUR_AREA: f64 = 400.0;

/// Circularity floor; `4π·area/perimeter²` is 1.0 for a perfect circle.
pub const DEFAULT_CIRCULARITY_MIN: f64 = 0.1;

/// Hull area over fitted ellipse area must exceed this to count as a disk.
pub const DEFAULT_HULL_RATIO_THRESHOLD: f64 = 0.5;

/// Gaussian kernel applied before segmentation. 0 or 1 disables smoothing.
pub const DEFAULT_BLUR_KERNEL_SIZE: usize = 5;

/// Minimum number of points a conic fit needs.
pub const MIN_ELLIPSE_FIT_POINTS: usize = 5;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
