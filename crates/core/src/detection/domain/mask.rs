use image::{GrayImage, Luma};

const ON: u8 = 255;

/// Per-pixel membership map with the same dimensions as its source frame.
///
/// Backed by an 8-bit image holding 0 or 255 so it can be handed to border
/// following and written out for calibration without conversion.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    image: GrayImage,
}

impl Mask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::new(width, height),
        }
    }

    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> Self {
        Self {
            image: GrayImage::from_fn(width, height, |x, y| Luma([if f(x, y) { ON } else { 0 }])),
        }
    }

    /// Builds a mask from row-major membership flags.
    pub fn from_bits(width: u32, height: u32, bits: impl IntoIterator<Item = bool>) -> Self {
        let raw: Vec<u8> = bits
            .into_iter()
            .map(|b| if b { ON } else { 0 })
            .collect();
        debug_assert_eq!(raw.len(), width as usize * height as usize);
        let image = GrayImage::from_raw(width, height, raw)
            .unwrap_or_else(|| GrayImage::new(width, height));
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width() && y < self.height() && self.image.get_pixel(x, y)[0] != 0
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x < self.width() && y < self.height() {
            self.image.put_pixel(x, y, Luma([if value { ON } else { 0 }]));
        }
    }

    /// Number of pixels marked true.
    pub fn count(&self) -> usize {
        self.image.as_raw().iter().filter(|&&v| v != 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.image.as_raw().iter().all(|&v| v == 0)
    }

    pub fn as_gray_image(&self) -> &GrayImage {
        &self.image
    }
}
