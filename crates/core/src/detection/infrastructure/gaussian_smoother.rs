use crate::detection::domain::frame_smoother::FrameSmoother;
use crate::shared::frame::{Frame, CHANNELS};

/// Separable Gaussian blur over all three channels.
///
/// Sigma follows the usual derivation from kernel size,
/// `0.3·((k − 1)/2 − 1) + 0.8`, and borders reflect without repeating the
/// edge pixel.
pub struct GaussianSmoother {
    kernel: Vec<f32>,
}

impl GaussianSmoother {
    /// `kernel_size` of 0 or 1 yields a smoother that leaves frames as-is.
    pub fn new(kernel_size: usize) -> Self {
        let kernel = if kernel_size <= 1 {
            Vec::new()
        } else {
            gaussian_kernel_1d(kernel_size | 1)
        };
        Self { kernel }
    }

    pub fn is_identity(&self) -> bool {
        self.kernel.len() <= 1
    }
}

impl FrameSmoother for GaussianSmoother {
    fn smooth(&self, frame: &mut Frame) {
        if self.is_identity() {
            return;
        }
        let (width, height) = (frame.width() as usize, frame.height() as usize);
        if width == 0 || height == 0 {
            return;
        }
        let mut temp = vec![0.0f32; width * height * CHANNELS];
        separable_blur(frame.data_mut(), width, height, &self.kernel, &mut temp);
    }
}

/// Normalised 1D Gaussian weights for an odd `kernel_size`.
pub fn gaussian_kernel_1d(kernel_size: usize) -> Vec<f32> {
    debug_assert!(kernel_size % 2 == 1);
    let sigma = 0.3 * ((kernel_size as f64 - 1.0) * 0.5 - 1.0) + 0.8;
    let half = (kernel_size / 2) as f64;
    let weights: Vec<f64> = (0..kernel_size)
        .map(|i| {
            let x = i as f64 - half;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.iter().map(|&w| (w / sum) as f32).collect()
}

/// Index into `0..len` after reflecting about the edges (`dcb|abcd|cba`).
fn reflect(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let period = 2 * last;
    let m = i.rem_euclid(period);
    (if m > last { period - m } else { m }) as usize
}

fn separable_blur(data: &mut [u8], width: usize, height: usize, kernel: &[f32], temp: &mut [f32]) {
    let half = (kernel.len() / 2) as isize;

    for y in 0..height {
        let row = y * width;
        for x in 0..width {
            for c in 0..CHANNELS {
                let sum: f32 = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, &w)| {
                        let sx = reflect(x as isize + k as isize - half, width);
                        data[(row + sx) * CHANNELS + c] as f32 * w
                    })
                    .sum();
                temp[(row + x) * CHANNELS + c] = sum;
            }
        }
    }

    for y in 0..height {
        for x in 0..width {
            for c in 0..CHANNELS {
                let sum: f32 = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, &w)| {
                        let sy = reflect(y as isize + k as isize - half, height);
                        temp[(sy * width + x) * CHANNELS + c] * w
                    })
                    .sum();
                data[(y * width + x) * CHANNELS + c] = sum.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}
