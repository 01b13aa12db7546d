//! Neighbourhood filters: Gaussian blur and Canny edge detection.

use image::{Rgb, RgbImage, imageops};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;

use super::FrameFilter;

/// Gaussian blur. The default sigma matches a 15x15 kernel.
#[derive(Debug, Clone, Copy)]
pub struct Blur {
    pub sigma: f32,
}

impl Default for Blur {
    fn default() -> Self {
        // 0.3 * ((15 - 1) / 2 - 1) + 0.8
        Self { sigma: 2.6 }
    }
}

impl FrameFilter for Blur {
    fn apply(&self, frame: &mut RgbImage) {
        *frame = gaussian_blur_f32(&*frame, self.sigma);
    }
}

/// Canny edges of the luma plane, white on black.
#[derive(Debug, Clone, Copy)]
pub struct EdgeDetection {
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl Default for EdgeDetection {
    fn default() -> Self {
        Self {
            low_threshold: 100.0,
            high_threshold: 200.0,
        }
    }
}

impl FrameFilter for EdgeDetection {
    fn apply(&self, frame: &mut RgbImage) {
        let gray = imageops::grayscale(&*frame);
        let edges = canny(&gray, self.low_threshold, self.high_threshold);
        for (x, y, pixel) in frame.enumerate_pixels_mut() {
            let v = edges.get_pixel(x, y).0[0];
            *pixel = Rgb([v, v, v]);
        }
    }
}
