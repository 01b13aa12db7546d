// ============================================================================
// vidrender-core/src/filters/color.rs
// ============================================================================
//
// COLOR FILTERS: Per-Pixel Color Transforms
//
// Each filter maps one RGB pixel to another without looking at neighbours.
// Channel arithmetic is done in f32 and rounded/clamped back into u8.

use image::RgbImage;

use super::{FrameFilter, clamp_channel, map_pixels};

/// ITU-R BT.601 luma.
#[inline]
fn luma(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

#[inline]
fn channels(px: [u8; 3]) -> (f32, f32, f32) {
    (f32::from(px[0]), f32::from(px[1]), f32::from(px[2]))
}

// ---- Grayscale ----

#[derive(Debug, Clone, Copy, Default)]
pub struct Grayscale;

impl FrameFilter for Grayscale {
    fn apply(&self, frame: &mut RgbImage) {
        map_pixels(frame, |px| {
            let (r, g, b) = channels(px);
            let y = clamp_channel(luma(r, g, b));
            [y, y, y]
        });
    }
}

// ---- Sepia ----

#[derive(Debug, Clone, Copy, Default)]
pub struct Sepia;

impl FrameFilter for Sepia {
    fn apply(&self, frame: &mut RgbImage) {
        map_pixels(frame, |px| {
            let (r, g, b) = channels(px);
            [
                clamp_channel(0.393 * r + 0.769 * g + 0.189 * b),
                clamp_channel(0.349 * r + 0.686 * g + 0.168 * b),
                clamp_channel(0.272 * r + 0.534 * g + 0.131 * b),
            ]
        });
    }
}

// ---- Brightness ----

/// Scales HSV value, keeping hue and saturation.
#[derive(Debug, Clone, Copy)]
pub struct Brightness {
    pub factor: f32,
}

impl Default for Brightness {
    fn default() -> Self {
        Self { factor: 1.2 }
    }
}

impl FrameFilter for Brightness {
    fn apply(&self, frame: &mut RgbImage) {
        let factor = self.factor;
        map_pixels(frame, |px| {
            let (r, g, b) = channels(px);
            let value = r.max(g).max(b);
            if value == 0.0 {
                return px;
            }
            // Scaling every channel by the same ratio leaves H and S alone.
            let scale = (value * factor).min(255.0) / value;
            [
                clamp_channel(r * scale),
                clamp_channel(g * scale),
                clamp_channel(b * scale),
            ]
        });
    }
}

// ---- Contrast ----

#[derive(Debug, Clone, Copy)]
pub struct Contrast {
    pub gain: f32,
}

impl Default for Contrast {
    fn default() -> Self {
        Self { gain: 1.3 }
    }
}

impl FrameFilter for Contrast {
    fn apply(&self, frame: &mut RgbImage) {
        let gain = self.gain;
        map_pixels(frame, |px| {
            let (r, g, b) = channels(px);
            [
                clamp_channel(r * gain),
                clamp_channel(g * gain),
                clamp_channel(b * gain),
            ]
        });
    }
}

// ---- Saturation ----

/// Scales HSV saturation, keeping hue and value.
#[derive(Debug, Clone, Copy)]
pub struct Saturation {
    pub factor: f32,
}

impl Default for Saturation {
    fn default() -> Self {
        Self { factor: 1.25 }
    }
}

impl FrameFilter for Saturation {
    fn apply(&self, frame: &mut RgbImage) {
        let factor = self.factor;
        map_pixels(frame, |px| {
            let (r, g, b) = channels(px);
            let value = r.max(g).max(b);
            let min = r.min(g).min(b);
            if value == 0.0 || value == min {
                return px;
            }
            let saturation = (value - min) / value;
            let boosted = (saturation * factor).min(1.0);
            let k = boosted / saturation;
            // Every channel keeps its distance ratio to the max channel.
            [
                clamp_channel(value - (value - r) * k),
                clamp_channel(value - (value - g) * k),
                clamp_channel(value - (value - b) * k),
            ]
        });
    }
}

// ---- Tones ----

#[derive(Debug, Clone, Copy, Default)]
pub struct WarmTone;

impl FrameFilter for WarmTone {
    fn apply(&self, frame: &mut RgbImage) {
        map_pixels(frame, |px| {
            let (r, g, b) = channels(px);
            [
                clamp_channel(r * 1.10),
                clamp_channel(g * 1.05),
                clamp_channel(b * 0.90),
            ]
        });
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CoolTone;

impl FrameFilter for CoolTone {
    fn apply(&self, frame: &mut RgbImage) {
        map_pixels(frame, |px| {
            let (r, g, b) = channels(px);
            [
                clamp_channel(r * 0.90),
                clamp_channel(g * 1.05),
                clamp_channel(b * 1.15),
            ]
        });
    }
}
