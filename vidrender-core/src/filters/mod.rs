//! Pixel filters applied to every decoded frame of a segment.
//!
//! The set of filters is closed: [`FilterKind`] names all of them, and each
//! kind maps to one [`FrameFilter`] implementation. Every filter is a pure,
//! deterministic function of the input frame, so the same segment filtered on
//! any thread produces identical pixels.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod color;
mod spatial;

pub use color::{Brightness, Contrast, CoolTone, Grayscale, Saturation, Sepia, WarmTone};
pub use spatial::{Blur, EdgeDetection};

/// The filters a job can be run with.
///
/// # Examples
///
/// ```rust
/// use vidrender_core::filters::FilterKind;
/// use std::str::FromStr;
///
/// assert_eq!(FilterKind::from_str("warm_tone").unwrap(), FilterKind::WarmTone);
/// assert_eq!(FilterKind::EdgeDetection.as_str(), "edge_detection");
/// assert!(FilterKind::from_str("rainbow").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Grayscale,
    Blur,
    Sepia,
    Brightness,
    Contrast,
    Saturation,
    WarmTone,
    CoolTone,
    EdgeDetection,
}

impl FilterKind {
    pub const ALL: [FilterKind; 9] = [
        FilterKind::Grayscale,
        FilterKind::Blur,
        FilterKind::Sepia,
        FilterKind::Brightness,
        FilterKind::Contrast,
        FilterKind::Saturation,
        FilterKind::WarmTone,
        FilterKind::CoolTone,
        FilterKind::EdgeDetection,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterKind::Grayscale => "grayscale",
            FilterKind::Blur => "blur",
            FilterKind::Sepia => "sepia",
            FilterKind::Brightness => "brightness",
            FilterKind::Contrast => "contrast",
            FilterKind::Saturation => "saturation",
            FilterKind::WarmTone => "warm_tone",
            FilterKind::CoolTone => "cool_tone",
            FilterKind::EdgeDetection => "edge_detection",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            FilterKind::Grayscale => "Convert to black and white",
            FilterKind::Blur => "Gaussian blur (15x15 kernel)",
            FilterKind::Sepia => "Vintage brown tone",
            FilterKind::Brightness => "Increase brightness by 20%",
            FilterKind::Contrast => "Increase contrast by 30%",
            FilterKind::Saturation => "Increase color saturation by 25%",
            FilterKind::WarmTone => "Shift colors toward red and yellow",
            FilterKind::CoolTone => "Shift colors toward blue",
            FilterKind::EdgeDetection => "Canny edge outline",
        }
    }

    /// Comma-separated list of every valid name, for error messages.
    pub fn variants_display() -> String {
        Self::ALL
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The per-frame implementation of this kind.
    pub fn frame_filter(self) -> Box<dyn FrameFilter> {
        match self {
            FilterKind::Grayscale => Box::new(Grayscale),
            FilterKind::Blur => Box::new(Blur::default()),
            FilterKind::Sepia => Box::new(Sepia),
            FilterKind::Brightness => Box::new(Brightness::default()),
            FilterKind::Contrast => Box::new(Contrast::default()),
            FilterKind::Saturation => Box::new(Saturation::default()),
            FilterKind::WarmTone => Box::new(WarmTone),
            FilterKind::CoolTone => Box::new(CoolTone),
            FilterKind::EdgeDetection => Box::new(EdgeDetection::default()),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for `FilterKind` parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterKindParseError {
    /// The name that matched no filter
    pub invalid_value: String,
}

impl fmt::Display for FilterKindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid filter '{}'. Valid filters: {}",
            self.invalid_value,
            FilterKind::variants_display()
        )
    }
}

impl std::error::Error for FilterKindParseError {}

impl From<FilterKindParseError> for crate::error::CoreError {
    fn from(err: FilterKindParseError) -> Self {
        crate::error::CoreError::InvalidFilter {
            name: err.invalid_value,
            valid: FilterKind::variants_display(),
        }
    }
}

impl FromStr for FilterKind {
    type Err = FilterKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| FilterKindParseError {
                invalid_value: s.to_string(),
            })
    }
}

/// A deterministic in-place transform of one RGB frame.
pub trait FrameFilter: Send + Sync {
    fn apply(&self, frame: &mut RgbImage);
}

/// Runs `f` on every pixel of `frame`.
pub(crate) fn map_pixels(frame: &mut RgbImage, f: impl Fn([u8; 3]) -> [u8; 3]) {
    for pixel in frame.pixels_mut() {
        pixel.0 = f(pixel.0);
    }
}

/// Rounds and clamps a channel value into `0..=255`.
#[inline]
pub(crate) fn clamp_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_round_trips_through_its_name() {
        for kind in FilterKind::ALL {
            assert_eq!(kind.as_str().parse::<FilterKind>().unwrap(), kind);
        }
    }

    #[test]
    fn parsing_ignores_case_and_whitespace() {
        assert_eq!(" Sepia ".parse::<FilterKind>().unwrap(), FilterKind::Sepia);
        assert_eq!("COOL_TONE".parse::<FilterKind>().unwrap(), FilterKind::CoolTone);
    }

    #[test]
    fn unknown_name_lists_valid_filters() {
        let err = "rainbow".parse::<FilterKind>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("rainbow"));
        assert!(message.contains("edge_detection"));
    }

    #[test]
    fn every_kind_keeps_frame_dimensions() {
        let source = RgbImage::from_fn(24, 16, |x, y| {
            image::Rgb([(x * 10) as u8, (y * 15) as u8, ((x + y) * 5) as u8])
        });
        for kind in FilterKind::ALL {
            let mut frame = source.clone();
            kind.frame_filter().apply(&mut frame);
            assert_eq!(frame.dimensions(), (24, 16), "{kind}");
        }
    }

    #[test]
    fn filters_are_deterministic() {
        let source = RgbImage::from_fn(32, 32, |x, y| {
            image::Rgb([(x * 7) as u8, (y * 5) as u8, ((x * y) % 256) as u8])
        });
        for kind in FilterKind::ALL {
            let mut a = source.clone();
            let mut b = source.clone();
            kind.frame_filter().apply(&mut a);
            kind.frame_filter().apply(&mut b);
            assert_eq!(a, b, "{kind}");
        }
    }
}
