//! Parameter types for image operations.
//!
//! These types describe *what* to do, not *how* to do it. They are the
//! interface between the [`spec`](crate::spec) decoder, the
//! [`operations`](super::operations) module (which sequences crop, resize and
//! write) and the [`backend`](super::backend) (which does the pixel work).
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality (0–100). Clamped on construction.
//! - [`CropRect`] — Crop box; a zero width or height means "no crop".
//! - [`ResizeMethod`] — The numeric method selector carried by a spec string.
//! - [`Kernel`] — Resampling kernel handed to the filtered-resize primitive.
//! - [`ResizeStrategy`] — Which backend primitive a method dispatches to.
//! - [`ResizeParams`] — Target size, kernel and blur for a filtered resize.
//! - [`EncodeSettings`] / [`Interlace`] — Per-write encoder knobs.

use std::fmt;
use std::str::FromStr;

/// Quality setting for lossy image encoding (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.min(100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Crop box in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// A box with no area selects the whole source image.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Resize method selector, as encoded in the `method` field of a spec string.
///
/// Codes 0–2 are the direct algorithms; 3–17 name a resampling kernel for
/// the filtered resize. Any other code is kept verbatim as
/// [`Unrecognized`](ResizeMethod::Unrecognized) so the spec re-encodes
/// byte-for-byte, and it resizes with [`Kernel::Undefined`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeMethod {
    Thumbnail,
    Scale,
    Sample,
    Point,
    Box,
    Triangle,
    Hermite,
    Hanning,
    Hamming,
    Blackman,
    Gaussian,
    Quadratic,
    Cubic,
    Catrom,
    Mitchell,
    Lanczos,
    Bessel,
    Sinc,
    Unrecognized(u32),
}

impl ResizeMethod {
    /// Every named method, in code order.
    pub const ALL: [ResizeMethod; 18] = [
        ResizeMethod::Thumbnail,
        ResizeMethod::Scale,
        ResizeMethod::Sample,
        ResizeMethod::Point,
        ResizeMethod::Box,
        ResizeMethod::Triangle,
        ResizeMethod::Hermite,
        ResizeMethod::Hanning,
        ResizeMethod::Hamming,
        ResizeMethod::Blackman,
        ResizeMethod::Gaussian,
        ResizeMethod::Quadratic,
        ResizeMethod::Cubic,
        ResizeMethod::Catrom,
        ResizeMethod::Mitchell,
        ResizeMethod::Lanczos,
        ResizeMethod::Bessel,
        ResizeMethod::Sinc,
    ];

    pub fn from_code(code: u32) -> Self {
        Self::ALL
            .get(code as usize)
            .copied()
            .unwrap_or(ResizeMethod::Unrecognized(code))
    }

    pub fn code(self) -> u32 {
        match self {
            ResizeMethod::Unrecognized(code) => code,
            named => Self::ALL
                .iter()
                .position(|m| *m == named)
                .map(|i| i as u32)
                .unwrap_or_default(),
        }
    }

    /// Lowercase display name; `None` for unrecognized codes.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            ResizeMethod::Thumbnail => "thumbnail",
            ResizeMethod::Scale => "scale",
            ResizeMethod::Sample => "sample",
            ResizeMethod::Point => "point",
            ResizeMethod::Box => "box",
            ResizeMethod::Triangle => "triangle",
            ResizeMethod::Hermite => "hermite",
            ResizeMethod::Hanning => "hanning",
            ResizeMethod::Hamming => "hamming",
            ResizeMethod::Blackman => "blackman",
            ResizeMethod::Gaussian => "gaussian",
            ResizeMethod::Quadratic => "quadratic",
            ResizeMethod::Cubic => "cubic",
            ResizeMethod::Catrom => "catrom",
            ResizeMethod::Mitchell => "mitchell",
            ResizeMethod::Lanczos => "lanczos",
            ResizeMethod::Bessel => "bessel",
            ResizeMethod::Sinc => "sinc",
            ResizeMethod::Unrecognized(_) => return None,
        };
        Some(name)
    }

    /// Resampling kernel for this method.
    ///
    /// Total over every value. The direct methods have no kernel and map to
    /// [`Kernel::Undefined`], as do unrecognized codes.
    pub fn kernel(self) -> Kernel {
        match self {
            ResizeMethod::Point => Kernel::Point,
            ResizeMethod::Box => Kernel::Box,
            ResizeMethod::Triangle => Kernel::Triangle,
            ResizeMethod::Hermite => Kernel::Hermite,
            ResizeMethod::Hanning => Kernel::Hanning,
            ResizeMethod::Hamming => Kernel::Hamming,
            ResizeMethod::Blackman => Kernel::Blackman,
            ResizeMethod::Gaussian => Kernel::Gaussian,
            ResizeMethod::Quadratic => Kernel::Quadratic,
            ResizeMethod::Cubic => Kernel::Cubic,
            ResizeMethod::Catrom => Kernel::Catrom,
            ResizeMethod::Mitchell => Kernel::Mitchell,
            ResizeMethod::Lanczos => Kernel::Lanczos,
            ResizeMethod::Bessel => Kernel::Bessel,
            ResizeMethod::Sinc => Kernel::Sinc,
            ResizeMethod::Thumbnail
            | ResizeMethod::Scale
            | ResizeMethod::Sample
            | ResizeMethod::Unrecognized(_) => Kernel::Undefined,
        }
    }

    /// Backend primitive this method dispatches to.
    ///
    /// Unrecognized codes still resize: they take the filtered path with an
    /// undefined kernel and let the backend choose its default filter. Callers
    /// have relied on that, so it is not reported as an error.
    pub fn strategy(self) -> ResizeStrategy {
        match self {
            ResizeMethod::Thumbnail => ResizeStrategy::Thumbnail,
            ResizeMethod::Scale => ResizeStrategy::Scale,
            ResizeMethod::Sample => ResizeStrategy::Sample,
            filtered => ResizeStrategy::Filtered(filtered.kernel()),
        }
    }
}

impl fmt::Display for ResizeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "unrecognized({})", self.code()),
        }
    }
}

/// Error for a method name or code that cannot be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resize method '{0}'")]
pub struct UnknownMethod(pub String);

impl FromStr for ResizeMethod {
    type Err = UnknownMethod;

    /// Accepts a method name (any case) or a numeric code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<u32>() {
            return Ok(Self::from_code(code));
        }
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.name().is_some_and(|n| n.eq_ignore_ascii_case(trimmed)))
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

/// Resampling kernel for the filtered resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
    Undefined,
    Point,
    Box,
    Triangle,
    Hermite,
    Hanning,
    Hamming,
    Blackman,
    Gaussian,
    Quadratic,
    Cubic,
    Catrom,
    Mitchell,
    Lanczos,
    Bessel,
    Sinc,
}

/// The resize primitive a [`ResizeMethod`] selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeStrategy {
    Thumbnail,
    Scale,
    Sample,
    Filtered(Kernel),
}

/// Parameters for a filtered (kernel-based) resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
    pub kernel: Kernel,
    /// Blur factor: above 1 softens, below 1 sharpens.
    pub blur: f64,
}

/// Interlacing requested from the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interlace {
    /// Whatever the encoder does by default (baseline for JPEG).
    #[default]
    Undefined,
    /// Line interlacing: progressive JPEG.
    Line,
}

/// Encoder settings for one write.
///
/// A session holds a template; each rendition clones it and overrides
/// quality and, when progressive output is requested, interlace.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EncodeSettings {
    pub quality: Option<Quality>,
    pub interlace: Interlace,
}

impl EncodeSettings {
    /// Clone of `self` specialised for one rendition.
    pub fn for_rendition(&self, quality: Quality, progressive: bool) -> Self {
        let mut settings = self.clone();
        settings.quality = Some(quality);
        if progressive {
            settings.interlace = Interlace::Line;
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 0);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn degenerate_crop_boxes() {
        assert!(CropRect::default().is_degenerate());
        assert!(
            CropRect {
                x: 5,
                y: 5,
                width: 100,
                height: 0
            }
            .is_degenerate()
        );
        assert!(
            !CropRect {
                x: 0,
                y: 0,
                width: 1,
                height: 1
            }
            .is_degenerate()
        );
    }

    #[test]
    fn method_codes_are_stable() {
        assert_eq!(ResizeMethod::from_code(0), ResizeMethod::Thumbnail);
        assert_eq!(ResizeMethod::from_code(2), ResizeMethod::Sample);
        assert_eq!(ResizeMethod::from_code(15), ResizeMethod::Lanczos);
        assert_eq!(ResizeMethod::from_code(17), ResizeMethod::Sinc);
        assert_eq!(ResizeMethod::from_code(18), ResizeMethod::Unrecognized(18));
        for (i, m) in ResizeMethod::ALL.iter().enumerate() {
            assert_eq!(m.code(), i as u32);
        }
        assert_eq!(ResizeMethod::Unrecognized(99).code(), 99);
    }

    #[test]
    fn direct_methods_have_no_kernel() {
        assert_eq!(ResizeMethod::Thumbnail.kernel(), Kernel::Undefined);
        assert_eq!(ResizeMethod::Scale.kernel(), Kernel::Undefined);
        assert_eq!(ResizeMethod::Sample.kernel(), Kernel::Undefined);
    }

    #[test]
    fn strategy_dispatch() {
        assert_eq!(ResizeMethod::Thumbnail.strategy(), ResizeStrategy::Thumbnail);
        assert_eq!(ResizeMethod::Scale.strategy(), ResizeStrategy::Scale);
        assert_eq!(ResizeMethod::Sample.strategy(), ResizeStrategy::Sample);
        assert_eq!(
            ResizeMethod::Mitchell.strategy(),
            ResizeStrategy::Filtered(Kernel::Mitchell)
        );
        assert_eq!(
            ResizeMethod::Point.strategy(),
            ResizeStrategy::Filtered(Kernel::Point)
        );
    }

    #[test]
    fn unrecognized_method_falls_back_to_undefined_filter() {
        assert_eq!(
            ResizeMethod::from_code(42).strategy(),
            ResizeStrategy::Filtered(Kernel::Undefined)
        );
    }

    #[test]
    fn parse_method_by_name_or_code() {
        assert_eq!("lanczos".parse::<ResizeMethod>(), Ok(ResizeMethod::Lanczos));
        assert_eq!("Catrom".parse::<ResizeMethod>(), Ok(ResizeMethod::Catrom));
        assert_eq!("1".parse::<ResizeMethod>(), Ok(ResizeMethod::Scale));
        assert_eq!(
            "300".parse::<ResizeMethod>(),
            Ok(ResizeMethod::Unrecognized(300))
        );
        assert!("bicubic".parse::<ResizeMethod>().is_err());
    }

    #[test]
    fn display_names() {
        assert_eq!(ResizeMethod::Hermite.to_string(), "hermite");
        assert_eq!(ResizeMethod::Unrecognized(23).to_string(), "unrecognized(23)");
    }

    #[test]
    fn progressive_switches_to_line_interlace() {
        let template = EncodeSettings::default();
        let settings = template.for_rendition(Quality::new(80), true);
        assert_eq!(settings.interlace, Interlace::Line);
        assert_eq!(settings.quality, Some(Quality(80)));
    }

    #[test]
    fn non_progressive_keeps_template_interlace() {
        let template = EncodeSettings::default();
        let settings = template.for_rendition(Quality::new(70), false);
        assert_eq!(settings.interlace, Interlace::Undefined);
        assert_eq!(settings.quality, Some(Quality(70)));
        assert_eq!(template.quality, None);
    }
}
