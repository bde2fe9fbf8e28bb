//! Rendition spec strings.
//!
//! A spec packs everything needed for one rendition into a single argument:
//!
//! ```text
//! <crop_w>x<crop_h>+<crop_x>+<crop_y>+<w>x<h>+<method>+<blur>+<quality>+<progressive>
//!
//! 2592x1728+0+311+300x200+0+0.5+80+1
//! └─crop──┘ └─origin┘ └target┘ │  │  │  └ progressive (0|1)
//!                              │  │  └ quality (0-100)
//!                              │  └ blur factor
//!                              └ resize method code
//! ```
//!
//! A crop box with zero width or height means "no crop". The target size must
//! be positive in both directions. Parsing is all-or-nothing: any malformed
//! field rejects the whole spec with a [`SpecError`] naming the field.
//!
//! [`RenditionSpec`] implements `Display` with the same layout, so a parsed
//! spec re-encodes to its canonical string. Canonical means no leading zeros
//! and the shortest decimal for the blur factor: `007` encodes as `7` and
//! `1.0` as `1`.

use crate::imaging::{CropRect, Quality, ResizeMethod};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpecError {
    #[error("empty rendition spec")]
    Empty,
    #[error("expected 8 '+'-separated fields, found {0}")]
    FieldCount(usize),
    #[error("{field} must be WIDTHxHEIGHT, got '{value}'")]
    MalformedSize { field: &'static str, value: String },
    #[error("{field} is not an unsigned integer: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("blur must be a finite non-negative number, got '{0}'")]
    InvalidBlur(String),
    #[error("quality must be 0-100, got {0}")]
    QualityOutOfRange(u32),
    #[error("progressive must be 0 or 1, got '{0}'")]
    InvalidProgressive(String),
    #[error("target size must be positive, got {width}x{height}")]
    ZeroTarget { width: u32, height: u32 },
}

/// Everything needed to derive one rendition from the source image.
#[derive(Debug, Clone, PartialEq)]
pub struct RenditionSpec {
    pub crop: CropRect,
    pub width: u32,
    pub height: u32,
    pub method: ResizeMethod,
    pub blur: f64,
    pub quality: Quality,
    pub progressive: bool,
}

impl RenditionSpec {
    /// The crop box to apply, or `None` to resize the full source.
    pub fn crop_region(&self) -> Option<CropRect> {
        (!self.crop.is_degenerate()).then_some(self.crop)
    }
}

fn parse_u32(field: &'static str, token: &str) -> Result<u32, SpecError> {
    let invalid = || SpecError::InvalidNumber {
        field,
        value: token.to_string(),
    };
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    token.parse().map_err(|_| invalid())
}

fn parse_size(field: &'static str, token: &str) -> Result<(u32, u32), SpecError> {
    let (w, h) = token
        .split_once('x')
        .filter(|(_, h)| !h.contains('x'))
        .ok_or_else(|| SpecError::MalformedSize {
            field,
            value: token.to_string(),
        })?;
    Ok((parse_u32(field, w)?, parse_u32(field, h)?))
}

fn parse_blur(token: &str) -> Result<f64, SpecError> {
    token
        .parse::<f64>()
        .ok()
        .filter(|b| b.is_finite() && *b >= 0.0)
        .ok_or_else(|| SpecError::InvalidBlur(token.to_string()))
}

fn parse_progressive(token: &str) -> Result<bool, SpecError> {
    match token {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(SpecError::InvalidProgressive(other.to_string())),
    }
}

impl FromStr for RenditionSpec {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(SpecError::Empty);
        }
        let tokens: Vec<&str> = s.split('+').collect();
        let [crop_size, crop_x, crop_y, target, method, blur, quality, progressive] =
            tokens.as_slice()
        else {
            return Err(SpecError::FieldCount(tokens.len()));
        };

        let (crop_width, crop_height) = parse_size("crop size", crop_size)?;
        let crop = CropRect {
            x: parse_u32("crop x", crop_x)?,
            y: parse_u32("crop y", crop_y)?,
            width: crop_width,
            height: crop_height,
        };
        let (width, height) = parse_size("target size", target)?;
        let method = ResizeMethod::from_code(parse_u32("method", method)?);
        let blur = parse_blur(blur)?;
        let quality = parse_u32("quality", quality)?;
        if quality > 100 {
            return Err(SpecError::QualityOutOfRange(quality));
        }
        let progressive = parse_progressive(progressive)?;

        if width == 0 || height == 0 {
            return Err(SpecError::ZeroTarget { width, height });
        }

        Ok(RenditionSpec {
            crop,
            width,
            height,
            method,
            blur,
            quality: Quality::new(quality),
            progressive,
        })
    }
}

impl fmt::Display for RenditionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}+{}+{}+{}x{}+{}+{}+{}+{}",
            self.crop.width,
            self.crop.height,
            self.crop.x,
            self.crop.y,
            self.width,
            self.height,
            self.method.code(),
            self.blur,
            self.quality.value(),
            u8::from(self.progressive),
        )
    }
}
