//! Pure Rust imaging backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` |
//! | Crop | `DynamicImage::crop_imm` |
//! | Thumbnail | `DynamicImage::thumbnail_exact` |
//! | Scale | `resize_exact` with `Triangle` |
//! | Sample | `resize_exact` with `Nearest` |
//! | Filtered resize | `resize_exact` + `blur` / `unsharpen` for the blur factor |
//! | Encode → JPEG | `jpeg-encoder` (baseline or progressive) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | Encode → PNG, TIFF, WebP | `DynamicImage::save_with_format` |
//!
//! The `image` crate has five resampling filters. Each [`Kernel`] maps to the
//! closest one: windowed-sinc kernels go to Lanczos3, smooth cubic and
//! quadratic kernels to Gaussian, interpolating cubics to CatmullRom.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{CropRect, EncodeSettings, Interlace, Kernel, Quality, ResizeParams};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;
use tracing::{debug, warn};

/// Output extensions the backend can encode.
pub const SUPPORTED_OUTPUT_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "tif", "tiff", "webp", "avif"];

/// Quality used when the settings carry none.
const DEFAULT_QUALITY: u32 = 75;

/// Blur factors this close to 1 leave the resampled image alone.
const NEUTRAL_BLUR_EPSILON: f64 = 1e-3;

/// Bytes per pixel of the f32 RGBA scratch image `resize_exact` samples into.
const RESAMPLE_SCRATCH_BYTES_PER_PIXEL: u64 = 16;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Library filter standing in for a resampling kernel.
pub fn filter_for(kernel: Kernel) -> FilterType {
    match kernel {
        Kernel::Point => FilterType::Nearest,
        Kernel::Box | Kernel::Triangle | Kernel::Hermite => FilterType::Triangle,
        Kernel::Gaussian | Kernel::Quadratic | Kernel::Cubic => FilterType::Gaussian,
        Kernel::Catrom | Kernel::Mitchell => FilterType::CatmullRom,
        Kernel::Hanning
        | Kernel::Hamming
        | Kernel::Blackman
        | Kernel::Lanczos
        | Kernel::Bessel
        | Kernel::Sinc
        | Kernel::Undefined => FilterType::Lanczos3,
    }
}

/// Apply the blur factor to a freshly resampled image.
fn apply_blur(img: DynamicImage, blur: f64) -> DynamicImage {
    if (blur - 1.0).abs() < NEUTRAL_BLUR_EPSILON {
        img
    } else if blur > 1.0 {
        img.blur((blur - 1.0) as f32)
    } else {
        img.unsharpen((1.0 - blur) as f32, 0)
    }
}

/// Reject target sizes that are empty or would allocate past the decoder's
/// default memory limit.
fn check_target(image: &DynamicImage, width: u32, height: u32) -> Result<(), BackendError> {
    if width == 0 || height == 0 {
        return Err(BackendError::ProcessingFailed(format!(
            "invalid target size {width}x{height}"
        )));
    }
    let output = u64::from(width)
        .saturating_mul(u64::from(height))
        .saturating_mul(u64::from(image.color().bytes_per_pixel()));
    let scratch = u64::from(image.width())
        .saturating_mul(u64::from(height))
        .saturating_mul(RESAMPLE_SCRATCH_BYTES_PER_PIXEL);
    let needed = output.max(scratch);
    let budget = image::Limits::default().max_alloc.unwrap_or(u64::MAX);
    if needed > budget {
        return Err(BackendError::ProcessingFailed(format!(
            "target size {width}x{height} needs {needed} bytes, over the {budget} byte limit"
        )));
    }
    Ok(())
}

/// The blur sigma may not exceed the larger target dimension.
fn check_blur(blur: f64, width: u32, height: u32) -> Result<(), BackendError> {
    if !blur.is_finite() || blur < 0.0 {
        return Err(BackendError::ProcessingFailed(format!(
            "invalid blur factor {blur}"
        )));
    }
    let max_sigma = f64::from(width.max(height));
    if blur - 1.0 > max_sigma {
        return Err(BackendError::ProcessingFailed(format!(
            "blur factor {blur} too large for a {width}x{height} image"
        )));
    }
    Ok(())
}

fn output_format(path: &Path) -> Result<ImageFormat, BackendError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if !SUPPORTED_OUTPUT_EXTENSIONS.contains(&ext.as_str()) {
        return Err(BackendError::Unsupported(if ext.is_empty() {
            path.display().to_string()
        } else {
            ext
        }));
    }
    ImageFormat::from_extension(&ext).ok_or(BackendError::Unsupported(ext))
}

/// Encode as JPEG, progressive when line interlacing is requested.
fn save_jpeg(
    img: &DynamicImage,
    path: &Path,
    settings: &EncodeSettings,
) -> Result<(), BackendError> {
    let (width, height) = match (u16::try_from(img.width()), u16::try_from(img.height())) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(BackendError::ProcessingFailed(format!(
                "JPEG is limited to 65535x65535, got {}x{}",
                img.width(),
                img.height()
            )));
        }
    };
    let quality = settings
        .quality
        .map(Quality::value)
        .unwrap_or(DEFAULT_QUALITY)
        .clamp(1, 100) as u8;

    let mut encoder = jpeg_encoder::Encoder::new_file(path, quality)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))?;
    encoder.set_progressive(settings.interlace == Interlace::Line);

    let result = if img.color().has_color() {
        let rgb = img.to_rgb8();
        encoder.encode(rgb.as_raw(), width, height, jpeg_encoder::ColorType::Rgb)
    } else {
        let luma = img.to_luma8();
        encoder.encode(luma.as_raw(), width, height, jpeg_encoder::ColorType::Luma)
    };
    result.map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))
}

/// Encode and save as AVIF using rav1e (speed=6 for reasonable throughput).
fn save_avif(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    let encoder = image::codecs::avif::AvifEncoder::new_with_speed_quality(
        writer,
        6,
        quality.clamp(1, 100) as u8,
    );
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("AVIF encode failed: {e}")))
}

impl ImageBackend for RustBackend {
    type Image = DynamicImage;

    fn load(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| BackendError::Decode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    fn dimensions(&self, image: &DynamicImage) -> Dimensions {
        Dimensions {
            width: image.width(),
            height: image.height(),
        }
    }

    fn crop(&self, image: &DynamicImage, rect: CropRect) -> Result<DynamicImage, BackendError> {
        if rect.x >= image.width() || rect.y >= image.height() {
            return Err(BackendError::Crop(format!(
                "geometry {}x{}+{}+{} does not contain the {}x{} image",
                rect.width,
                rect.height,
                rect.x,
                rect.y,
                image.width(),
                image.height()
            )));
        }
        let cropped = image.crop_imm(rect.x, rect.y, rect.width, rect.height);
        debug!(
            width = cropped.width(),
            height = cropped.height(),
            "cropped source"
        );
        Ok(cropped)
    }

    fn thumbnail(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, BackendError> {
        check_target(image, width, height)?;
        Ok(image.thumbnail_exact(width, height))
    }

    fn scale(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, BackendError> {
        check_target(image, width, height)?;
        Ok(image.resize_exact(width, height, FilterType::Triangle))
    }

    fn sample(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, BackendError> {
        check_target(image, width, height)?;
        Ok(image.resize_exact(width, height, FilterType::Nearest))
    }

    fn resize(
        &self,
        image: &DynamicImage,
        params: &ResizeParams,
    ) -> Result<DynamicImage, BackendError> {
        check_target(image, params.width, params.height)?;
        check_blur(params.blur, params.width, params.height)?;
        let filter = filter_for(params.kernel);
        debug!(kernel = ?params.kernel, ?filter, blur = params.blur, "filtered resize");
        let resized = image.resize_exact(params.width, params.height, filter);
        Ok(apply_blur(resized, params.blur))
    }

    fn write(
        &self,
        image: &DynamicImage,
        output: &Path,
        settings: &EncodeSettings,
    ) -> Result<(), BackendError> {
        let format = output_format(output)?;
        let quality = settings
            .quality
            .map(Quality::value)
            .unwrap_or(DEFAULT_QUALITY);

        if settings.interlace == Interlace::Line && format != ImageFormat::Jpeg {
            warn!(
                output = %output.display(),
                ?format,
                "interlacing not supported for this format, writing non-interlaced"
            );
        }

        match format {
            ImageFormat::Jpeg => save_jpeg(image, output, settings),
            ImageFormat::Avif => save_avif(image, output, quality),
            ImageFormat::WebP => DynamicImage::ImageRgba8(image.to_rgba8())
                .save_with_format(output, format)
                .map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {e}"))),
            other => image.save_with_format(output, other).map_err(|e| {
                BackendError::ProcessingFailed(format!("{other:?} encode failed: {e}"))
            }),
        }
    }
}
