//! High-level image operations.
//!
//! [`generate_rendition`] decodes a spec string and runs the rendition
//! stages against a backend:
//!
//! ```text
//! spec ─► decode ─► crop? ─► resize ─► encode settings ─► write
//! ```
//!
//! Each stage fails independently with its own [`RenditionError`] variant.
//! Nothing reaches the backend until the spec has decoded.

use super::backend::{BackendError, ImageBackend};
use super::params::{EncodeSettings, ResizeMethod, ResizeParams, ResizeStrategy};
use crate::spec::{RenditionSpec, SpecError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum RenditionError {
    #[error("invalid spec: {0}")]
    Spec(#[from] SpecError),
    #[error("crop failed: {0}")]
    Crop(#[source] BackendError),
    #[error("resize failed: {0}")]
    Resize(#[source] BackendError),
    #[error("write failed: {source}")]
    Write {
        /// Progressive output was being written.
        progressive: bool,
        #[source]
        source: BackendError,
    },
}

impl RenditionError {
    /// True when a progressive write was attempted and failed.
    pub fn failed_progressive_write(&self) -> bool {
        matches!(
            self,
            Self::Write {
                progressive: true,
                ..
            }
        )
    }
}

/// A rendition that made it to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendition {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub method: ResizeMethod,
    pub progressive: bool,
}

/// Resize `image` with the primitive selected by the spec's method.
pub fn resize_for<B: ImageBackend>(
    backend: &B,
    image: &B::Image,
    spec: &RenditionSpec,
) -> Result<B::Image, BackendError> {
    let (width, height) = (spec.width, spec.height);
    match spec.method.strategy() {
        ResizeStrategy::Thumbnail => backend.thumbnail(image, width, height),
        ResizeStrategy::Scale => backend.scale(image, width, height),
        ResizeStrategy::Sample => backend.sample(image, width, height),
        ResizeStrategy::Filtered(kernel) => backend.resize(
            image,
            &ResizeParams {
                width,
                height,
                kernel,
                blur: spec.blur,
            },
        ),
    }
}

/// Derive one rendition of `source` from an already decoded spec.
pub fn render_spec<B: ImageBackend>(
    backend: &B,
    source: &B::Image,
    template: &EncodeSettings,
    spec: &RenditionSpec,
    output: &Path,
) -> Result<Rendition, RenditionError> {
    let cropped;
    let base = match spec.crop_region() {
        Some(rect) => {
            debug!(?rect, "cropping");
            cropped = backend.crop(source, rect).map_err(RenditionError::Crop)?;
            &cropped
        }
        None => source,
    };

    debug!(method = %spec.method, width = spec.width, height = spec.height, "resizing");
    let resized = resize_for(backend, base, spec).map_err(RenditionError::Resize)?;

    let settings = template.for_rendition(spec.quality, spec.progressive);
    backend
        .write(&resized, output, &settings)
        .map_err(|source| RenditionError::Write {
            progressive: spec.progressive,
            source,
        })?;

    let dims = backend.dimensions(&resized);
    Ok(Rendition {
        output: output.to_path_buf(),
        width: dims.width,
        height: dims.height,
        method: spec.method,
        progressive: spec.progressive,
    })
}

/// Decode `spec` and write the rendition it describes to `output`.
pub fn generate_rendition<B: ImageBackend>(
    backend: &B,
    source: &B::Image,
    template: &EncodeSettings,
    spec: &str,
    output: &Path,
) -> Result<Rendition, RenditionError> {
    let spec: RenditionSpec = spec.parse()?;
    render_spec(backend, source, template, &spec, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{FailAt, MockBackend, MockImage, RecordedOp};
    use crate::imaging::params::{CropRect, Interlace, Kernel};

    fn render(backend: &MockBackend, spec: &str) -> Result<Rendition, RenditionError> {
        let source = backend.load(Path::new("/photo.jpg")).unwrap();
        generate_rendition(
            backend,
            &source,
            &EncodeSettings::default(),
            spec,
            Path::new("/out/rendition.jpg"),
        )
    }

    /// Operations after the initial source load.
    fn stages(backend: &MockBackend) -> Vec<RecordedOp> {
        backend.get_operations().into_iter().skip(1).collect()
    }

    #[test]
    fn thumbnail_with_crop_and_progressive() {
        let backend = MockBackend::with_source(2592, 1728);

        let rendition = render(&backend, "2592x1728+0+311+300x200+0+0.5+80+1").unwrap();

        assert_eq!(
            stages(&backend),
            vec![
                RecordedOp::Crop(CropRect {
                    x: 0,
                    y: 311,
                    width: 2592,
                    height: 1728
                }),
                RecordedOp::Thumbnail {
                    width: 300,
                    height: 200
                },
                RecordedOp::Write {
                    output: "/out/rendition.jpg".to_string(),
                    width: 300,
                    height: 200,
                    quality: Some(80),
                    interlace: Interlace::Line,
                },
            ]
        );
        assert_eq!((rendition.width, rendition.height), (300, 200));
        assert!(rendition.progressive);
    }

    #[test]
    fn zero_crop_skips_cropping() {
        let backend = MockBackend::new();

        render(&backend, "0x480+0+0+320x240+1+1+70+0").unwrap();

        assert_eq!(backend.count(|op| matches!(op, RecordedOp::Crop(_))), 0);
        assert_eq!(
            stages(&backend)[0],
            RecordedOp::Scale {
                width: 320,
                height: 240
            }
        );
    }

    #[test]
    fn zero_target_never_touches_the_backend() {
        let backend = MockBackend::new();

        let result = render(&backend, "100x100+10+10+50x0+0+1+70+0");

        assert!(matches!(
            result,
            Err(RenditionError::Spec(SpecError::ZeroTarget { .. }))
        ));
        assert!(stages(&backend).is_empty());
    }

    #[test]
    fn empty_spec_is_a_decode_failure() {
        let backend = MockBackend::new();
        let result = render(&backend, "");
        assert!(matches!(result, Err(RenditionError::Spec(SpecError::Empty))));
        assert!(stages(&backend).is_empty());
    }

    #[test]
    fn sample_method_dispatch() {
        let backend = MockBackend::new();
        render(&backend, "0x0+0+0+64x64+2+1+90+0").unwrap();
        assert_eq!(
            stages(&backend)[0],
            RecordedOp::Sample {
                width: 64,
                height: 64
            }
        );
    }

    #[test]
    fn filtered_resize_passes_kernel_and_blur() {
        let backend = MockBackend::new();
        render(&backend, "0x0+0+0+160x120+15+0.9+85+0").unwrap();
        assert_eq!(
            stages(&backend)[0],
            RecordedOp::Resize {
                width: 160,
                height: 120,
                kernel: Kernel::Lanczos,
                blur: 0.9
            }
        );
    }

    #[test]
    fn out_of_range_method_uses_undefined_kernel() {
        let backend = MockBackend::new();
        render(&backend, "0x0+0+0+160x120+250+1+85+0").unwrap();
        assert!(matches!(
            stages(&backend)[0],
            RecordedOp::Resize {
                kernel: Kernel::Undefined,
                ..
            }
        ));
    }

    #[test]
    fn non_progressive_leaves_interlace_untouched() {
        let backend = MockBackend::new();
        let source = backend.load(Path::new("/photo.jpg")).unwrap();
        let template = EncodeSettings {
            quality: None,
            interlace: Interlace::Undefined,
        };

        generate_rendition(
            &backend,
            &source,
            &template,
            "0x0+0+0+10x10+0+1+60+0",
            Path::new("/out.jpg"),
        )
        .unwrap();

        assert!(matches!(
            stages(&backend).last(),
            Some(RecordedOp::Write {
                interlace: Interlace::Undefined,
                quality: Some(60),
                ..
            })
        ));
    }

    #[test]
    fn crop_failure_stops_before_resize() {
        let backend = MockBackend::new().failing_at(FailAt::Crop);
        let result = render(&backend, "10x10+0+0+5x5+0+1+80+0");
        assert!(matches!(result, Err(RenditionError::Crop(_))));
        assert_eq!(stages(&backend).len(), 1);
    }

    #[test]
    fn resize_failure_stops_before_write() {
        let backend = MockBackend::new().failing_at(FailAt::Resize);
        let result = render(&backend, "0x0+0+0+5x5+0+1+80+0");
        assert!(matches!(result, Err(RenditionError::Resize(_))));
        assert_eq!(backend.count(|op| matches!(op, RecordedOp::Write { .. })), 0);
    }

    #[test]
    fn write_failure_is_reported() {
        let backend = MockBackend::new().failing_at(FailAt::Write);
        let result = render(&backend, "0x0+0+0+5x5+0+1+80+0");
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            RenditionError::Write {
                progressive: false,
                ..
            }
        ));
        assert!(err.to_string().starts_with("write failed: "));
        assert!(!err.failed_progressive_write());
    }

    #[test]
    fn failed_progressive_write_is_flagged() {
        let backend = MockBackend::new().failing_at(FailAt::Write);
        let err = render(&backend, "0x0+0+0+5x5+0+1+80+1").unwrap_err();
        assert!(err.failed_progressive_write());
    }

    #[test]
    fn earlier_stage_failures_are_not_write_failures() {
        let backend = MockBackend::new().failing_at(FailAt::Resize);
        let err = render(&backend, "0x0+0+0+5x5+0+1+80+1").unwrap_err();
        assert!(!err.failed_progressive_write());
    }

    #[test]
    fn source_is_left_untouched() {
        let backend = MockBackend::with_source(400, 300);
        let source = backend.load(Path::new("/photo.jpg")).unwrap();
        let template = EncodeSettings::default();

        for spec in ["200x150+0+0+100x75+0+1+80+1", "0x0+0+0+40x30+15+1+70+0"] {
            generate_rendition(&backend, &source, &template, spec, Path::new("/o.jpg")).unwrap();
        }

        assert_eq!(
            source,
            MockImage {
                width: 400,
                height: 300
            }
        );
        assert_eq!(template, EncodeSettings::default());
    }
}
