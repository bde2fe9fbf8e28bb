//! Image library backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the whole surface the rendition pipeline
//! needs from an imaging library: load, crop, the three direct resize
//! algorithms, the filtered resize, and write. Every call either returns a
//! new image or fails with a [`BackendError`] whose message is the reason
//! shown to the user.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::params::{CropRect, EncodeSettings, ResizeParams};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("Crop failed: {0}")]
    Crop(String),
    #[error("Unsupported output format: {0}")]
    Unsupported(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Width and height of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for imaging library backends.
///
/// Operations never modify their input; the source image stays untouched
/// for the lifetime of a session while renditions are derived from it.
pub trait ImageBackend {
    /// Decoded image handle.
    type Image;

    /// Decode an image from disk.
    fn load(&self, path: &Path) -> Result<Self::Image, BackendError>;

    fn dimensions(&self, image: &Self::Image) -> Dimensions;

    /// Cut `rect` out of `image`, clipped to the image bounds.
    fn crop(&self, image: &Self::Image, rect: CropRect) -> Result<Self::Image, BackendError>;

    /// Fast resize intended for small previews.
    fn thumbnail(
        &self,
        image: &Self::Image,
        width: u32,
        height: u32,
    ) -> Result<Self::Image, BackendError>;

    /// Smooth area-averaging resize.
    fn scale(
        &self,
        image: &Self::Image,
        width: u32,
        height: u32,
    ) -> Result<Self::Image, BackendError>;

    /// Pixel-sampling resize, no interpolation.
    fn sample(
        &self,
        image: &Self::Image,
        width: u32,
        height: u32,
    ) -> Result<Self::Image, BackendError>;

    /// Resize through a resampling kernel with a blur factor.
    fn resize(
        &self,
        image: &Self::Image,
        params: &ResizeParams,
    ) -> Result<Self::Image, BackendError>;

    /// Encode `image` to `output`, format chosen by extension.
    fn write(
        &self,
        image: &Self::Image,
        output: &Path,
        settings: &EncodeSettings,
    ) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::params::{Interlace, Kernel, Quality};
    use std::sync::Mutex;

    /// Stand-in image: only the geometry is tracked.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct MockImage {
        pub width: u32,
        pub height: u32,
    }

    /// Which stage the mock should fail, if any.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum FailAt {
        Load,
        Crop,
        Resize,
        Write,
    }

    /// Mock backend that records operations without touching pixels.
    #[derive(Default)]
    pub struct MockBackend {
        pub source: Option<Dimensions>,
        pub fail_at: Option<FailAt>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Load(String),
        Crop(CropRect),
        Thumbnail {
            width: u32,
            height: u32,
        },
        Scale {
            width: u32,
            height: u32,
        },
        Sample {
            width: u32,
            height: u32,
        },
        Resize {
            width: u32,
            height: u32,
            kernel: Kernel,
            blur: f64,
        },
        Write {
            output: String,
            width: u32,
            height: u32,
            quality: Option<u32>,
            interlace: Interlace,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::with_source(640, 480)
        }

        pub fn with_source(width: u32, height: u32) -> Self {
            Self {
                source: Some(Dimensions { width, height }),
                ..Self::default()
            }
        }

        pub fn failing_at(mut self, stage: FailAt) -> Self {
            self.fail_at = Some(stage);
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn count(&self, pred: impl Fn(&RecordedOp) -> bool) -> usize {
            self.get_operations().iter().filter(|op| pred(op)).count()
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }

        fn check(&self, stage: FailAt) -> Result<(), BackendError> {
            if self.fail_at == Some(stage) {
                return Err(BackendError::ProcessingFailed(format!(
                    "mock failure at {stage:?}"
                )));
            }
            Ok(())
        }

        fn resized(&self, width: u32, height: u32) -> Result<MockImage, BackendError> {
            self.check(FailAt::Resize)?;
            Ok(MockImage { width, height })
        }
    }

    impl ImageBackend for MockBackend {
        type Image = MockImage;

        fn load(&self, path: &Path) -> Result<MockImage, BackendError> {
            self.record(RecordedOp::Load(path.to_string_lossy().to_string()));
            self.check(FailAt::Load)?;
            let dims = self.source.ok_or_else(|| BackendError::Decode {
                path: path.to_path_buf(),
                reason: "no mock source".to_string(),
            })?;
            Ok(MockImage {
                width: dims.width,
                height: dims.height,
            })
        }

        fn dimensions(&self, image: &MockImage) -> Dimensions {
            Dimensions {
                width: image.width,
                height: image.height,
            }
        }

        fn crop(&self, image: &MockImage, rect: CropRect) -> Result<MockImage, BackendError> {
            self.record(RecordedOp::Crop(rect));
            self.check(FailAt::Crop)?;
            if rect.x >= image.width || rect.y >= image.height {
                return Err(BackendError::Crop(
                    "geometry does not contain image".to_string(),
                ));
            }
            Ok(MockImage {
                width: rect.width.min(image.width - rect.x),
                height: rect.height.min(image.height - rect.y),
            })
        }

        fn thumbnail(
            &self,
            _image: &MockImage,
            width: u32,
            height: u32,
        ) -> Result<MockImage, BackendError> {
            self.record(RecordedOp::Thumbnail { width, height });
            self.resized(width, height)
        }

        fn scale(
            &self,
            _image: &MockImage,
            width: u32,
            height: u32,
        ) -> Result<MockImage, BackendError> {
            self.record(RecordedOp::Scale { width, height });
            self.resized(width, height)
        }

        fn sample(
            &self,
            _image: &MockImage,
            width: u32,
            height: u32,
        ) -> Result<MockImage, BackendError> {
            self.record(RecordedOp::Sample { width, height });
            self.resized(width, height)
        }

        fn resize(
            &self,
            _image: &MockImage,
            params: &ResizeParams,
        ) -> Result<MockImage, BackendError> {
            self.record(RecordedOp::Resize {
                width: params.width,
                height: params.height,
                kernel: params.kernel,
                blur: params.blur,
            });
            self.resized(params.width, params.height)
        }

        fn write(
            &self,
            image: &MockImage,
            output: &Path,
            settings: &EncodeSettings,
        ) -> Result<(), BackendError> {
            self.record(RecordedOp::Write {
                output: output.to_string_lossy().to_string(),
                width: image.width,
                height: image.height,
                quality: settings.quality.map(Quality::value),
                interlace: settings.interlace,
            });
            self.check(FailAt::Write)
        }
    }

    #[test]
    fn mock_records_load() {
        let backend = MockBackend::with_source(800, 600);

        let image = backend.load(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(image.width, 800);
        assert_eq!(image.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Load(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_crop_clips_to_bounds() {
        let backend = MockBackend::with_source(2592, 1728);
        let source = backend.load(Path::new("/photo.jpg")).unwrap();

        let cropped = backend
            .crop(
                &source,
                CropRect {
                    x: 0,
                    y: 311,
                    width: 2592,
                    height: 1728,
                },
            )
            .unwrap();
        assert_eq!(cropped, MockImage { width: 2592, height: 1417 });
    }

    #[test]
    fn mock_crop_outside_image_errors() {
        let backend = MockBackend::with_source(100, 100);
        let source = backend.load(Path::new("/photo.jpg")).unwrap();

        let result = backend.crop(
            &source,
            CropRect {
                x: 100,
                y: 0,
                width: 10,
                height: 10,
            },
        );
        assert!(matches!(result, Err(BackendError::Crop(_))));
    }

    #[test]
    fn mock_fails_at_requested_stage() {
        let backend = MockBackend::new().failing_at(FailAt::Write);
        let image = backend.load(Path::new("/a.jpg")).unwrap();

        let result = backend.write(&image, Path::new("/out.jpg"), &EncodeSettings::default());
        assert!(result.is_err());
        assert_eq!(backend.count(|op| matches!(op, RecordedOp::Write { .. })), 1);
    }
}
