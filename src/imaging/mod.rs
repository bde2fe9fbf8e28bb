//! Image processing through the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Load** | `image::ImageReader` |
//! | **Crop** | `DynamicImage::crop_imm` |
//! | **Resize** | `thumbnail_exact` / `resize_exact` with a mapped filter |
//! | **Write** | `jpeg-encoder` for JPEG, `image` encoders otherwise |
//!
//! The module is split into:
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: The crop → resize → write sequence for one rendition

pub mod backend;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use operations::{Rendition, RenditionError, generate_rendition, render_spec};
pub use params::{
    CropRect, EncodeSettings, Interlace, Kernel, Quality, ResizeMethod, ResizeParams,
    ResizeStrategy, UnknownMethod,
};
pub use rust_backend::{RustBackend, SUPPORTED_OUTPUT_EXTENSIONS};
