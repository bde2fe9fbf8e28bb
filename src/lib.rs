//! # renditions
//!
//! Generate cropped and resized renditions of one source image. Each
//! rendition is described by a compact spec string:
//!
//! ```text
//! renditions photo.jpg \
//!     -f 2592x1728+0+311+300x200+0+0.5+80+1 -o thumbs/small.jpg \
//!     -f 2592x1728+0+311+1200x800+15+1+85+0 -o thumbs/large.jpg
//! ```
//!
//! The source is decoded once. Every `-o` takes the most recent `-f`, crops,
//! resizes and writes a rendition. A bad spec or a failed stage is reported
//! and the next pair still runs.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`spec`] | Spec string decoding and encoding |
//! | [`imaging`] | Backend trait, `image`-crate backend, crop → resize → write sequence |
//! | [`process`] | Source session, `-f`/`-o` pairing, the run loop |
//! | [`plan`] | Jobs planned from a crop-metadata JSON manifest |
//! | [`config`] | Optional TOML defaults for planned renditions |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Library Work Stays in the Library
//!
//! Decoding, resampling and encoding all happen in the `image` crate (and
//! `jpeg-encoder` for progressive JPEG). This crate decides *which* primitive
//! to call with *which* parameters and reports what happened.
//!
//! ## Failures Are Per Rendition
//!
//! Only a missing or undecodable source, a bad flag, or an unreadable config
//! or manifest stops the run. Everything that goes wrong with one rendition
//! is reported with its source, spec and output path, and the run continues.
//!
//! ## Unknown Method Codes Still Resize
//!
//! A method code outside 0–17 resizes with the library's default filter
//! instead of failing the spec. Existing callers depend on that.

pub mod config;
pub mod imaging;
pub mod output;
pub mod plan;
pub mod process;
pub mod spec;
