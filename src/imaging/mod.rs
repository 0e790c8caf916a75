//! Image processing: resize in place, transcode to WebP.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Probe** | `image::ImageReader::with_guessed_format` (magic bytes) |
//! | **Resize** | `resize_exact` with `Triangle`, re-encoded as JPEG/PNG |
//! | **Convert (primary)** | libwebp via the `webp` crate, lossy |
//! | **Convert (secondary)** | `image::codecs::webp::WebPEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Quality/compression types and encode parameters
//! - **Probe**: Content-based format detection
//! - **Backend**: [`WebpEncoder`] trait + [`LibwebpBackend`] and [`RustBackend`]
//! - **Operations**: [`resize`] and [`convert`], combining all of the above

pub mod backend;
mod calculations;
pub mod libwebp_backend;
pub mod operations;
mod params;
pub mod probe;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, WebpEncoder};
pub use calculations::{calculate_fit_dimensions, fits_within};
pub use libwebp_backend::LibwebpBackend;
pub use operations::{
    ConvertError, ConvertOutcome, FailureStage, ResizeError, ResizeOutcome, SkipReason, convert,
    convert_with_engines, resize, webp_output_path,
};
pub use params::{EncodeParams, PngCompression, Quality};
pub use probe::{ProbedImage, SourceFormat, probe, probe_format};
pub use rust_backend::RustBackend;
