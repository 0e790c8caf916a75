//! libwebp engine: the primary, lossy WebP encoder.
//!
//! Built only with the `libwebp` cargo feature (on by default). Without it,
//! [`LibwebpBackend::is_available`] is `false` and every conversion goes
//! straight to [`RustBackend`](super::rust_backend::RustBackend).
//!
//! Sources are decoded with the `image` reader, format chosen by content. PNG sources are
//! handed to libwebp as RGBA so the alpha channel is encoded instead of being
//! flattened onto a matte; JPEG sources go in as RGB.

use super::backend::{BackendError, WebpEncoder};
use super::params::EncodeParams;

pub struct LibwebpBackend;

impl LibwebpBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LibwebpBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "libwebp")]
impl WebpEncoder for LibwebpBackend {
    fn name(&self) -> &'static str {
        "libwebp"
    }

    fn encode(&self, params: &EncodeParams) -> Result<(), BackendError> {
        use super::probe::{SourceFormat, open_by_content};

        let img = open_by_content(&params.source)?
            .decode()
            .map_err(|e| {
                BackendError::Decode(format!(
                    "Failed to decode {}: {}",
                    params.source.display(),
                    e
                ))
            })?;

        let quality = params.quality.as_factor();
        let encoded = match params.format {
            SourceFormat::Png => {
                let rgba = img.to_rgba8();
                let (width, height) = rgba.dimensions();
                webp::Encoder::from_rgba(rgba.as_raw(), width, height)
                    .encode_simple(false, quality)
            }
            _ => {
                let rgb = img.to_rgb8();
                let (width, height) = rgb.dimensions();
                webp::Encoder::from_rgb(rgb.as_raw(), width, height).encode_simple(false, quality)
            }
        }
        .map_err(|e| BackendError::Encode(format!("libwebp encode failed: {:?}", e)))?;

        super::backend::write_output(&params.output, &encoded)
    }
}

#[cfg(not(feature = "libwebp"))]
impl WebpEncoder for LibwebpBackend {
    fn name(&self) -> &'static str {
        "libwebp"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn encode(&self, _params: &EncodeParams) -> Result<(), BackendError> {
        Err(BackendError::Unavailable("built without the libwebp feature"))
    }
}
