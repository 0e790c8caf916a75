//! WebP encoder capability and shared types.
//!
//! The [`WebpEncoder`] trait is the one capability every conversion engine
//! provides: decode the source, set WebP as the output format with the given
//! quality, and write the result to a path.
//!
//! Two implementations exist:
//! - [`LibwebpBackend`](super::libwebp_backend::LibwebpBackend): primary,
//!   lossy libwebp. Only available when built with the `libwebp` feature.
//! - [`RustBackend`](super::rust_backend::RustBackend): secondary, pure Rust,
//!   always available.
//!
//! [`convert`](super::operations::convert) tries them in that order.

use super::params::EncodeParams;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Engine unavailable: {0}")]
    Unavailable(&'static str),
}

impl From<image::ImageError> for BackendError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::IoError(io) => BackendError::Io(io),
            image::ImageError::Encoding(_) | image::ImageError::Parameter(_) => {
                BackendError::Encode(e.to_string())
            }
            other => BackendError::Decode(other.to_string()),
        }
    }
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// A WebP conversion engine.
///
/// Implementations write to `params.output` and may leave a partial file
/// there on failure; the caller owns cleanup of that path.
pub trait WebpEncoder: Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Whether the engine can run in this build.
    fn is_available(&self) -> bool {
        true
    }

    /// Decode `params.source` and write it as WebP to `params.output`.
    fn encode(&self, params: &EncodeParams) -> Result<(), BackendError>;
}

/// Write `bytes` to `path`, creating or truncating it.
pub(crate) fn write_output(path: &Path, bytes: &[u8]) -> Result<(), BackendError> {
    std::fs::write(path, bytes).map_err(|e| {
        BackendError::Encode(format!("Failed to write {}: {}", path.display(), e))
    })
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::params::Quality;
    use crate::imaging::probe::SourceFormat;
    use std::sync::Mutex;

    /// Mock encoder that records calls and either writes fixed bytes or fails.
    /// Uses Mutex (not RefCell) so it is Sync and can be shared across threads.
    pub struct MockEncoder {
        pub name: &'static str,
        pub available: bool,
        /// Bytes written before failing (simulates a partially-written file).
        pub partial: Option<Vec<u8>>,
        pub fail_with: Option<fn(String) -> BackendError>,
        pub calls: Mutex<Vec<RecordedEncode>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedEncode {
        pub source: String,
        pub format: SourceFormat,
        pub quality: u8,
    }

    impl MockEncoder {
        /// Writes a fixed payload and succeeds.
        pub fn succeeding(name: &'static str) -> Self {
            Self {
                name,
                available: true,
                partial: None,
                fail_with: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Writes `partial` bytes (if any) then returns an encode error.
        pub fn failing(name: &'static str, partial: Option<&[u8]>) -> Self {
            Self {
                fail_with: Some(BackendError::Encode),
                partial: partial.map(|p| p.to_vec()),
                ..Self::succeeding(name)
            }
        }

        pub fn failing_decode(name: &'static str) -> Self {
            Self {
                fail_with: Some(BackendError::Decode),
                ..Self::succeeding(name)
            }
        }

        pub fn unavailable(name: &'static str) -> Self {
            Self {
                available: false,
                ..Self::succeeding(name)
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn get_calls(&self) -> Vec<RecordedEncode> {
            self.calls.lock().unwrap().clone()
        }
    }

    pub const MOCK_PAYLOAD: &[u8] = b"RIFF\x04\x00\x00\x00WEBP";

    impl WebpEncoder for MockEncoder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn encode(&self, params: &EncodeParams) -> Result<(), BackendError> {
            self.calls.lock().unwrap().push(RecordedEncode {
                source: params.source.to_string_lossy().to_string(),
                format: params.format,
                quality: params.quality.value(),
            });
            if let Some(partial) = &self.partial {
                std::fs::write(&params.output, partial)?;
            }
            match self.fail_with {
                Some(make_err) => Err(make_err(format!("{} simulated failure", self.name))),
                None => write_output(&params.output, MOCK_PAYLOAD),
            }
        }
    }

    #[test]
    fn mock_records_encode() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("out.webp");
        let encoder = MockEncoder::succeeding("mock");

        encoder
            .encode(&EncodeParams {
                source: "/source.png".into(),
                format: SourceFormat::Png,
                output: output.clone(),
                quality: Quality::new(70),
            })
            .unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), MOCK_PAYLOAD);
        let calls = encoder.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].format, SourceFormat::Png);
        assert_eq!(calls[0].quality, 70);
    }

    #[test]
    fn failing_mock_leaves_partial_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("out.webp");
        let encoder = MockEncoder::failing("mock", Some(b"RIFF"));

        let result = encoder.encode(&EncodeParams {
            source: "/source.jpg".into(),
            format: SourceFormat::Jpeg,
            output: output.clone(),
            quality: Quality::default(),
        });

        assert!(matches!(result, Err(BackendError::Encode(_))));
        assert_eq!(std::fs::read(&output).unwrap(), b"RIFF");
    }

    #[test]
    fn image_io_errors_map_to_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: BackendError = image::ImageError::IoError(io).into();
        assert!(matches!(err, BackendError::Io(_)));
    }
}
