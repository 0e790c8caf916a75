//! Content probing: format and dimensions from file bytes.
//!
//! The file extension is never consulted. A text file named `photo.jpg` is
//! [`SourceFormat::Unsupported`], and a PNG saved as `photo.jpg` is a PNG.

use super::backend::{BackendError, Dimensions};
use image::{ImageFormat, ImageReader};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Source formats the pipeline knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Jpeg,
    Png,
    Unsupported,
}

impl SourceFormat {
    pub fn is_supported(self) -> bool {
        !matches!(self, SourceFormat::Unsupported)
    }
}

impl From<Option<ImageFormat>> for SourceFormat {
    fn from(format: Option<ImageFormat>) -> Self {
        match format {
            Some(ImageFormat::Jpeg) => SourceFormat::Jpeg,
            Some(ImageFormat::Png) => SourceFormat::Png,
            _ => SourceFormat::Unsupported,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Jpeg => write!(f, "JPEG"),
            SourceFormat::Png => write!(f, "PNG"),
            SourceFormat::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Result of probing a file.
///
/// `dimensions` is only read for supported formats; it is `None` for
/// [`SourceFormat::Unsupported`] so that probing a GIF or a stray text file
/// never fails on a header we have no decoder for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbedImage {
    pub format: SourceFormat,
    pub dimensions: Option<Dimensions>,
}

/// A reader whose format comes from magic bytes only.
///
/// `ImageReader::open` seeds the format from the extension and keeps it when
/// the bytes are unrecognised, so the file is opened without a path hint.
pub(crate) fn open_by_content(path: &Path) -> Result<ImageReader<BufReader<File>>, BackendError> {
    let reader = ImageReader::new(BufReader::new(File::open(path)?));
    Ok(reader.with_guessed_format()?)
}

/// Detect the format from the file's magic bytes.
pub fn probe_format(path: &Path) -> Result<SourceFormat, BackendError> {
    Ok(open_by_content(path)?.format().into())
}

/// Detect the format and, for supported formats, read the header dimensions.
pub fn probe(path: &Path) -> Result<ProbedImage, BackendError> {
    let reader = open_by_content(path)?;
    let format = SourceFormat::from(reader.format());
    if !format.is_supported() {
        return Ok(ProbedImage {
            format,
            dimensions: None,
        });
    }

    let (width, height) = reader.into_dimensions().map_err(|e| {
        BackendError::Decode(format!("Failed to read dimensions of {}: {}", path.display(), e))
    })?;
    Ok(ProbedImage {
        format,
        dimensions: Some(Dimensions { width, height }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{write_gif, write_jpeg, write_png_rgba};
    use tempfile::TempDir;

    #[test]
    fn probes_jpeg_by_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("photo.jpg");
        write_jpeg(&path, 64, 32);

        let probed = probe(&path).unwrap();
        assert_eq!(probed.format, SourceFormat::Jpeg);
        assert_eq!(
            probed.dimensions,
            Some(Dimensions {
                width: 64,
                height: 32
            })
        );
    }

    #[test]
    fn png_with_jpeg_extension_is_png() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("misnamed.jpg");
        write_png_rgba(&path, 10, 20);

        assert_eq!(probe_format(&path).unwrap(), SourceFormat::Png);
    }

    #[test]
    fn text_with_jpeg_extension_is_unsupported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes.jpg");
        std::fs::write(&path, "definitely not an image").unwrap();

        let probed = probe(&path).unwrap();
        assert_eq!(probed.format, SourceFormat::Unsupported);
        assert_eq!(probed.dimensions, None);
    }

    #[test]
    fn gif_is_unsupported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("anim.gif");
        write_gif(&path, 8, 8);

        assert_eq!(probe_format(&path).unwrap(), SourceFormat::Unsupported);
    }

    #[test]
    fn truncated_png_header_is_decode_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.png");
        // Valid signature, no IHDR chunk
        std::fs::write(&path, b"\x89PNG\r\n\x1a\n").unwrap();

        assert!(matches!(probe(&path), Err(BackendError::Decode(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = probe(Path::new("/nonexistent/image.png"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }
}
