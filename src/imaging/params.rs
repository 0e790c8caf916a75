//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides whether and where to write) and the encoder
//! [`backend`](super::backend) implementations (which do the pixel work).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (0–100). Clamped on construction.
//! - [`PngCompression`]: zlib effort level (0–9). Clamped on construction.
//! - [`EncodeParams`]: everything one WebP encode needs: source, its probed format, output path, quality.

use super::probe::SourceFormat;
use image::codecs::png::CompressionType;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.min(100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// The JPEG encoder rejects 0; treat it as the lowest usable setting.
    pub fn for_jpeg(self) -> u8 {
        self.0.max(1)
    }

    /// libwebp takes quality as a float factor on the same 0-100 scale.
    pub fn as_factor(self) -> f32 {
        f32::from(self.0)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// PNG compression level (0 = fastest/largest, 9 = slowest/smallest).
///
/// Affects only encoder effort and file size, never pixel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngCompression(pub u8);

impl PngCompression {
    pub fn new(level: u32) -> Self {
        Self(level.min(9) as u8)
    }

    /// Map the 0-9 zlib scale onto the encoder's coarse effort presets.
    pub fn compression_type(self) -> CompressionType {
        match self.0 {
            0..=2 => CompressionType::Fast,
            3..=6 => CompressionType::Default,
            _ => CompressionType::Best,
        }
    }
}

impl Default for PngCompression {
    fn default() -> Self {
        Self(6)
    }
}

/// Parameters for a single WebP encode.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeParams {
    pub source: PathBuf,
    pub format: SourceFormat,
    pub output: PathBuf,
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 0);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_80() {
        assert_eq!(Quality::default().value(), 80);
    }

    #[test]
    fn jpeg_quality_never_zero() {
        assert_eq!(Quality::new(0).for_jpeg(), 1);
        assert_eq!(Quality::new(90).for_jpeg(), 90);
    }

    #[test]
    fn png_compression_clamps_and_maps() {
        assert_eq!(PngCompression::new(42), PngCompression(9));
        assert!(matches!(
            PngCompression::new(0).compression_type(),
            CompressionType::Fast
        ));
        assert!(matches!(
            PngCompression::default().compression_type(),
            CompressionType::Default
        ));
        assert!(matches!(
            PngCompression::new(9).compression_type(),
            CompressionType::Best
        ));
    }
}
