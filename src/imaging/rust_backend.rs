//! Pure Rust image backend: the secondary WebP engine and the resizer's codec layer.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode JPEG | `image::ImageReader::with_format(.., ImageFormat::Jpeg)` |
//! | Decode PNG | `image::ImageReader::with_format(.., ImageFormat::Png)` (palette expanded to true color) |
//! | Resample | `image::DynamicImage::resize_exact` with `Triangle` (bilinear) |
//! | Encode JPEG | `image::codecs::jpeg::JpegEncoder` at `jpeg_quality` |
//! | Encode PNG | `image::codecs::png::PngEncoder` at `png_compression` |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless container) |
//!
//! The `image` crate only ships a lossless WebP encoder. To make the quality
//! setting meaningful anyway, colour channels are quantized to fewer levels
//! before encoding when quality is below 100; alpha is never touched.
//!
//! Decoding and resampling both stay inside `image::Limits::default()`: a
//! header announcing a huge canvas, or a target size that would need more
//! than `max_alloc` bytes, is an error instead of an allocation.

use super::backend::{BackendError, WebpEncoder};
use super::params::{EncodeParams, PngCompression, Quality};
use super::probe::SourceFormat;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, ImageReader, Limits};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Pure Rust WebP engine using the `image` crate ecosystem.
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

/// Decode with the loader for `format`, never the generic guesser.
///
/// Goes through [`ImageReader::decode`] so the default allocation limits
/// apply before any pixel buffer is reserved.
pub fn load_image(path: &Path, format: SourceFormat) -> Result<DynamicImage, BackendError> {
    let image_format = match format {
        SourceFormat::Jpeg => ImageFormat::Jpeg,
        SourceFormat::Png => ImageFormat::Png,
        SourceFormat::Unsupported => {
            return Err(BackendError::Decode(format!(
                "No loader for {}",
                path.display()
            )));
        }
    };
    let reader = ImageReader::with_format(BufReader::new(File::open(path)?), image_format);
    reader.decode().map_err(|e| {
        BackendError::Decode(format!(
            "Failed to decode {} as {}: {}",
            path.display(),
            format,
            e
        ))
    })
}

/// Bytes `resize_exact` would allocate for a `width`x`height` copy of `img`.
fn resampled_bytes(img: &DynamicImage, width: u32, height: u32) -> u64 {
    u64::from(width)
        .saturating_mul(u64::from(height))
        .saturating_mul(u64::from(img.color().bytes_per_pixel()))
}

/// Resample to exactly `width`x`height`.
///
/// Colour type is preserved, so a PNG with an alpha channel keeps per-pixel
/// alpha: nothing is composited onto a background. Targets whose buffer would
/// exceed the default `max_alloc` are refused with [`BackendError::Encode`].
pub fn resample(
    img: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<DynamicImage, BackendError> {
    let needed = resampled_bytes(img, width, height);
    let budget = Limits::default().max_alloc.unwrap_or(u64::MAX);
    if needed > budget {
        return Err(BackendError::Encode(format!(
            "target {}x{} needs {} bytes, over the {} byte allocation limit",
            width, height, needed, budget
        )));
    }
    Ok(img.resize_exact(width, height, FilterType::Triangle))
}

/// Encode `img` as JPEG into `writer`.
pub fn write_jpeg(
    img: &DynamicImage,
    writer: impl Write,
    quality: Quality,
) -> Result<(), BackendError> {
    let encoder = JpegEncoder::new_with_quality(writer, quality.for_jpeg());
    // JPEG has no alpha channel
    let result = if img.color().has_alpha() {
        DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)
    } else {
        img.write_with_encoder(encoder)
    };
    result.map_err(|e| BackendError::Encode(format!("JPEG encode failed: {}", e)))
}

/// Encode `img` as PNG into `writer`, keeping its alpha channel.
pub fn write_png(
    img: &DynamicImage,
    writer: impl Write,
    compression: PngCompression,
) -> Result<(), BackendError> {
    let encoder =
        PngEncoder::new_with_quality(writer, compression.compression_type(), PngFilter::Adaptive);
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::Encode(format!("PNG encode failed: {}", e)))
}

/// Number of levels per colour channel for a given quality.
///
/// Quadratic so that high qualities stay close to lossless while low
/// qualities collapse hard for size.
fn quantize_levels(quality: Quality) -> u16 {
    if quality.value() >= 100 {
        return 256;
    }
    let normalized = f32::from(quality.value().max(1)) / 100.0;
    let levels = 2.0 + normalized * normalized * 254.0;
    levels.round().clamp(2.0, 256.0) as u16
}

/// Snap RGB channels of an RGBA buffer to `quantize_levels(quality)` buckets.
fn quantize_rgb(data: &mut [u8], quality: Quality) {
    let levels = quantize_levels(quality);
    if levels >= 256 {
        return;
    }
    let step = 255.0 / (f32::from(levels) - 1.0);
    for pixel in data.chunks_exact_mut(4) {
        for channel in pixel.iter_mut().take(3) {
            let bucket = (f32::from(*channel) / step).round();
            *channel = (bucket * step).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Encode `img` as WebP into `writer`.
///
/// PNG sources go through RGBA so transparency survives; JPEG sources are
/// opaque and go through RGB.
pub fn write_webp(
    img: &DynamicImage,
    format: SourceFormat,
    writer: impl Write,
    quality: Quality,
) -> Result<(), BackendError> {
    let encoder = WebPEncoder::new_lossless(writer);
    let result = match format {
        SourceFormat::Png => {
            let mut rgba = img.to_rgba8();
            quantize_rgb(&mut rgba, quality);
            let (width, height) = rgba.dimensions();
            encoder.write_image(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
        }
        _ => {
            let mut rgba = img.to_rgba8();
            quantize_rgb(&mut rgba, quality);
            let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();
            let (width, height) = rgb.dimensions();
            encoder.write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        }
    };
    result.map_err(|e| BackendError::Encode(format!("WebP encode failed: {}", e)))
}

impl WebpEncoder for RustBackend {
    fn name(&self) -> &'static str {
        "image-rs"
    }

    fn encode(&self, params: &EncodeParams) -> Result<(), BackendError> {
        // Dropped on every return path, including errors below
        let img = load_image(&params.source, params.format)?;

        let file = File::create(&params.output).map_err(|e| {
            BackendError::Encode(format!("Failed to create {}: {}", params.output.display(), e))
        })?;
        let mut writer = BufWriter::new(file);
        write_webp(&img, params.format, &mut writer, params.quality)?;
        writer.flush().map_err(|e| {
            BackendError::Encode(format!("Failed to write {}: {}", params.output.display(), e))
        })
    }
}
