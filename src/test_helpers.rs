//! Shared test utilities: synthetic source images written to disk.
//!
//! Fixtures are generated rather than checked in so each test controls the
//! exact dimensions and alpha layout it asserts against.

use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::Path;

fn gradient(w: u32, h: u32) -> RgbImage {
    RgbImage::from_fn(w, h, |x, y| {
        Rgb([(x * 255 / w.max(1)) as u8, (y * 255 / h.max(1)) as u8, 128])
    })
}

/// Write a `w`×`h` RGB gradient as a JPEG.
pub fn write_jpeg(path: &Path, w: u32, h: u32) {
    gradient(w, h)
        .save_with_format(path, ImageFormat::Jpeg)
        .unwrap();
}

/// Write a `w`×`h` RGBA PNG: left half fully transparent, right half opaque.
pub fn write_png_rgba(path: &Path, w: u32, h: u32) {
    let img = RgbaImage::from_fn(w, h, |x, _| {
        if x < w / 2 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([200, 40, 40, 255])
        }
    });
    img.save_with_format(path, ImageFormat::Png).unwrap();
}

/// Write a GIF, a format the pipeline declines to touch.
///
/// Only the signature and logical screen size matter to the pipeline, so the
/// file is assembled by hand: a `w`×`h` screen, a two-colour palette and a
/// single-pixel image block.
pub fn write_gif(path: &Path, w: u16, h: u16) {
    let mut bytes = b"GIF89a".to_vec();
    bytes.extend_from_slice(&w.to_le_bytes());
    bytes.extend_from_slice(&h.to_le_bytes());
    // Global colour table of two entries, background 0, no aspect ratio
    bytes.extend_from_slice(&[0x80, 0, 0]);
    bytes.extend_from_slice(&[0, 0, 0, 0xff, 0xff, 0xff]);
    // Image descriptor at (0, 0), 1x1, then LZW data and the trailer
    bytes.extend_from_slice(&[0x2c, 0, 0, 0, 0, 1, 0, 1, 0, 0]);
    bytes.extend_from_slice(&[0x02, 0x02, 0x44, 0x01, 0x00, 0x3b]);
    std::fs::write(path, bytes).unwrap();
}

fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = 0xffff_ffffu32;
    for &byte in bytes {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xedb8_8320 & mask);
        }
    }
    !crc
}

fn png_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    let start = out.len();
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    let crc = crc32(&out[start..]);
    out.extend_from_slice(&crc.to_be_bytes());
}

/// Write a PNG whose header declares a `w`×`h` RGBA canvas but whose image
/// data is empty. Decoding it in full would need `w * h * 4` bytes.
pub fn write_png_header_only(path: &Path, w: u32, h: u32) {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&w.to_be_bytes());
    ihdr.extend_from_slice(&h.to_be_bytes());
    // 8-bit RGBA, deflate, adaptive filtering, no interlace
    ihdr.extend_from_slice(&[8, 6, 0, 0, 0]);
    png_chunk(&mut bytes, b"IHDR", &ihdr);
    png_chunk(&mut bytes, b"IDAT", &[]);
    png_chunk(&mut bytes, b"IEND", &[]);
    std::fs::write(path, bytes).unwrap();
}

/// Decode any supported image and return the alpha of one pixel.
pub fn alpha_at(path: &Path, x: u32, y: u32) -> u8 {
    let img = image::open(path).unwrap().to_rgba8();
    img.get_pixel(x, y)[3]
}
