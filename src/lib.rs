//! # webp-ingest
//!
//! Optimizes uploaded images: shrinks oversized JPEG/PNG files in place and
//! writes a WebP sibling next to each one.
//!
//! # Architecture: Two Operations, One Pipeline
//!
//! ```text
//! 1. Resize   photo.jpg  →  photo.jpg   (in place, dominant axis capped)
//! 2. Convert  photo.jpg  →  photo.webp  (primary engine, fallback engine)
//! ```
//!
//! Both operations are usable on their own ([`imaging::resize`],
//! [`imaging::convert`]). The [`ingest`] module chains them per file the way
//! an upload handler would: resize first, tolerate its failure, convert, then
//! independently verify the WebP landed.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Probing, fit geometry, JPEG/PNG re-encoding, WebP engines, the two operations |
//! | [`config`] | `webp-ingest.toml` loading over stock defaults, sanitization, `gen-config` |
//! | [`ingest`] | Parallel resize → convert → verify over files and directories |
//! | [`locks`] | Per-path mutual exclusion for work on the same source |
//! | [`types`] | Serializable per-file reports and run totals |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Content Over Extension
//!
//! Formats are detected from magic bytes, never from the file name. A GIF
//! renamed to `.jpg` is left alone by both operations.
//!
//! ## Never Leave Partial Files
//!
//! Every write goes to a temp file in the destination directory and is renamed
//! into place. Resize replaces the source atomically. Convert uses a
//! no-clobber rename, so a WebP that already exists is never overwritten, not
//! even by a concurrent conversion of the same source.
//!
//! ## Two WebP Engines
//!
//! libwebp (via the `webp` crate, behind the default `libwebp` feature) is the
//! primary, lossy encoder. The pure-Rust encoder from `image` is always
//! available and takes over when the primary is missing or fails.

pub mod config;
pub mod imaging;
pub mod ingest;
pub mod locks;
pub mod output;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
