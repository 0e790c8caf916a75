//! High-level image operations.
//!
//! The two entry points the rest of the system calls:
//!
//! - [`resize`]: shrink an oversized JPEG/PNG in place (same path, same format).
//! - [`convert`]: write a WebP sibling next to a JPEG/PNG, never touching the source.
//!
//! Both are synchronous and single-shot: one call decodes, transforms and
//! encodes one file on the calling thread and keeps nothing afterwards.
//!
//! ## Conversion flow
//!
//! ```text
//! probe ─┬─ not JPEG/PNG ──────────────→ Skipped(UnsupportedFormat)
//!        ├─ skip_jpeg / skip_png ──────→ Skipped(DisabledByConfig)
//!        ├─ <stem>.webp exists ────────→ Skipped(AlreadyConverted)
//!        └─ primary engine ─┬─ ok ─────→ Converted
//!                           └─ error ──→ secondary engine ─┬─ ok ──→ Converted
//!                                                          └─ error → Failed
//! ```
//!
//! Every engine attempt writes to its own temp file in the output directory.
//! A failed attempt's temp file is deleted before the next tier runs; a
//! successful one is moved onto `<stem>.webp` with a no-clobber rename, so
//! an existing WebP is never overwritten even when two conversions of the
//! same source race past the existence check.

use super::backend::{BackendError, Dimensions, WebpEncoder};
use super::calculations::{calculate_fit_dimensions, fits_within};
use super::libwebp_backend::LibwebpBackend;
use super::params::{EncodeParams, PngCompression, Quality};
use super::probe::{SourceFormat, probe, probe_format};
use super::rust_backend::{self, RustBackend};
use crate::config::ImageSettings;
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};
use thiserror::Error;
use tracing::{debug, error, warn};

/// Extension of converted files.
pub const WEBP_EXTENSION: &str = "webp";

/// Outcome of a [`resize`] call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// Already within bounds; the file was not touched.
    Unchanged {
        path: PathBuf,
        dimensions: Dimensions,
    },
    /// Resampled and rewritten in place.
    Resized {
        path: PathBuf,
        from: Dimensions,
        to: Dimensions,
    },
}

#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("{path}: unsupported format (only JPEG and PNG are resized)")]
    UnsupportedFormat { path: PathBuf },
    #[error("{path}: decode failed: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("{path}: encode failed: {message}")]
    Encode { path: PathBuf, message: String },
}

/// Why [`convert`] deliberately did nothing. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    UnsupportedFormat,
    DisabledByConfig,
    AlreadyConverted,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::UnsupportedFormat => write!(f, "unsupported format"),
            SkipReason::DisabledByConfig => write!(f, "disabled by config"),
            SkipReason::AlreadyConverted => write!(f, "already converted"),
        }
    }
}

/// Outcome of a [`convert`] call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertOutcome {
    Converted {
        output: PathBuf,
        bytes: u64,
        engine: &'static str,
    },
    Skipped(SkipReason),
}

/// The stage at which the last engine tier gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Decode,
    Encode,
}

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("{path}: conversion failed ({stage:?}): {message}")]
    Failed {
        path: PathBuf,
        stage: FailureStage,
        message: String,
    },
}

impl ConvertError {
    fn from_backend(path: &Path, err: &BackendError) -> Self {
        let stage = match err {
            BackendError::Decode(_) => FailureStage::Decode,
            _ => FailureStage::Encode,
        };
        ConvertError::Failed {
            path: path.to_path_buf(),
            stage,
            message: err.to_string(),
        }
    }
}

/// `<dir>/<stem>.webp` for a source at `<dir>/<stem>.<ext>`.
pub fn webp_output_path(source: &Path) -> PathBuf {
    source.with_extension(WEBP_EXTENSION)
}

/// Directory to create temp files in: the file's own directory.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

// =============================================================================
// Resize
// =============================================================================

/// Shrink `path` in place so its dominant axis equals the configured maximum.
///
/// Images already within `max_width` x `max_height` are returned untouched.
/// See [`calculate_fit_dimensions`](super::calculate_fit_dimensions) for the
/// exact geometry. The rewritten file keeps its format and permissions and
/// replaces the original atomically.
pub fn resize(path: &Path, settings: &ImageSettings) -> Result<ResizeOutcome, ResizeError> {
    let result = resize_in_place(path, settings);
    if let Err(e) = &result {
        warn!(path = %path.display(), error = %e, "resize failed, keeping original");
    }
    result
}

fn resize_in_place(path: &Path, settings: &ImageSettings) -> Result<ResizeOutcome, ResizeError> {
    let decode_err = |e: BackendError| ResizeError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let encode_err = |e: BackendError| ResizeError::Encode {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let probed = probe(path).map_err(decode_err)?;
    let format = probed.format;
    let from = match probed.dimensions {
        Some(dims) if format.is_supported() => dims,
        _ => {
            return Err(ResizeError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };

    let max = settings.max_dimensions();
    if fits_within(from.as_tuple(), max) {
        debug!(path = %path.display(), width = from.width, height = from.height, "within bounds");
        return Ok(ResizeOutcome::Unchanged {
            path: path.to_path_buf(),
            dimensions: from,
        });
    }

    let to = Dimensions::from(calculate_fit_dimensions(from.as_tuple(), max));
    let resized = {
        let img = rust_backend::load_image(path, format).map_err(decode_err)?;
        rust_backend::resample(&img, to.width, to.height).map_err(encode_err)?
    };

    let mut temp = NamedTempFile::new_in(parent_dir(path))
        .map_err(|e| encode_err(BackendError::Io(e)))?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        let written = match format {
            SourceFormat::Jpeg => rust_backend::write_jpeg(
                &resized,
                &mut writer,
                Quality::new(settings.jpeg_quality),
            ),
            _ => rust_backend::write_png(
                &resized,
                &mut writer,
                PngCompression::new(settings.png_compression),
            ),
        };
        written.map_err(encode_err)?;
        writer.flush().map_err(|e| encode_err(BackendError::Io(e)))?;
    }
    drop(resized);

    let persist = |temp: NamedTempFile| -> std::io::Result<()> {
        let permissions = fs::metadata(path)?.permissions();
        fs::set_permissions(temp.path(), permissions)?;
        temp.persist(path).map(|_| ()).map_err(|e| e.error)
    };
    persist(temp).map_err(|e| encode_err(BackendError::Io(e)))?;

    debug!(
        path = %path.display(),
        from = ?from.as_tuple(),
        to = ?to.as_tuple(),
        "resized"
    );
    Ok(ResizeOutcome::Resized {
        path: path.to_path_buf(),
        from,
        to,
    })
}

// =============================================================================
// Convert
// =============================================================================

/// Convert a JPEG or PNG to a WebP sibling using the default engines.
///
/// Primary is libwebp (when compiled in), secondary the pure-Rust encoder.
pub fn convert(path: &Path, settings: &ImageSettings) -> Result<ConvertOutcome, ConvertError> {
    convert_with_engines(&LibwebpBackend::new(), &RustBackend::new(), path, settings)
}

/// Result of one engine attempt that did not error.
enum Attempt {
    Persisted(u64),
    /// Someone else's WebP appeared at the output path first.
    LostRace,
}

/// Convert using explicit engines (allows testing with mocks).
pub fn convert_with_engines(
    primary: &dyn WebpEncoder,
    secondary: &dyn WebpEncoder,
    path: &Path,
    settings: &ImageSettings,
) -> Result<ConvertOutcome, ConvertError> {
    let format = probe_format(path).map_err(|e| {
        error!(path = %path.display(), error = %e, "cannot probe source");
        ConvertError::from_backend(path, &BackendError::Decode(e.to_string()))
    })?;

    if !format.is_supported() {
        debug!(path = %path.display(), "not JPEG/PNG, skipping");
        return Ok(ConvertOutcome::Skipped(SkipReason::UnsupportedFormat));
    }
    if settings.skips(format) {
        debug!(path = %path.display(), %format, "conversion disabled for format");
        return Ok(ConvertOutcome::Skipped(SkipReason::DisabledByConfig));
    }

    let output = webp_output_path(path);
    if output.exists() {
        debug!(path = %path.display(), output = %output.display(), "already converted");
        return Ok(ConvertOutcome::Skipped(SkipReason::AlreadyConverted));
    }

    let quality = Quality::new(settings.webp_quality);
    let mut last_error = BackendError::Unavailable("no WebP engine available");

    for (tier, engine) in [("primary", primary), ("secondary", secondary)] {
        if !engine.is_available() {
            debug!(engine = engine.name(), tier, "engine unavailable");
            continue;
        }

        match attempt(engine, path, format, &output, quality) {
            Ok(Attempt::Persisted(bytes)) => {
                return Ok(ConvertOutcome::Converted {
                    output,
                    bytes,
                    engine: engine.name(),
                });
            }
            Ok(Attempt::LostRace) => {
                debug!(output = %output.display(), "concurrent conversion won");
                return Ok(ConvertOutcome::Skipped(SkipReason::AlreadyConverted));
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    engine = engine.name(),
                    tier,
                    error = %e,
                    "WebP engine failed"
                );
                last_error = e;
            }
        }
    }

    error!(path = %path.display(), error = %last_error, "all WebP engines failed");
    Err(ConvertError::from_backend(path, &last_error))
}

/// Run one engine into a temp file and move it onto `output`.
///
/// The temp file is removed on every failure path when `temp` drops.
fn attempt(
    engine: &dyn WebpEncoder,
    source: &Path,
    format: SourceFormat,
    output: &Path,
    quality: Quality,
) -> Result<Attempt, BackendError> {
    let temp: TempPath = tempfile::Builder::new()
        .prefix(".webp-ingest-")
        .suffix(".tmp")
        .tempfile_in(parent_dir(output))?
        .into_temp_path();

    engine.encode(&EncodeParams {
        source: source.to_path_buf(),
        format,
        output: temp.to_path_buf(),
        quality,
    })?;

    let bytes = fs::metadata(&temp)?.len();
    if bytes == 0 {
        return Err(BackendError::Encode(format!(
            "{} produced an empty file",
            engine.name()
        )));
    }
    fs::set_permissions(&temp, fs::metadata(source)?.permissions())?;

    match temp.persist_noclobber(output) {
        Ok(()) => Ok(Attempt::Persisted(bytes)),
        Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => Ok(Attempt::LostRace),
        Err(e) => Err(BackendError::Io(e.error)),
    }
}
