//! Configuration module.
//!
//! Handles loading and sanitizing `webp-ingest.toml`. Stock defaults are
//! overridden by whatever keys the user file sets; everything else keeps its
//! default.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [images]
//! max_width = 1500          # Resize bound on the horizontal axis (px)
//! max_height = 1500         # Resize bound on the vertical axis (px)
//! jpeg_quality = 90         # Quality when re-encoding a resized JPEG (0-100)
//! png_compression = 6       # zlib effort when re-encoding a resized PNG (0-9)
//! webp_quality = 80         # Quality of the converted WebP (0-100)
//! skip_jpeg = false         # Never convert JPEG sources
//! skip_png = false          # Never convert PNG sources
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Out-of-range values
//!
//! Values outside their range are not errors: a zero or negative bound, a
//! quality outside 0-100 or a compression level outside 0-9 falls back to its
//! default with a warning. Unknown keys and non-integer values are rejected.
//!
//! The settings are re-read for every invocation; nothing is cached.

use crate::imaging::SourceFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "webp-ingest.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Full configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Resize and conversion settings.
    pub images: ImageSettings,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

/// Settings consumed by [`resize`](crate::imaging::resize) and
/// [`convert`](crate::imaging::convert).
///
/// Deserializing goes through `RawImageSettings`, so every value read from a
/// file is already range-checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawImageSettings")]
pub struct ImageSettings {
    /// Upper bound on width in pixels.
    pub max_width: u32,
    /// Upper bound on height in pixels.
    pub max_height: u32,
    /// JPEG re-encode quality after a resize (0-100).
    pub jpeg_quality: u32,
    /// PNG re-encode compression level after a resize (0-9).
    pub png_compression: u32,
    /// WebP output quality (0-100).
    pub webp_quality: u32,
    /// Leave JPEG sources unconverted. Resizing is unaffected.
    pub skip_jpeg: bool,
    /// Leave PNG sources unconverted. Resizing is unaffected.
    pub skip_png: bool,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            max_width: 1500,
            max_height: 1500,
            jpeg_quality: 90,
            png_compression: 6,
            webp_quality: 80,
            skip_jpeg: false,
            skip_png: false,
        }
    }
}

impl ImageSettings {
    pub fn max_dimensions(&self) -> (u32, u32) {
        (self.max_width, self.max_height)
    }

    /// Whether conversion is switched off for `format`.
    pub fn skips(&self, format: SourceFormat) -> bool {
        match format {
            SourceFormat::Jpeg => self.skip_jpeg,
            SourceFormat::Png => self.skip_png,
            SourceFormat::Unsupported => true,
        }
    }

}

/// `[images]` as written in the file. Integers are read as `i64` so that a
/// negative value reaches the range check instead of failing the parse.
#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawImageSettings {
    max_width: i64,
    max_height: i64,
    jpeg_quality: i64,
    png_compression: i64,
    webp_quality: i64,
    skip_jpeg: bool,
    skip_png: bool,
}

impl Default for RawImageSettings {
    fn default() -> Self {
        let d = ImageSettings::default();
        Self {
            max_width: d.max_width.into(),
            max_height: d.max_height.into(),
            jpeg_quality: d.jpeg_quality.into(),
            png_compression: d.png_compression.into(),
            webp_quality: d.webp_quality.into(),
            skip_jpeg: d.skip_jpeg,
            skip_png: d.skip_png,
        }
    }
}

impl From<RawImageSettings> for ImageSettings {
    /// Replace every out-of-range value with its default.
    fn from(raw: RawImageSettings) -> Self {
        let defaults = Self::default();
        Self {
            max_width: in_range("max_width", raw.max_width, 1, u32::MAX, defaults.max_width),
            max_height: in_range("max_height", raw.max_height, 1, u32::MAX, defaults.max_height),
            jpeg_quality: in_range("jpeg_quality", raw.jpeg_quality, 0, 100, defaults.jpeg_quality),
            png_compression: in_range(
                "png_compression",
                raw.png_compression,
                0,
                9,
                defaults.png_compression,
            ),
            webp_quality: in_range("webp_quality", raw.webp_quality, 0, 100, defaults.webp_quality),
            skip_jpeg: raw.skip_jpeg,
            skip_png: raw.skip_png,
        }
    }
}

fn in_range(key: &str, value: i64, min: u32, max: u32, default: u32) -> u32 {
    match u32::try_from(value) {
        Ok(v) if (min..=max).contains(&v) => v,
        _ => {
            warn!(key, value, default, "images.{} out of range, using default", key);
            default
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, and never fewer than one
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading and merging
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Config::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults and deserialize.
///
/// Out-of-range image settings come back as their defaults.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<Config, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    Ok(merged.try_into()?)
}

/// Load config from the file at `path`.
///
/// A missing file yields the stock defaults; a file that exists but does not
/// parse is an error.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock config file.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# webp-ingest configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys cause an error. Out-of-range numbers fall back to the default.

# ---------------------------------------------------------------------------
# Images
# ---------------------------------------------------------------------------
[images]
# Resize bounds in pixels. Images larger than either bound are scaled so
# that their longer side equals the matching bound.
max_width = 1500
max_height = 1500

# Quality used when a resized JPEG is written back (0-100).
jpeg_quality = 90

# Compression level used when a resized PNG is written back (0-9).
# Higher is smaller and slower; pixels are identical either way.
png_compression = 6

# Quality of the generated .webp file (0-100).
webp_quality = 80

# Disable WebP conversion per source format. Resizing still happens.
skip_jpeg = false
skip_png = false

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn images(toml: &str) -> ImageSettings {
        let value: toml::Value = toml::from_str(toml).unwrap();
        resolve_config(Some(value)).unwrap().images
    }

    #[test]
    fn default_settings_match_documented_values() {
        let s = ImageSettings::default();
        assert_eq!(s.max_dimensions(), (1500, 1500));
        assert_eq!(s.jpeg_quality, 90);
        assert_eq!(s.png_compression, 6);
        assert_eq!(s.webp_quality, 80);
        assert!(!s.skip_jpeg);
        assert!(!s.skip_png);
    }

    #[test]
    fn skips_follow_flags() {
        let s = ImageSettings {
            skip_png: true,
            ..ImageSettings::default()
        };
        assert!(!s.skips(SourceFormat::Jpeg));
        assert!(s.skips(SourceFormat::Png));
        assert!(s.skips(SourceFormat::Unsupported));
    }

    #[test]
    fn out_of_range_values_fall_back_to_defaults() {
        let s = images(
            "[images]\nmax_width = 0\nmax_height = 900\njpeg_quality = 101\n\
             png_compression = 12\nwebp_quality = 250\nskip_jpeg = true\n",
        );

        assert_eq!(s.max_width, 1500);
        assert_eq!(s.max_height, 900);
        assert_eq!(s.jpeg_quality, 90);
        assert_eq!(s.png_compression, 6);
        assert_eq!(s.webp_quality, 80);
        assert!(s.skip_jpeg);
    }

    #[test]
    fn boundary_values_are_kept() {
        let s = images("[images]\njpeg_quality = 0\npng_compression = 9\nwebp_quality = 100\n");
        assert_eq!(s.jpeg_quality, 0);
        assert_eq!(s.png_compression, 9);
        assert_eq!(s.webp_quality, 100);
    }

    #[test]
    fn negative_values_fall_back_to_defaults() {
        let s = images(
            "[images]\nmax_width = -5\njpeg_quality = -1\npng_compression = -9\n\
             webp_quality = -80\n",
        );
        assert_eq!(s, ImageSettings::default());
    }

    #[test]
    fn values_beyond_u32_fall_back_to_defaults() {
        let s = images("[images]\nmax_height = 5000000000\n");
        assert_eq!(s.max_height, 1500);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[images]
webp_quality = 65
skip_png = true
"##;
        let value: toml::Value = toml::from_str(toml).unwrap();
        let config = resolve_config(Some(value)).unwrap();
        assert_eq!(config.images.webp_quality, 65);
        assert!(config.images.skip_png);
        // Defaults preserved
        assert_eq!(config.images.max_width, 1500);
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let value: toml::Value = toml::from_str("[images]\nmax_widht = 10\n").unwrap();
        assert!(matches!(resolve_config(Some(value)), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let value: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        let config = resolve_config(Some(value)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn merge_toml_overlays_nested_tables() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn effective_threads_clamps() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
        assert_eq!(
            effective_threads(&ProcessingConfig {
                max_processes: Some(0)
            }),
            1
        );
        assert_eq!(
            effective_threads(&ProcessingConfig {
                max_processes: Some(usize::MAX)
            }),
            cores
        );
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_config_reads_and_sanitizes_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            "[images]\nmax_width = 1024\njpeg_quality = 300\n\n[processing]\nmax_processes = 2\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.images.max_width, 1024);
        assert_eq!(config.images.jpeg_quality, 90);
        assert_eq!(config.processing.max_processes, Some(2));
    }

    #[test]
    fn load_config_invalid_toml_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(&path, "[images\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn non_integer_value_is_rejected() {
        let value: toml::Value = toml::from_str("[images]\nmax_width = \"wide\"\n").unwrap();
        assert!(matches!(resolve_config(Some(value)), Err(ConfigError::Toml(_))));
    }
}
