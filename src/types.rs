//! Report types shared between the ingest pipeline and CLI output.
//!
//! Everything here serializes to JSON for `--json`.

use crate::imaging::{
    ConvertError, ConvertOutcome, Dimensions, FailureStage, ResizeError, ResizeOutcome, SkipReason,
    SourceFormat,
};
use serde::Serialize;

/// What happened to one file during the resize step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResizeStatus {
    Unchanged { dimensions: Dimensions },
    Resized { from: Dimensions, to: Dimensions },
    /// Not a JPEG/PNG; nothing to do.
    Skipped,
    /// Left at its original size; the pipeline carries on.
    Failed { error: String },
}

impl From<Result<ResizeOutcome, ResizeError>> for ResizeStatus {
    fn from(result: Result<ResizeOutcome, ResizeError>) -> Self {
        match result {
            Ok(ResizeOutcome::Unchanged { dimensions, .. }) => ResizeStatus::Unchanged { dimensions },
            Ok(ResizeOutcome::Resized { from, to, .. }) => ResizeStatus::Resized { from, to },
            Err(ResizeError::UnsupportedFormat { .. }) => ResizeStatus::Skipped,
            Err(e) => ResizeStatus::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// What happened to one file during the convert step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConvertStatus {
    Converted {
        output: String,
        bytes: u64,
        engine: String,
    },
    Skipped {
        reason: SkipReason,
    },
    Failed {
        #[serde(skip_serializing_if = "Option::is_none")]
        stage: Option<FailureStage>,
        error: String,
    },
}

impl From<Result<ConvertOutcome, ConvertError>> for ConvertStatus {
    fn from(result: Result<ConvertOutcome, ConvertError>) -> Self {
        match result {
            Ok(ConvertOutcome::Converted {
                output,
                bytes,
                engine,
            }) => ConvertStatus::Converted {
                output: output.to_string_lossy().to_string(),
                bytes,
                engine: engine.to_string(),
            },
            Ok(ConvertOutcome::Skipped(reason)) => ConvertStatus::Skipped { reason },
            Err(e @ ConvertError::Failed { stage, .. }) => ConvertStatus::Failed {
                stage: Some(stage),
                error: e.to_string(),
            },
        }
    }
}

/// Everything the pipeline did to one source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub source: String,
    pub format: SourceFormat,
    /// Size of the source after the resize step: the file the WebP is
    /// compared against.
    pub original_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize: Option<ResizeStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convert: Option<ConvertStatus>,
}

impl FileReport {
    /// Bytes of the WebP written for this file, if one was.
    pub fn webp_bytes(&self) -> Option<u64> {
        match &self.convert {
            Some(ConvertStatus::Converted { bytes, .. }) => Some(*bytes),
            _ => None,
        }
    }

    /// Percentage saved by the WebP relative to the original upload.
    pub fn savings_percent(&self) -> Option<f64> {
        let webp = self.webp_bytes()?;
        if self.original_bytes == 0 {
            return None;
        }
        Some(100.0 * (1.0 - webp as f64 / self.original_bytes as f64))
    }

    /// Only conversion failures count. Resize failures are tolerated.
    pub fn is_failure(&self) -> bool {
        matches!(self.convert, Some(ConvertStatus::Failed { .. }))
    }
}

/// Totals over a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub files: usize,
    pub resized: usize,
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub original_bytes: u64,
    pub webp_bytes: u64,
}

impl IngestStats {
    pub fn from_reports(reports: &[FileReport]) -> Self {
        let mut stats = Self {
            files: reports.len(),
            ..Self::default()
        };
        for report in reports {
            if matches!(report.resize, Some(ResizeStatus::Resized { .. })) {
                stats.resized += 1;
            }
            if let Some(bytes) = report.webp_bytes() {
                stats.converted += 1;
                stats.original_bytes += report.original_bytes;
                stats.webp_bytes += bytes;
            }
            match &report.convert {
                Some(ConvertStatus::Skipped { .. }) => stats.skipped += 1,
                Some(ConvertStatus::Failed { .. }) => stats.failed += 1,
                _ => {}
            }
        }
        stats
    }
}

impl std::fmt::Display for IngestStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} files, {} resized, {} converted, {} skipped, {} failed",
            self.files, self.resized, self.converted, self.skipped, self.failed
        )?;
        if self.converted > 0 {
            write!(f, " ({} → {} bytes)", self.original_bytes, self.webp_bytes)?;
        }
        Ok(())
    }
}
