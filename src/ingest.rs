//! The upload pipeline: resize each source in place, then write its WebP
//! sibling, then check the WebP actually landed.
//!
//! ## Per-file flow
//!
//! ```text
//! source.jpg ──resize──▶ source.jpg (≤ max) ──convert──▶ source.webp ──verify──▶ FileReport
//! ```
//!
//! A resize failure is recorded and logged but never stops the file: the
//! conversion runs on the unresized original. Only conversion failures (or a
//! WebP that is missing or empty after a reported success) mark a file failed.
//!
//! ## Parallel Processing
//!
//! Files run in parallel on the global [rayon](https://docs.rs/rayon) pool.
//! Work on any single source path is serialized through [`PathLocks`], so two
//! entries naming the same file never encode it twice.

use crate::config::ImageSettings;
use crate::imaging::{self, SourceFormat};
use crate::locks::PathLocks;
use crate::types::{ConvertStatus, FileReport, IngestStats, ResizeStatus};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, error, info};
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Input not found: {0}")]
    NotFound(PathBuf),
}

/// Which operations to run on each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Steps {
    pub resize: bool,
    pub convert: bool,
}

impl Steps {
    pub const RESIZE: Steps = Steps {
        resize: true,
        convert: false,
    };
    pub const CONVERT: Steps = Steps {
        resize: false,
        convert: true,
    };
    pub const ALL: Steps = Steps {
        resize: true,
        convert: true,
    };
}

/// Progress events sent while a run is underway.
#[derive(Debug, Clone)]
pub enum IngestEvent {
    /// Inputs have been expanded; `total` files will be processed.
    Started { total: usize },
    /// One file finished. `index` is its 1-based position in input order.
    FileDone { index: usize, report: FileReport },
}

/// Result of a whole run, reports in input order.
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub reports: Vec<FileReport>,
    pub stats: IngestStats,
}

impl IngestSummary {
    pub fn has_failures(&self) -> bool {
        self.stats.failed > 0
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

fn is_webp_output(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(imaging::operations::WEBP_EXTENSION))
}

/// Expand the given paths into a sorted, de-duplicated list of files.
///
/// Files are taken as given. Directories are walked recursively, skipping
/// hidden entries (including in-flight temp files) and existing `.webp`
/// outputs. Format filtering is left to the operations, which probe content.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>, IngestError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            let walker = WalkDir::new(path)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e));
            for entry in walker {
                let entry = entry?;
                if entry.file_type().is_file() && !is_webp_output(entry.path()) {
                    files.push(entry.into_path());
                }
            }
        } else {
            return Err(IngestError::NotFound(path.clone()));
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// The WebP must exist with a non-zero size, whatever `convert` reported.
fn verify_output(status: ConvertStatus) -> ConvertStatus {
    let ConvertStatus::Converted { output, .. } = &status else {
        return status;
    };
    match fs::metadata(output) {
        Ok(meta) if meta.len() > 0 => status,
        _ => {
            error!(output = %output, "WebP missing or empty after conversion");
            ConvertStatus::Failed {
                stage: None,
                error: format!("WebP output missing or empty: {output}"),
            }
        }
    }
}

/// Run the selected steps on one file and report what happened.
pub fn ingest_file(
    path: &Path,
    steps: Steps,
    settings: &ImageSettings,
    locks: &PathLocks,
) -> FileReport {
    locks.with_lock(path, || {
        let resize = steps
            .resize
            .then(|| ResizeStatus::from(imaging::resize(path, settings)));

        // Measured after resizing: this is the file the WebP replaces.
        let original_bytes = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let format = imaging::probe_format(path).unwrap_or(SourceFormat::Unsupported);

        let convert = steps
            .convert
            .then(|| verify_output(ConvertStatus::from(imaging::convert(path, settings))));

        debug!(path = %path.display(), ?resize, ?convert, "file done");
        FileReport {
            source: path.display().to_string(),
            format,
            original_bytes,
            resize,
            convert,
        }
    })
}

/// Expand `paths` and run the selected steps on every file in parallel.
///
/// When `events` is given, a [`IngestEvent::Started`] is sent first and one
/// [`IngestEvent::FileDone`] per file as it completes (completion order).
pub fn ingest(
    paths: &[PathBuf],
    steps: Steps,
    settings: &ImageSettings,
    events: Option<Sender<IngestEvent>>,
) -> Result<IngestSummary, IngestError> {
    let files = collect_inputs(paths)?;
    info!(files = files.len(), ?steps, "starting");
    if let Some(tx) = &events {
        tx.send(IngestEvent::Started { total: files.len() }).ok();
    }

    let locks = PathLocks::new();
    let reports: Vec<FileReport> = files
        .par_iter()
        .enumerate()
        .map_with(events, |events, (i, path)| {
            let report = ingest_file(path, steps, settings, &locks);
            if let Some(tx) = events {
                tx.send(IngestEvent::FileDone {
                    index: i + 1,
                    report: report.clone(),
                })
                .ok();
            }
            report
        })
        .collect();

    let stats = IngestStats::from_reports(&reports);
    info!(%stats, "finished");
    Ok(IngestSummary { reports, stats })
}
