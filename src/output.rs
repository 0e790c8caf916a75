//! CLI output formatting for pipeline runs.
//!
//! # Output Format
//!
//! ```text
//! Processing 3 files
//! 001 photo.jpg
//!     Source: uploads/2024/photo.jpg
//!     resize: 4000x2000 → 1500x750
//!     webp: libwebp, 1.20 MB → 240.00 KB (80.0% saved)
//! 002 anim.gif
//!     Source: uploads/2024/anim.gif
//!     resize: skipped
//!     webp: skipped (unsupported format)
//!
//! 3 files, 1 resized, 2 converted, 1 skipped, 0 failed (...)
//! ```
//!
//! # Architecture
//!
//! Every `format_*` function returns lines (or a single line) and does no
//! I/O, so the display can be unit tested. `print_*` wrappers write to stdout.
//! Logging goes to stderr separately; nothing here uses `tracing`.

use crate::imaging::Dimensions;
use crate::ingest::{IngestEvent, IngestSummary};
use crate::types::{ConvertStatus, FileReport, ResizeStatus};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count: bytes below 1 KB, then KB, then MB.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

fn format_dimensions(d: &Dimensions) -> String {
    format!("{}x{}", d.width, d.height)
}

pub fn format_resize_status(status: &ResizeStatus) -> String {
    match status {
        ResizeStatus::Unchanged { dimensions } => {
            format!("{} (within bounds)", format_dimensions(dimensions))
        }
        ResizeStatus::Resized { from, to } => {
            format!("{} → {}", format_dimensions(from), format_dimensions(to))
        }
        ResizeStatus::Skipped => "skipped".to_string(),
        ResizeStatus::Failed { error } => format!("failed, kept original ({})", error),
    }
}

/// The `webp:` line for a report, or `None` when the convert step did not run.
pub fn format_convert_status(report: &FileReport) -> Option<String> {
    let line = match report.convert.as_ref()? {
        ConvertStatus::Converted { bytes, engine, .. } => {
            let mut line = format!(
                "{}, {} → {}",
                engine,
                format_bytes(report.original_bytes),
                format_bytes(*bytes)
            );
            if let Some(saved) = report.savings_percent() {
                line.push_str(&format!(" ({:.1}% saved)", saved));
            }
            line
        }
        ConvertStatus::Skipped { reason } => format!("skipped ({})", reason),
        ConvertStatus::Failed { error, .. } => format!("FAILED: {}", error),
    };
    Some(line)
}

/// One file's block: header line, then indented context lines.
pub fn format_file_report(index: usize, report: &FileReport) -> Vec<String> {
    let filename = Path::new(&report.source)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| report.source.clone());

    let mut lines = vec![
        format!("{} {}", format_index(index), filename),
        format!("{}Source: {}", indent(1), report.source),
    ];
    if let Some(resize) = &report.resize {
        lines.push(format!("{}resize: {}", indent(1), format_resize_status(resize)));
    }
    if let Some(convert) = format_convert_status(report) {
        lines.push(format!("{}webp: {}", indent(1), convert));
    }
    lines
}

pub fn format_ingest_event(event: &IngestEvent) -> Vec<String> {
    match event {
        IngestEvent::Started { total } => {
            let noun = if *total == 1 { "file" } else { "files" };
            vec![format!("Processing {} {}", total, noun)]
        }
        IngestEvent::FileDone { index, report } => format_file_report(*index, report),
    }
}

/// Closing lines: failed sources (if any), then the totals.
pub fn format_summary(summary: &IngestSummary) -> Vec<String> {
    let mut lines = vec![String::new()];
    let failed: Vec<&FileReport> = summary.reports.iter().filter(|r| r.is_failure()).collect();
    if !failed.is_empty() {
        lines.push("Failed".to_string());
        for report in failed {
            lines.push(format!("{}{}", indent(1), report.source));
        }
    }
    lines.push(summary.stats.to_string());
    lines
}

pub fn print_ingest_event(event: &IngestEvent) {
    for line in format_ingest_event(event) {
        println!("{}", line);
    }
}

pub fn print_summary(summary: &IngestSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}
