//! CLI output formatting.
//!
//! Each command has `format_*` functions (returning `String`s for
//! testability) and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! ## Compress
//!
//! ```text
//! venue/image1.jpg
//!     4.2 MB → 812.4 KB (saved 81.1%)
//!     WebP: 694.2 KB
//! venue/image2.jpg
//!     decode: unsupported marker — skipped
//!
//! Compressed 12 files, 1 skipped
//! 48.3 MB → 9.1 MB (saved 81.2%)
//! ```
//!
//! ## Discover
//!
//! ```text
//! venue (2 photos)
//!     001 Venue 1
//!         Source: /photos/venue/image1.jpg
//!     002 Venue 2
//!         Source: /photos/venue/image2.png
//! ```

use crate::compress::{CompressReport, FileFailure, FileOutcome};
use crate::types::LogicalPhoto;

/// Format a byte count with binary units, trimming trailing zeros
/// (`1.5 KB`, not `1.50 KB`).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[exponent])
}

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(position: usize) -> String {
    format!("{position:0>3}")
}

/// Lines for one compressed file.
pub fn format_outcome(outcome: &FileOutcome) -> Vec<String> {
    let mut lines = vec![
        outcome.path.display().to_string(),
        format!(
            "    {} → {} (saved {:.1}%)",
            format_bytes(outcome.original_bytes),
            format_bytes(outcome.compressed_bytes),
            outcome.savings_percent(),
        ),
    ];
    if let Some(webp) = outcome.webp_bytes {
        lines.push(format!("    WebP: {}", format_bytes(webp)));
    }
    lines
}

/// Lines for one skipped file.
pub fn format_failure(failure: &FileFailure) -> Vec<String> {
    vec![
        failure.path.display().to_string(),
        format!("    {} — skipped", failure.reason),
    ]
}

/// Summary block for a whole compression run.
pub fn format_compress_summary(report: &CompressReport) -> Vec<String> {
    let skipped = if report.failures.is_empty() {
        String::new()
    } else {
        format!(", {} skipped", report.failures.len())
    };
    vec![
        format!("Compressed {} files{}", report.outcomes.len(), skipped),
        format!(
            "{} → {} (saved {:.1}%)",
            format_bytes(report.total_original()),
            format_bytes(report.total_compressed()),
            report.total_savings_percent(),
        ),
    ]
}

/// Print a full compression report: per-file lines, then the summary.
pub fn print_compress_report(report: &CompressReport) {
    for outcome in &report.outcomes {
        for line in format_outcome(outcome) {
            println!("{line}");
        }
    }
    for failure in &report.failures {
        for line in format_failure(failure) {
            println!("{line}");
        }
    }
    println!();
    for line in format_compress_summary(report) {
        println!("{line}");
    }
}

/// Lines for one discovered category.
pub fn format_discovery(category: &str, photos: &[LogicalPhoto]) -> Vec<String> {
    let mut lines = vec![format!("{} ({} photos)", category, photos.len())];
    for (position, photo) in photos.iter().enumerate() {
        lines.push(format!("    {} {}", format_index(position + 1), photo.title));
        lines.push(format!("        Source: {}", photo.base_source));
    }
    lines
}

/// Print discovery results for each category.
pub fn print_discovery(results: &[(String, Vec<LogicalPhoto>)]) {
    for (category, photos) in results {
        for line in format_discovery(category, photos) {
            println!("{line}");
        }
    }
}
