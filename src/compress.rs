//! Batch photo compression.
//!
//! The build-time half of the asset pipeline: shrink oversized camera
//! originals to display size, re-encode them at a sane JPEG quality, and
//! write a WebP sibling next to each output so the negotiator has something
//! to negotiate for (see [`negotiate`](crate::negotiate)).
//!
//! ## Behavior
//!
//! - Walks the input tree and picks up `.jpg`/`.jpeg` files.
//! - Per file: decode → fit inside the configured box (no enlargement,
//!   Lanczos3) → JPEG re-encode → optional lossless WebP sibling.
//! - Mirror mode writes the same relative layout under the output
//!   directory; `--replace` overwrites sources in place. Either way the
//!   JPEG goes through a temp sibling and a rename, so an interrupted run
//!   never leaves a half-written file where a photo was.
//! - A file that fails to decode or encode is logged and skipped; the run
//!   keeps going. Only failures that invalidate the whole run (unreadable
//!   input root, un-creatable output directory) are errors.
//!
//! Files are processed in parallel with [rayon](https://docs.rs/rayon).

use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("input directory not found: {0}")]
    InputNotFound(PathBuf),
}

/// Settings for one compression run.
#[derive(Debug, Clone)]
pub struct CompressConfig {
    /// JPEG re-encode quality (1-100).
    pub quality: u8,
    /// Bounding box: larger sources are shrunk to fit, smaller ones are
    /// re-encoded at their original size.
    pub max_width: u32,
    pub max_height: u32,
    /// Write a lossless WebP sibling next to each output.
    pub webp_siblings: bool,
    /// Overwrite source files in place instead of mirroring into the
    /// output directory.
    pub replace: bool,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            quality: 85,
            max_width: 1920,
            max_height: 1080,
            webp_siblings: true,
            replace: false,
        }
    }
}

/// Outcome for one successfully processed file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    /// Source path relative to the input root.
    pub path: PathBuf,
    pub original_bytes: u64,
    pub compressed_bytes: u64,
    /// Size of the WebP sibling, when one was written.
    pub webp_bytes: Option<u64>,
}

impl FileOutcome {
    /// Percentage saved relative to the original. Negative if it grew.
    pub fn savings_percent(&self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        (self.original_bytes as f64 - self.compressed_bytes as f64) * 100.0
            / self.original_bytes as f64
    }
}

/// A per-file failure that did not abort the run.
#[derive(Debug, Clone)]
pub struct FileFailure {
    /// Source path relative to the input root.
    pub path: PathBuf,
    pub reason: String,
}

/// Aggregate result of a compression run.
#[derive(Debug, Default)]
pub struct CompressReport {
    pub outcomes: Vec<FileOutcome>,
    pub failures: Vec<FileFailure>,
}

impl CompressReport {
    pub fn total_original(&self) -> u64 {
        self.outcomes.iter().map(|o| o.original_bytes).sum()
    }

    pub fn total_compressed(&self) -> u64 {
        self.outcomes.iter().map(|o| o.compressed_bytes).sum()
    }

    pub fn total_savings_percent(&self) -> f64 {
        let original = self.total_original();
        if original == 0 {
            return 0.0;
        }
        (original as f64 - self.total_compressed() as f64) * 100.0 / original as f64
    }
}

/// Output dimensions that fit inside the box without enlargement.
///
/// Returns the source unchanged when it already fits; otherwise scales both
/// edges by the same factor so the result touches the box on the tighter
/// axis. Never returns a zero dimension.
pub(crate) fn calculate_fit_dimensions(source: (u32, u32), max: (u32, u32)) -> (u32, u32) {
    let (width, height) = source;
    let (max_width, max_height) = max;

    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let scale = (max_width as f64 / width as f64).min(max_height as f64 / height as f64);
    let out_w = ((width as f64 * scale).round() as u32).max(1);
    let out_h = ((height as f64 * scale).round() as u32).max(1);
    (out_w, out_h)
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
}

/// Compress every JPEG under `input`.
///
/// Mirrors the tree into `output` unless `config.replace` is set (then
/// `output` is ignored and sources are overwritten). Per-file failures are
/// collected in the report and logged, not propagated.
pub fn compress_dir(
    input: &Path,
    output: &Path,
    config: &CompressConfig,
) -> Result<CompressReport, CompressError> {
    if !input.is_dir() {
        return Err(CompressError::InputNotFound(input.to_path_buf()));
    }
    if !config.replace {
        std::fs::create_dir_all(output)?;
    }

    let mut sources = Vec::new();
    for entry in WalkDir::new(input) {
        let entry = entry.map_err(|e| CompressError::Io(e.into()))?;
        if entry.file_type().is_file() && is_jpeg(entry.path()) {
            sources.push(entry.path().to_path_buf());
        }
    }
    sources.sort();

    let results: Vec<Result<FileOutcome, FileFailure>> = sources
        .par_iter()
        .map(|source| compress_file(source, input, output, config))
        .collect();

    let mut report = CompressReport::default();
    for result in results {
        match result {
            Ok(outcome) => report.outcomes.push(outcome),
            Err(failure) => {
                warn!(path = %failure.path.display(), reason = %failure.reason, "skipping file");
                report.failures.push(failure);
            }
        }
    }
    Ok(report)
}

fn compress_file(
    source: &Path,
    input_root: &Path,
    output_root: &Path,
    config: &CompressConfig,
) -> Result<FileOutcome, FileFailure> {
    let relative = source
        .strip_prefix(input_root)
        .unwrap_or(source)
        .to_path_buf();
    let fail = |reason: String| FileFailure {
        path: relative.clone(),
        reason,
    };

    let original_bytes = std::fs::metadata(source)
        .map_err(|e| fail(format!("stat: {e}")))?
        .len();
    let decoded = image::open(source).map_err(|e| fail(format!("decode: {e}")))?;

    let (width, height) = (decoded.width(), decoded.height());
    let (out_w, out_h) =
        calculate_fit_dimensions((width, height), (config.max_width, config.max_height));
    let resized = if (out_w, out_h) == (width, height) {
        decoded
    } else {
        decoded.resize_exact(out_w, out_h, FilterType::Lanczos3)
    };
    let rgb = resized.to_rgb8();

    let destination = if config.replace {
        source.to_path_buf()
    } else {
        let destination = output_root.join(&relative);
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).map_err(|e| fail(format!("mkdir: {e}")))?;
        }
        destination
    };

    // Encode fully in memory, then temp-write + rename: the destination is
    // either intact or complete, never truncated.
    let mut encoded = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut encoded, config.quality))
        .map_err(|e| fail(format!("jpeg encode: {e}")))?;

    let file_name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = destination.with_file_name(format!("{file_name}.tmp"));
    std::fs::write(&tmp, &encoded).map_err(|e| fail(format!("write: {e}")))?;
    std::fs::rename(&tmp, &destination).map_err(|e| fail(format!("rename: {e}")))?;

    let webp_bytes = if config.webp_siblings {
        let mut sibling = Vec::new();
        WebPEncoder::new_lossless(&mut sibling)
            .encode(rgb.as_raw(), out_w, out_h, image::ExtendedColorType::Rgb8)
            .map_err(|e| fail(format!("webp encode: {e}")))?;
        let webp_path = destination.with_extension("webp");
        std::fs::write(&webp_path, &sibling).map_err(|e| fail(format!("webp write: {e}")))?;
        Some(sibling.len() as u64)
    } else {
        None
    };

    Ok(FileOutcome {
        path: relative,
        original_bytes,
        compressed_bytes: encoded.len() as u64,
        webp_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Fit calculation (pure, no pixels involved)
    // =========================================================================

    #[test]
    fn fit_leaves_smaller_sources_untouched() {
        assert_eq!(calculate_fit_dimensions((800, 600), (1920, 1080)), (800, 600));
        assert_eq!(calculate_fit_dimensions((1920, 1080), (1920, 1080)), (1920, 1080));
    }

    #[test]
    fn fit_bounds_landscape_by_width() {
        assert_eq!(calculate_fit_dimensions((3840, 2160), (1920, 1080)), (1920, 1080));
        assert_eq!(calculate_fit_dimensions((4000, 1000), (1920, 1080)), (1920, 480));
    }

    #[test]
    fn fit_bounds_portrait_by_height() {
        assert_eq!(calculate_fit_dimensions((2000, 3000), (1920, 1080)), (720, 1080));
    }

    #[test]
    fn fit_never_returns_zero() {
        assert_eq!(calculate_fit_dimensions((10_000, 1), (100, 100)), (100, 1));
    }

    #[test]
    fn jpeg_detection_is_case_insensitive() {
        assert!(is_jpeg(Path::new("a.jpg")));
        assert!(is_jpeg(Path::new("a.JPEG")));
        assert!(!is_jpeg(Path::new("a.png")));
        assert!(!is_jpeg(Path::new("a")));
    }

    // =========================================================================
    // Config and report arithmetic
    // =========================================================================

    #[test]
    fn config_defaults_match_site_settings() {
        let config = CompressConfig::default();
        assert_eq!(config.quality, 85);
        assert_eq!(config.max_width, 1920);
        assert_eq!(config.max_height, 1080);
        assert!(config.webp_siblings);
        assert!(!config.replace);
    }

    #[test]
    fn savings_math() {
        let outcome = FileOutcome {
            path: "a.jpg".into(),
            original_bytes: 1000,
            compressed_bytes: 250,
            webp_bytes: None,
        };
        assert!((outcome.savings_percent() - 75.0).abs() < f64::EPSILON);

        let report = CompressReport {
            outcomes: vec![
                outcome,
                FileOutcome {
                    path: "b.jpg".into(),
                    original_bytes: 1000,
                    compressed_bytes: 750,
                    webp_bytes: None,
                },
            ],
            failures: Vec::new(),
        };
        assert_eq!(report.total_original(), 2000);
        assert_eq!(report.total_compressed(), 1000);
        assert!((report.total_savings_percent() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_report_savings_is_zero() {
        assert_eq!(CompressReport::default().total_savings_percent(), 0.0);
    }

    #[test]
    fn missing_input_directory_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let result = compress_dir(
            &tmp.path().join("nope"),
            &tmp.path().join("out"),
            &CompressConfig::default(),
        );
        assert!(matches!(result, Err(CompressError::InputNotFound(_))));
    }

    #[test]
    fn single_file_end_to_end() {
        let tmp = tempfile::TempDir::new().unwrap();
        crate::test_helpers::write_jpeg(&tmp.path().join("in/photo.jpg"), 80, 40);

        let config = CompressConfig {
            max_width: 40,
            max_height: 40,
            ..CompressConfig::default()
        };
        let report = compress_dir(&tmp.path().join("in"), &tmp.path().join("out"), &config).unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(
            image::image_dimensions(tmp.path().join("out/photo.jpg")).unwrap(),
            (40, 20)
        );
        assert!(tmp.path().join("out/photo.webp").exists());
    }
}
