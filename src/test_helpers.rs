//! Shared test utilities for the lazy-gal test suite.
//!
//! Fixture writers used by the inline module tests. Integration tests under
//! `tests/` carry their own copies, since they are separate crates and cannot
//! reach `pub(crate)` items.

use std::path::Path;

/// Write a real, decodable JPEG of the given size (flat tone).
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([180, 120, 90]));
    img.save(path).unwrap();
}

/// Write arbitrary bytes, creating parent directories. For docroot fixtures
/// whose content never gets decoded.
pub fn write_raw(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, bytes).unwrap();
}
