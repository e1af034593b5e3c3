//! Gallery configuration (`photos.toml`).
//!
//! Handles loading, merging, and validating the optional `photos.toml` at
//! the photo root. Stock defaults are the base layer; a user file overrides
//! only the keys it names. Unknown keys are rejected to catch typos early.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [discovery]
//! ceiling = 50               # Probe ceiling for categories without an override
//!
//! # Per-category discovery roots. Categories listed here are what the
//! # `discover` command probes; the ceiling override exists for small sets
//! # (a venue gallery rarely has more than a couple dozen photos).
//! #
//! # [discovery.categories.venue]
//! # prefix = "/photos/venue"
//! # ceiling = 20
//!
//! [compression]
//! quality = 85               # JPEG re-encode quality (1-100)
//! max_width = 1920           # Bounding box for the compressor
//! max_height = 1080
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file within the photo root.
const CONFIG_FILENAME: &str = "photos.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("config validation error: {0}")]
    Validation(String),
}

/// Gallery configuration loaded from `photos.toml`.
///
/// All fields have defaults; user files are sparse overrides. Unknown keys
/// are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Discovery probing settings.
    pub discovery: DiscoveryConfig,
    /// Batch compressor settings.
    pub compression: CompressionConfig,
}

impl GalleryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discovery.ceiling == 0 {
            return Err(ConfigError::Validation(
                "discovery.ceiling must be at least 1".into(),
            ));
        }
        for (name, category) in &self.discovery.categories {
            if category.prefix.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "discovery.categories.{name}.prefix must not be empty"
                )));
            }
            if category.ceiling == Some(0) {
                return Err(ConfigError::Validation(format!(
                    "discovery.categories.{name}.ceiling must be at least 1"
                )));
            }
        }
        if self.compression.quality == 0 || self.compression.quality > 100 {
            return Err(ConfigError::Validation(
                "compression.quality must be 1-100".into(),
            ));
        }
        if self.compression.max_width == 0 || self.compression.max_height == 0 {
            return Err(ConfigError::Validation(
                "compression.max_width and max_height must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Effective probe ceiling for a named category.
    pub fn ceiling_for(&self, category: &str) -> u32 {
        self.discovery
            .categories
            .get(category)
            .and_then(|c| c.ceiling)
            .unwrap_or(self.discovery.ceiling)
    }
}

/// Discovery probing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Probe ceiling for categories without their own override.
    pub ceiling: u32,
    /// Per-category discovery roots, keyed by category name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub categories: BTreeMap<String, CategoryConfig>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            ceiling: crate::discover::DEFAULT_CEILING,
            categories: BTreeMap::new(),
        }
    }
}

/// One configured discovery category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryConfig {
    /// URL-style prefix probed for this category, e.g. `/photos/venue`.
    pub prefix: String,
    /// Override of the global ceiling for this category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ceiling: Option<u32>,
}

/// Batch compressor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionConfig {
    /// JPEG re-encode quality (1-100).
    pub quality: u8,
    /// Bounding box the compressor shrinks photos into.
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            quality: 85,
            max_width: 1920,
            max_height: 1080,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// The canonical representation of all defaults, used as the base layer for
/// merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(GalleryConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_value) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_value) => merge_toml(base_value, overlay_value),
                    None => overlay_value,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `photos.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `photos.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<GalleryConfig, ConfigError> {
    let merged = match overlay {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: GalleryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `photos.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys, and
/// validates the result. A missing file yields the stock defaults.
pub fn load_config(root: &Path) -> Result<GalleryConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) {
        fs::write(dir.join(CONFIG_FILENAME), content).unwrap();
    }

    #[test]
    fn defaults_are_valid() {
        let config = GalleryConfig::default();
        config.validate().unwrap();
        assert_eq!(config.discovery.ceiling, 50);
        assert_eq!(config.compression.quality, 85);
        assert_eq!(config.compression.max_width, 1920);
        assert_eq!(config.compression.max_height, 1080);
        assert!(config.discovery.categories.is_empty());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.discovery.ceiling, 50);
    }

    #[test]
    fn sparse_overlay_preserves_unrelated_defaults() {
        let tmp = TempDir::new().unwrap();
        write_config(
            tmp.path(),
            r#"
            [compression]
            quality = 70
            "#,
        );

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.compression.quality, 70);
        assert_eq!(config.compression.max_width, 1920);
        assert_eq!(config.discovery.ceiling, 50);
    }

    #[test]
    fn categories_with_ceiling_override() {
        let tmp = TempDir::new().unwrap();
        write_config(
            tmp.path(),
            r#"
            [discovery.categories.venue]
            prefix = "/photos/venue"
            ceiling = 20

            [discovery.categories.ceremony]
            prefix = "/photos/ceremony"
            "#,
        );

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.ceiling_for("venue"), 20);
        assert_eq!(config.ceiling_for("ceremony"), 50);
        assert_eq!(config.ceiling_for("unknown"), 50);
        assert_eq!(
            config.discovery.categories["venue"].prefix,
            "/photos/venue"
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let tmp = TempDir::new().unwrap();
        write_config(
            tmp.path(),
            r#"
            [discovery]
            celing = 50
            "#,
        );

        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "not [valid");
        assert!(load_config(tmp.path()).is_err());
    }

    #[test]
    fn zero_ceiling_fails_validation() {
        let tmp = TempDir::new().unwrap();
        write_config(
            tmp.path(),
            r#"
            [discovery]
            ceiling = 0
            "#,
        );

        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn out_of_range_quality_fails_validation() {
        let config = GalleryConfig {
            compression: CompressionConfig {
                quality: 0,
                ..CompressionConfig::default()
            },
            ..GalleryConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_category_prefix_fails_validation() {
        let mut config = GalleryConfig::default();
        config.discovery.categories.insert(
            "venue".to_string(),
            CategoryConfig {
                prefix: String::new(),
                ceiling: None,
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn merge_preserves_base_keys_not_in_overlay() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str("[compression]\nquality = 60").unwrap();
        let merged = merge_toml(base, overlay);

        let table = merged.as_table().unwrap();
        let compression = table["compression"].as_table().unwrap();
        assert_eq!(compression["quality"].as_integer(), Some(60));
        assert_eq!(compression["max_width"].as_integer(), Some(1920));
        assert!(table.contains_key("discovery"));
    }
}
