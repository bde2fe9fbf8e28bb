//! Configuration module.
//!
//! Handles loading, validating, and merging an optional `--config` TOML file.
//! The file supplies defaults for renditions planned from a crop manifest
//! (see [`plan`](crate::plan)); renditions given as `-f` spec strings carry
//! all their own parameters and ignore it.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [defaults]
//! method = "thumbnail"   # Resize method name or numeric code
//! blur = 1.0             # Blur factor (>1 softer, <1 sharper)
//! quality = 80           # Encoding quality (0-100)
//! progressive = false    # Progressive (line-interlaced) output
//!
//! [[sets]]               # Optional, repeatable; one rendition per set
//! quality = 60           # Omitted fields come from [defaults]
//!
//! [output]
//! extension = ""         # Output extension; empty = same as the source image
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use crate::imaging::{Quality, ResizeMethod, SUPPORTED_OUTPUT_EXTENSIONS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from the `--config` file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenditionConfig {
    /// Parameters for planned renditions.
    pub defaults: DefaultsConfig,
    /// Parameter sets to compare. Each planned crop gets one rendition per
    /// set; with no sets, `defaults` is the only one.
    pub sets: Vec<SetConfig>,
    /// Output naming for planned renditions.
    pub output: OutputConfig,
}

/// Rendition parameters applied to every planned rendition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Resize method, by name (`"lanczos"`) or numeric code (`"15"`).
    pub method: String,
    /// Blur factor for filtered resizes.
    pub blur: f64,
    /// Encoding quality (0 = worst, 100 = best).
    pub quality: u32,
    /// Write progressive (line-interlaced) output.
    pub progressive: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            method: "thumbnail".to_string(),
            blur: 1.0,
            quality: 80,
            progressive: false,
        }
    }
}

impl DefaultsConfig {
    fn resolve(&self, table: &str) -> Result<ParameterSet, ConfigError> {
        let method = self
            .method
            .parse()
            .map_err(|e| ConfigError::Validation(format!("{table}.method: {e}")))?;
        if !self.blur.is_finite() || self.blur < 0.0 {
            return Err(ConfigError::Validation(format!(
                "{table}.blur must be a non-negative number"
            )));
        }
        if self.quality > 100 {
            return Err(ConfigError::Validation(format!(
                "{table}.quality must be 0-100"
            )));
        }
        Ok(ParameterSet {
            method,
            blur: self.blur,
            quality: Quality::new(self.quality),
            progressive: self.progressive,
        })
    }
}

/// One `[[sets]]` entry. Omitted fields fall back to `[defaults]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SetConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progressive: Option<bool>,
}

impl SetConfig {
    fn over(&self, defaults: &DefaultsConfig) -> DefaultsConfig {
        DefaultsConfig {
            method: self.method.clone().unwrap_or_else(|| defaults.method.clone()),
            blur: self.blur.unwrap_or(defaults.blur),
            quality: self.quality.unwrap_or(defaults.quality),
            progressive: self.progressive.unwrap_or(defaults.progressive),
        }
    }
}

/// Validated rendition parameters for one set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSet {
    pub method: ResizeMethod,
    pub blur: f64,
    pub quality: Quality,
    pub progressive: bool,
}

/// Output naming settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// File extension for planned renditions, without the dot.
    /// Empty means "use the source image's extension".
    pub extension: String,
}

impl RenditionConfig {
    /// Parameter sets for planned renditions, in config order.
    pub fn parameter_sets(&self) -> Result<Vec<ParameterSet>, ConfigError> {
        let defaults = self.defaults.resolve("defaults")?;
        if self.sets.is_empty() {
            return Ok(vec![defaults]);
        }
        self.sets
            .iter()
            .enumerate()
            .map(|(i, set)| set.over(&self.defaults).resolve(&format!("sets[{i}]")))
            .collect()
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parameter_sets()?;
        let ext = self.output.extension.to_lowercase();
        if !ext.is_empty() && !SUPPORTED_OUTPUT_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ConfigError::Validation(format!(
                "output.extension '{}' is not one of: {}",
                self.output.extension,
                SUPPORTED_OUTPUT_EXTENSIONS.join(", ")
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(RenditionConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                let merged = match table.remove(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => value,
                };
                table.insert(key, merged);
            }
            toml::Value::Table(table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<RenditionConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: RenditionConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load a config file, layering its values over the stock defaults.
pub fn load_config(path: &Path) -> Result<RenditionConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let overlay: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(overlay))
}

/// Returns a fully-commented stock config file.
///
/// Printed by `--gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# renditions configuration
# ========================
# All options are optional. Values shown are the defaults.
# Used for renditions planned with --renditions; -f specs carry their own
# parameters.

[defaults]
# Resize method: a name or its numeric code.
#   0 thumbnail   1 scale      2 sample
#   3 point       4 box        5 triangle   6 hermite    7 hanning
#   8 hamming     9 blackman  10 gaussian  11 quadratic 12 cubic
#  13 catrom     14 mitchell  15 lanczos   16 bessel    17 sinc
method = "thumbnail"

# Blur factor for filtered methods (3-17). Above 1 softens, below 1 sharpens.
blur = 1.0

# Encoding quality, 0-100.
quality = 80

# Write progressive (line-interlaced) JPEG.
progressive = false

# Parameter sets to compare side by side. Each [[sets]] table plans one
# rendition per cropped manifest entry; fields left out come from
# [defaults]. With no sets, [defaults] is used alone.
#
# [[sets]]
# quality = 60
#
# [[sets]]
# method = "lanczos"
# blur = 0.8
# progressive = true

[output]
# Extension for planned renditions (jpg, png, tif, webp, avif).
# Empty means the source image's extension.
extension = ""
"##
}
