//! Rendition planning from crop metadata.
//!
//! An asset store describes the renditions it wants for an image as a JSON
//! object keyed by rendition name:
//!
//! ```json
//! {
//!   "jcr:primaryType": "nt:unstructured",
//!   "hero": {
//!     "nym:shouldCrop": true,
//!     "nym:cropX": 0, "nym:cropY": 311,
//!     "nym:cropWidth": 2592, "nym:cropHeight": 1728,
//!     "nym:width": 300, "nym:height": 200
//!   }
//! }
//! ```
//!
//! Every object entry with `nym:shouldCrop: true` and the six geometry fields
//! becomes one job per configured parameter set, its spec combining that
//! geometry with the set. Anything else is skipped. Jobs come out smallest
//! target first, sets in config order within an entry, named
//! `<out-dir>/<spec>.<ext>`.

use crate::config::RenditionConfig;
use crate::imaging::CropRect;
use crate::process::Job;
use crate::spec::RenditionSpec;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("rendition manifest must be a JSON object")]
    NotAnObject,
}

/// Extension used when neither the config nor the source path supplies one.
const FALLBACK_EXTENSION: &str = "jpg";

/// Crop geometry for one named rendition.
#[derive(Debug, Clone, Deserialize)]
pub struct CropMetadata {
    #[serde(rename = "nym:shouldCrop")]
    pub should_crop: bool,
    #[serde(rename = "nym:cropX")]
    pub crop_x: u32,
    #[serde(rename = "nym:cropY")]
    pub crop_y: u32,
    #[serde(rename = "nym:cropWidth")]
    pub crop_width: u32,
    #[serde(rename = "nym:cropHeight")]
    pub crop_height: u32,
    #[serde(rename = "nym:width")]
    pub width: u32,
    #[serde(rename = "nym:height")]
    pub height: u32,
}

/// A planned rendition: its manifest name, spec, and output path.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRendition {
    pub name: String,
    pub spec: RenditionSpec,
    pub output: PathBuf,
}

impl PlannedRendition {
    pub fn to_job(&self) -> Job {
        Job {
            spec: self.spec.to_string(),
            output: self.output.clone(),
        }
    }
}

/// Output extension: configured one, else the source's, else `jpg`.
pub fn output_extension(config: &RenditionConfig, source: &Path) -> String {
    if !config.output.extension.is_empty() {
        return config.output.extension.to_lowercase();
    }
    source
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

/// Plan renditions from a manifest document.
pub fn plan_renditions(
    manifest_json: &str,
    config: &RenditionConfig,
    out_dir: &Path,
    extension: &str,
) -> Result<Vec<PlannedRendition>, PlanError> {
    let document: serde_json::Value = serde_json::from_str(manifest_json)?;
    let entries = document.as_object().ok_or(PlanError::NotAnObject)?;
    let sets = config.parameter_sets()?;

    let mut planned: Vec<PlannedRendition> = entries
        .iter()
        .filter(|(_, value)| value.is_object())
        .filter_map(|(name, value)| {
            match CropMetadata::deserialize(value) {
                Ok(meta) if meta.should_crop => Some((name, meta)),
                Ok(_) => None,
                Err(e) => {
                    debug!(rendition = %name, error = %e, "skipping entry without crop geometry");
                    None
                }
            }
        })
        .flat_map(|(name, meta)| {
            sets.iter().map(move |set| {
                let spec = RenditionSpec {
                    crop: CropRect {
                        x: meta.crop_x,
                        y: meta.crop_y,
                        width: meta.crop_width,
                        height: meta.crop_height,
                    },
                    width: meta.width,
                    height: meta.height,
                    method: set.method,
                    blur: set.blur,
                    quality: set.quality,
                    progressive: set.progressive,
                };
                let output = out_dir.join(format!("{spec}.{extension}"));
                PlannedRendition {
                    name: name.clone(),
                    spec,
                    output,
                }
            })
        })
        .collect();

    // Stable: sets keep config order within an entry
    planned.sort_by(|a, b| {
        let area = |p: &PlannedRendition| u64::from(p.spec.width) * u64::from(p.spec.height);
        area(a).cmp(&area(b)).then_with(|| a.name.cmp(&b.name))
    });
    // Identical sets would write the same file twice
    planned.dedup_by(|a, b| a.output == b.output);
    Ok(planned)
}

/// Read a manifest file and turn it into jobs for `source`.
pub fn load_plan(
    manifest_path: &Path,
    config: &RenditionConfig,
    source: &Path,
    out_dir: &Path,
) -> Result<Vec<Job>, PlanError> {
    let content = std::fs::read_to_string(manifest_path)?;
    let extension = output_extension(config, source);
    let planned = plan_renditions(&content, config, out_dir, &extension)?;
    debug!(
        manifest = %manifest_path.display(),
        count = planned.len(),
        "planned renditions"
    );
    Ok(planned.iter().map(PlannedRendition::to_job).collect())
}
