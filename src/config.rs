use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Catalog, CatalogError, RequirementSpec};
use crate::extract::{Backend, ExtractionOptions};
use crate::report::AnalysisOptions;
use crate::score::EvidencePolicy;
use crate::segment::SegmentationStrategy;

pub const DEFAULT_CONFIG_PATH: &str = "checklist.yaml";
pub const DEFAULT_INPUT_GLOB: &str = "./input/**/*.pdf";
pub const DEFAULT_OUTPUT_DIR: &str = "./output";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_input")]
    pub input: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub strategy: SegmentationStrategy,
    #[serde(default)]
    pub evidence_policy: EvidencePolicy,
    #[serde(default = "default_max_evidence_pages")]
    pub max_evidence_pages: usize,
    #[serde(default = "Backend::default_rank")]
    pub backends: Vec<Backend>,
    #[serde(default = "default_ocr_lang")]
    pub ocr_lang: String,
    #[serde(default = "default_ocr_dpi")]
    pub ocr_dpi: u32,
    #[serde(default = "default_true")]
    pub per_doc_dir: bool,
    /// Replaces the built-in catalog when present.
    #[serde(default)]
    pub requirements: Option<Vec<RequirementSpec>>,
}

fn default_input() -> String {
    DEFAULT_INPUT_GLOB.to_string()
}
fn default_output_dir() -> String {
    DEFAULT_OUTPUT_DIR.to_string()
}
fn default_max_evidence_pages() -> usize {
    3
}
fn default_ocr_lang() -> String {
    "ind".to_string()
}
fn default_ocr_dpi() -> u32 {
    300
}
fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input: default_input(),
            output_dir: default_output_dir(),
            strategy: SegmentationStrategy::default(),
            evidence_policy: EvidencePolicy::default(),
            max_evidence_pages: default_max_evidence_pages(),
            backends: Backend::default_rank(),
            ocr_lang: default_ocr_lang(),
            ocr_dpi: default_ocr_dpi(),
            per_doc_dir: true,
            requirements: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },
    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Load the YAML config. A missing file at the default path means defaults;
/// a missing file that was asked for explicitly is an error.
pub fn load_config(path: &Path, explicit: bool) -> Result<Config, ConfigError> {
    if !path.exists() && !explicit {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Read { path: path.display().to_string(), message: e.to_string() })?;
    parse_config(&raw).map_err(|e| match e {
        ConfigError::Parse { message, .. } => ConfigError::Parse { path: path.display().to_string(), message },
        other => other,
    })
}

pub fn parse_config(raw: &str) -> Result<Config, ConfigError> {
    // an empty document deserializes to unit, not a mapping
    if raw.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config =
        serde_yaml::from_str(raw).map_err(|e| ConfigError::Parse { path: "<inline>".into(), message: e.to_string() })?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.trim().is_empty() {
            return Err(ConfigError::Invalid("input is empty".into()));
        }
        if self.output_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("output_dir is empty".into()));
        }
        if self.max_evidence_pages == 0 {
            return Err(ConfigError::Invalid("max_evidence_pages must be at least 1".into()));
        }
        if self.backends.is_empty() {
            return Err(ConfigError::Invalid("backends is empty".into()));
        }
        Ok(())
    }

    /// Compile the configured catalog, or the built-in one.
    pub fn catalog(&self) -> Result<Catalog, ConfigError> {
        let catalog = match &self.requirements {
            Some(specs) => Catalog::from_specs(specs)?,
            None => Catalog::builtin()?,
        };
        Ok(catalog)
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions { strategy: self.strategy, evidence_policy: self.evidence_policy }
    }

    pub fn extraction_options(&self) -> ExtractionOptions {
        ExtractionOptions { rank: self.backends.clone(), ocr_lang: self.ocr_lang.clone(), ocr_dpi: self.ocr_dpi }
    }
}
