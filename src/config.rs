//! Configuration types and validation for a redaction run

use std::{fs, path::Path};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::Color;

/// How the verifier decides that a leftover match is worth a warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationMode {
    /// Any textual match on the page is residual
    FullText,
    /// Ignore matches that sit entirely inside the protected label band
    ZoneAware,
}

/// Settings shared read-only by every document in a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RedactionConfig {
    /// Text marking the protected region; matched exactly
    pub label: String,
    /// Safety margin above the label cutoff, in page units
    pub margin: f64,
    /// Fraction of each box height trimmed from its top edge
    pub shrink_ratio: f64,
    pub fill: Color,
    /// File-name glob for input discovery
    pub glob: String,
    pub recursive: bool,
    /// Worker count; `None` means one per CPU
    pub jobs: Option<usize>,
    pub verification: VerificationMode,
    pub dry_run: bool,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            label: "ID Único".to_string(),
            margin: 20.0,
            shrink_ratio: 0.1,
            fill: Color::BLACK,
            glob: "*.pdf".to_string(),
            recursive: true,
            jobs: None,
            verification: VerificationMode::FullText,
            dry_run: false,
        }
    }
}

impl RedactionConfig {
    /// Reads a config file, trying JSON first and then YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;

        let config: RedactionConfig = match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(json_err) => serde_yaml::from_str(&content).map_err(|yaml_err| {
                Error::Config(format!(
                    "{} is neither valid JSON ({}) nor YAML ({})",
                    path.display(),
                    json_err,
                    yaml_err
                ))
            })?,
        };

        debug!(path = %path.display(), "configuration loaded");
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(Error::Config("label must not be empty".into()));
        }
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(Error::Config("margin must be a non-negative number".into()));
        }
        if !(0.0..1.0).contains(&self.shrink_ratio) {
            return Err(Error::Config("shrink_ratio must be in [0, 1)".into()));
        }
        if !self.fill.is_valid() {
            return Err(Error::Config("fill components must be in [0, 1]".into()));
        }
        if self.glob.is_empty() {
            return Err(Error::Config("glob must not be empty".into()));
        }
        if self.jobs == Some(0) {
            return Err(Error::Config("jobs must be at least 1".into()));
        }
        Ok(())
    }
}
