use std::path::PathBuf;

use serde::Serialize;

/// Outcome of re-scanning a saved document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verification {
    /// No identifier survived redaction.
    Clean,
    /// At least one identifier is still detectable; needs manual review.
    Residual,
    /// Verification did not run (dry run).
    Skipped,
}

/// Per-document result of a completed pipeline run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedactionResult {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub redactions: usize,
    pub verification: Verification,
}

impl RedactionResult {
    pub fn has_residual_matches(&self) -> bool {
        self.verification == Verification::Residual
    }
}
