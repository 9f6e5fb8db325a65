//! Console and JSON rendering of batch results

use std::path::Path;

use crate::batch::{BatchSummary, DocumentOutcome};
use crate::error::{Error, Result};
use crate::types::Verification;

/// Formats batch results for the console and for report files
pub struct ReportFormatter;

impl ReportFormatter {
    /// One status line per document.
    pub fn status_line(outcome: &DocumentOutcome) -> String {
        match outcome {
            DocumentOutcome::Completed(result) => match result.verification {
                Verification::Clean => format!(
                    "[OK] {} -> {} (redactions: {})",
                    file_name(&result.source),
                    file_name(&result.destination),
                    result.redactions
                ),
                Verification::Residual => format!(
                    "[ATENÇÃO] Possible remaining identifiers in {} (redactions: {})",
                    result.destination.display(),
                    result.redactions
                ),
                Verification::Skipped => format!(
                    "[DRY-RUN] {} (planned redactions: {})",
                    file_name(&result.source),
                    result.redactions
                ),
            },
            DocumentOutcome::Failed { source, error } => {
                format!("[ERRO] {}: {}", source.display(), error)
            }
        }
    }

    pub fn summary_line(summary: &BatchSummary) -> String {
        format!(
            "Done. Documents processed: {}. Redactions applied: {}.",
            summary.processed, summary.total_redactions
        )
    }

    pub fn to_json(summary: &BatchSummary) -> Result<String> {
        serde_json::to_string_pretty(summary).map_err(|e| Error::Report(e.to_string()))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
