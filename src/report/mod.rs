//! Reporting for batch runs
//!
//! Status lines go to stdout for the operator. The optional JSON report is
//! the serialized `BatchSummary`, written atomically.

use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::batch::BatchOutcome;
use crate::error::{Error, Result};
use crate::utils;

pub mod formatter;

pub use formatter::ReportFormatter;

pub const NO_INPUTS: &str = "No PDF documents found.";

/// Writes the console report for `outcome` to `out`.
pub fn print_outcome<W: Write>(out: &mut W, outcome: &BatchOutcome) -> Result<()> {
    match outcome {
        BatchOutcome::NoInputs => writeln!(out, "{}", NO_INPUTS)?,
        BatchOutcome::Completed { outcomes, summary } => {
            for document in outcomes {
                writeln!(out, "{}", ReportFormatter::status_line(document))?;
            }
            writeln!(out)?;
            writeln!(out, "{}", ReportFormatter::summary_line(summary))?;
        }
    }
    Ok(())
}

/// Writes the JSON summary to `path`. Nothing is written for an empty run.
pub fn write_report(path: &Path, outcome: &BatchOutcome) -> Result<()> {
    let BatchOutcome::Completed { summary, .. } = outcome else {
        return Ok(());
    };

    let json = ReportFormatter::to_json(summary)?;
    utils::write_atomic(path, json.as_bytes())
        .map_err(|e| Error::Report(format!("{}: {}", path.display(), e)))?;
    info!(path = %path.display(), "report written");
    Ok(())
}
