//! Batch orchestration over a directory of documents
//!
//! Documents are independent: each one runs through its own pipeline on a
//! bounded rayon pool. Results are gathered in input order so that console
//! output and reports do not depend on scheduling.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use chrono::Utc;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::analyzer::PatternCatalog;
use crate::config::RedactionConfig;
use crate::error::{DocumentError, Error, Result, Stage};
use crate::pipeline::DocumentPipeline;
use crate::types::RedactionResult;

pub mod discovery;

pub use discovery::{discover, glob_to_regex, DocumentJob};

/// Per-document outcome, in input order
#[derive(Debug)]
pub enum DocumentOutcome {
    Completed(RedactionResult),
    Failed { source: PathBuf, error: DocumentError },
}

/// A document that could not be processed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentFailure {
    pub source: PathBuf,
    pub stage: Option<Stage>,
    pub message: String,
}

/// Aggregate over one run
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub generated_at: String,
    pub dry_run: bool,
    /// Documents that completed, with or without residual warnings
    pub processed: usize,
    pub total_redactions: usize,
    pub residual_warnings: usize,
    pub results: Vec<RedactionResult>,
    pub failures: Vec<DocumentFailure>,
}

impl BatchSummary {
    fn from_outcomes(outcomes: &[DocumentOutcome], dry_run: bool) -> Self {
        let mut results = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                DocumentOutcome::Completed(result) => results.push(result.clone()),
                DocumentOutcome::Failed { source, error } => failures.push(DocumentFailure {
                    source: source.clone(),
                    stage: error.stage(),
                    message: error.to_string(),
                }),
            }
        }

        Self {
            generated_at: Utc::now().to_rfc3339(),
            dry_run,
            processed: results.len(),
            total_redactions: results.iter().map(|r| r.redactions).sum(),
            residual_warnings: results.iter().filter(|r| r.has_residual_matches()).count(),
            results,
            failures,
        }
    }
}

/// What a batch run produced
#[derive(Debug)]
pub enum BatchOutcome {
    /// The glob selected no documents.
    NoInputs,
    Completed {
        outcomes: Vec<DocumentOutcome>,
        summary: BatchSummary,
    },
}

/// Runs the pipeline over every selected document
pub struct BatchRunner<'a> {
    catalog: &'a PatternCatalog,
    config: &'a RedactionConfig,
}

impl<'a> BatchRunner<'a> {
    pub fn new(catalog: &'a PatternCatalog, config: &'a RedactionConfig) -> Self {
        Self { catalog, config }
    }

    /// Worker count used for the pool.
    pub fn jobs(&self) -> usize {
        self.config.jobs.unwrap_or_else(num_cpus::get).max(1)
    }

    #[instrument(skip_all, fields(input = %input.display(), output = %output.display()))]
    pub fn run(&self, input: &Path, output: &Path) -> Result<BatchOutcome> {
        let jobs = discover(input, output, &self.config.glob, self.config.recursive)?;
        if jobs.is_empty() {
            info!("no documents selected");
            return Ok(BatchOutcome::NoInputs);
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.jobs())
            .thread_name(|i| format!("idmask-worker-{}", i))
            .build()
            .map_err(|e| Error::WorkerPool(e.to_string()))?;

        info!(documents = jobs.len(), workers = pool.current_num_threads(), "starting batch");
        let pipeline = DocumentPipeline::new(self.catalog, self.config);
        let outcomes: Vec<DocumentOutcome> = pool.install(|| {
            jobs.par_iter()
                .map(|job| match guarded(|| pipeline.process(&job.source, &job.destination)) {
                    Ok(result) => {
                        if result.has_residual_matches() {
                            warn!(source = %job.source.display(), "residual identifiers after redaction");
                        }
                        DocumentOutcome::Completed(result)
                    }
                    Err(error) => {
                        error!(source = %job.source.display(), %error, "document failed");
                        DocumentOutcome::Failed {
                            source: job.source.clone(),
                            error,
                        }
                    }
                })
                .collect()
        });

        let summary = BatchSummary::from_outcomes(&outcomes, self.config.dry_run);
        info!(
            processed = summary.processed,
            failed = summary.failures.len(),
            redactions = summary.total_redactions,
            "batch finished"
        );
        Ok(BatchOutcome::Completed { outcomes, summary })
    }
}

/// Runs one document so that a panic inside it becomes that document's error.
fn guarded<F>(process: F) -> std::result::Result<RedactionResult, DocumentError>
where
    F: FnOnce() -> std::result::Result<RedactionResult, DocumentError>,
{
    panic::catch_unwind(AssertUnwindSafe(process))
        .unwrap_or_else(|payload| Err(DocumentError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
