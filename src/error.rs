//! Error types and handling for the redaction engine
//!
//! Process-level failures (`Error`, `CatalogError`) abort a run before any
//! document is touched. Per-document failures (`DocumentError`) are isolated
//! to the document that raised them.

use std::{fmt, io, path::PathBuf, result::Result as StdResult};

use thiserror::Error;

use crate::analyzer::patterns::PatternKind;

/// Custom result type for process-level operations
pub type Result<T> = StdResult<T, Error>;

/// Core error type for process-level operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Pattern catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Input directory not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Exit status reported to the shell for this failure
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::InputNotFound(_) | Error::Io(_) => 1,
            Error::Catalog(_) | Error::Config(_) => 2,
            Error::Report(_) | Error::WorkerPool(_) => 1,
        }
    }
}

// -------------------- Sub-Error Categories --------------------

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("pattern {kind} failed to compile: {source}")]
    Compile {
        kind: PatternKind,
        #[source]
        source: regex::Error,
    },

    #[error("pattern {kind} is not length-bounded: {expression}")]
    Unbounded {
        kind: PatternKind,
        expression: String,
    },

    #[error("pattern {kind} matches the empty string")]
    MatchesEmpty { kind: PatternKind },
}

/// Stage of the per-document pipeline in which a failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Opened,
    TextExtracted,
    MatchesLocated,
    Planned,
    Applied,
    Saved,
    Verified,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Opened => "open",
            Stage::TextExtracted => "text extraction",
            Stage::MatchesLocated => "match location",
            Stage::Planned => "planning",
            Stage::Applied => "apply",
            Stage::Saved => "save",
            Stage::Verified => "verification",
        };
        f.write_str(name)
    }
}

/// Recoverable failure while processing a single document
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DocumentError {
    #[error("failed to open document: {0}")]
    Open(#[source] lopdf::Error),

    #[error("encrypted documents are not supported")]
    Encrypted,

    #[error("document has no pages")]
    NoPages,

    #[error("malformed page content: {0}")]
    Content(String),

    #[error("failed to save document: {0}")]
    Save(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("processing aborted: {0}")]
    Panicked(String),

    #[error("{stage} stage failed: {source}")]
    AtStage {
        stage: Stage,
        #[source]
        source: Box<DocumentError>,
    },
}

impl DocumentError {
    /// Tags this error with the pipeline stage it escaped from.
    pub fn at(self, stage: Stage) -> Self {
        match self {
            tagged @ DocumentError::AtStage { .. } => tagged,
            other => DocumentError::AtStage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Stage in which the error occurred, when known.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            DocumentError::AtStage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl From<lopdf::Error> for DocumentError {
    fn from(err: lopdf::Error) -> Self {
        DocumentError::Content(err.to_string())
    }
}
