//! idmask: first-page redaction of national ID numbers in PDF documents
//!
//! The engine extracts positioned text from the first page, matches CPF and
//! RG shaped identifiers, maps each match back to page rectangles, drops the
//! ones inside the protected label band, and burns opaque fills over the
//! rest. The saved file is then re-opened and scanned again.

// Configuration and core pipeline
pub mod config;
pub mod error;
pub mod pdf_document;
pub mod pipeline;
pub mod types;

// Detection
pub mod analyzer;
pub mod content;

// Redaction and verification
pub mod redaction;
pub mod verifier;

// Orchestration and output
pub mod batch;
pub mod report;

// Shared utilities
pub mod utils;

// Re-exports for crate consumers
pub use analyzer::{Match, PatternCatalog, PatternKind, TextMatcher};
pub use batch::{BatchOutcome, BatchRunner, BatchSummary, DocumentOutcome};
pub use config::{RedactionConfig, VerificationMode};
pub use content::{PageLayout, TextExtractor};
pub use error::{CatalogError, DocumentError, Error, Result, Stage};
pub use pdf_document::PdfDocument;
pub use pipeline::DocumentPipeline;
pub use redaction::{ContentRedactor, ExclusionZone, RedactionApplier};
pub use types::{Color, RedactionInstruction, RedactionResult, Rect, Verification};
pub use utils::init_logging;
pub use verifier::Verifier;
