//! Post-save verification
//!
//! Re-opens a written document from disk and checks whether any identifier
//! is still detectable on its first page. Nothing from the redaction run is
//! reused, so the check sees exactly what a reader of the file would see.

use std::path::Path;

use tracing::{debug, instrument, warn};

use crate::analyzer::{PatternCatalog, TextMatcher};
use crate::config::{RedactionConfig, VerificationMode};
use crate::content::TextExtractor;
use crate::error::DocumentError;
use crate::pdf_document::PdfDocument;
use crate::redaction::{locate_matches, ExclusionZone};

/// Leftover-identifier check over saved documents
#[derive(Debug, Clone)]
pub struct Verifier<'a> {
    catalog: &'a PatternCatalog,
    label: &'a str,
    margin: f64,
    mode: VerificationMode,
}

impl<'a> Verifier<'a> {
    pub fn new(catalog: &'a PatternCatalog, config: &'a RedactionConfig) -> Self {
        Self {
            catalog,
            label: &config.label,
            margin: config.margin,
            mode: config.verification,
        }
    }

    pub fn mode(&self) -> VerificationMode {
        self.mode
    }

    /// True when the saved file at `path` still shows an identifier.
    #[instrument(skip_all, fields(path = %path.display(), mode = ?self.mode))]
    pub fn has_residual_matches(&self, path: &Path) -> Result<bool, DocumentError> {
        let document = PdfDocument::open(path)?;
        let page = document.first_page()?;
        let layout = document.layout(page)?;

        let residual = self.page_has_residual(&layout);
        if residual {
            warn!("identifier still detectable after redaction");
        } else {
            debug!("no residual identifiers");
        }
        Ok(residual)
    }

    /// Applies the configured mode to an already extracted page.
    pub fn page_has_residual<P: TextExtractor + ?Sized>(&self, page: &P) -> bool {
        match self.mode {
            VerificationMode::FullText => self.catalog.is_match(page.extract_text()),
            VerificationMode::ZoneAware => {
                let zone = ExclusionZone::resolve(page, self.label, self.margin);
                locate_matches(page, self.catalog).iter().any(|located| {
                    located.rects.is_empty()
                        || located.rects.iter().any(|rect| !zone.excludes(rect))
                })
            }
        }
    }
}
