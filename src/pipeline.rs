//! Per-document pipeline
//!
//! Drives one document through `Opened → TextExtracted → MatchesLocated →
//! Planned → Applied → Saved → Verified`. The sequence is linear. A failure
//! aborts only the current document and carries the stage it escaped from.

use std::path::Path;

use lopdf::ObjectId;
use tracing::{debug, info, instrument};

use crate::analyzer::PatternCatalog;
use crate::config::RedactionConfig;
use crate::content::PageLayout;
use crate::error::{DocumentError, Stage};
use crate::pdf_document::PdfDocument;
use crate::redaction::{
    candidate_rects, locate_matches, plan, ContentRedactor, ExclusionZone, PlanPolicy,
    RedactionApplier,
};
use crate::types::{RedactionInstruction, RedactionResult, Rect, Verification};
use crate::verifier::Verifier;

/// Redaction pipeline sharing a catalog and config across documents
#[derive(Debug, Clone, Copy)]
pub struct DocumentPipeline<'a> {
    catalog: &'a PatternCatalog,
    config: &'a RedactionConfig,
}

impl<'a> DocumentPipeline<'a> {
    pub fn new(catalog: &'a PatternCatalog, config: &'a RedactionConfig) -> Self {
        Self { catalog, config }
    }

    /// Redacts the first page of `input` into `output` and verifies it.
    ///
    /// In dry-run mode nothing is written and verification is skipped.
    #[instrument(skip_all, fields(input = %input.display()))]
    pub fn process(&self, input: &Path, output: &Path) -> Result<RedactionResult, DocumentError> {
        let (mut document, page) = self.open(input).map_err(|e| e.at(Stage::Opened))?;
        let layout = self.extract(&document, page).map_err(|e| e.at(Stage::TextExtracted))?;
        let candidates = self.locate(&layout);
        let instructions = self.plan(&layout, &candidates);

        if self.config.dry_run {
            info!(planned = instructions.len(), "dry run, document left untouched");
            return Ok(RedactionResult {
                source: input.to_path_buf(),
                destination: output.to_path_buf(),
                redactions: instructions.len(),
                verification: Verification::Skipped,
            });
        }

        let redactions = self
            .apply(&mut document, page, &layout, &instructions)
            .map_err(|e| e.at(Stage::Applied))?;
        self.save(&mut document, output)
            .map_err(|e| e.at(Stage::Saved))?;
        let verification = self.verify(output).map_err(|e| e.at(Stage::Verified))?;

        info!(redactions, ?verification, "document processed");
        Ok(RedactionResult {
            source: input.to_path_buf(),
            destination: output.to_path_buf(),
            redactions,
            verification,
        })
    }

    fn open(&self, input: &Path) -> Result<(PdfDocument, ObjectId), DocumentError> {
        let document = PdfDocument::open(input)?;
        let page = document.first_page()?;
        advance(Stage::Opened);
        Ok((document, page))
    }

    #[instrument(skip_all)]
    fn extract(&self, document: &PdfDocument, page: ObjectId) -> Result<PageLayout, DocumentError> {
        let layout = document.layout(page)?;
        debug!(glyphs = layout.glyphs().len(), lines = layout.lines().len(), "page text extracted");
        advance(Stage::TextExtracted);
        Ok(layout)
    }

    #[instrument(skip_all)]
    fn locate(&self, layout: &PageLayout) -> Vec<Rect> {
        let located = locate_matches(layout, self.catalog);
        let candidates = candidate_rects(&located);
        debug!(matches = located.len(), candidates = candidates.len(), "candidates collected");
        advance(Stage::MatchesLocated);
        candidates
    }

    #[instrument(skip_all)]
    fn plan(&self, layout: &PageLayout, candidates: &[Rect]) -> Vec<RedactionInstruction> {
        let zone = ExclusionZone::resolve(layout, &self.config.label, self.config.margin);
        let instructions = plan(candidates, &zone, &PlanPolicy::from(self.config));
        advance(Stage::Planned);
        instructions
    }

    #[instrument(skip_all)]
    fn apply(
        &self,
        document: &mut PdfDocument,
        page: ObjectId,
        layout: &PageLayout,
        instructions: &[RedactionInstruction],
    ) -> Result<usize, DocumentError> {
        let applied = ContentRedactor::new(document, page, layout).apply(instructions)?;
        advance(Stage::Applied);
        Ok(applied)
    }

    #[instrument(skip_all, fields(output = %output.display()))]
    fn save(&self, document: &mut PdfDocument, output: &Path) -> Result<(), DocumentError> {
        document.save_compacted(output)?;
        advance(Stage::Saved);
        Ok(())
    }

    #[instrument(skip_all)]
    fn verify(&self, output: &Path) -> Result<Verification, DocumentError> {
        let residual = Verifier::new(self.catalog, self.config).has_residual_matches(output)?;
        advance(Stage::Verified);
        Ok(if residual {
            Verification::Residual
        } else {
            Verification::Clean
        })
    }
}

fn advance(stage: Stage) {
    debug!(%stage, "stage complete");
}
