//! PDF document wrapper for loading, page access and compacted saving

use std::path::{Path, PathBuf};

use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, instrument};

use crate::content::PageLayout;
use crate::error::DocumentError;
use crate::utils;

/// An opened PDF, exclusively owned by the pipeline run processing it
#[derive(Debug, Clone)]
pub struct PdfDocument {
    document: Document,
    path: PathBuf,
}

impl PdfDocument {
    /// Loads `path` from disk. Encrypted files are refused.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        let document = Document::load(path).map_err(DocumentError::Open)?;
        debug!(
            version = %document.version,
            objects = document.objects.len(),
            "document loaded"
        );
        Self::from_document(document, path)
    }

    /// Wraps an already parsed document. Encrypted documents are refused.
    pub fn from_document(document: Document, path: &Path) -> Result<Self, DocumentError> {
        if document.trailer.get(b"Encrypt").is_ok() {
            return Err(DocumentError::Encrypted);
        }
        Ok(Self {
            document,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Object id of page 1.
    pub fn first_page(&self) -> Result<ObjectId, DocumentError> {
        self.document
            .get_pages()
            .into_iter()
            .next()
            .map(|(_, id)| id)
            .ok_or(DocumentError::NoPages)
    }

    /// Positioned text of `page`.
    pub fn layout(&self, page: ObjectId) -> Result<PageLayout, DocumentError> {
        PageLayout::from_page(&self.document, page)
    }

    /// Points the page at a single new content stream holding `content`.
    ///
    /// The previous streams stay in the object table until the next
    /// `save_compacted`, which drops them.
    pub fn replace_page_content(
        &mut self,
        page: ObjectId,
        content: Vec<u8>,
    ) -> Result<(), DocumentError> {
        let stream_id = self
            .document
            .add_object(Stream::new(dictionary! {}, content));
        self.document
            .get_object_mut(page)?
            .as_dict_mut()?
            .set("Contents", Object::Reference(stream_id));
        Ok(())
    }

    /// Drops unreachable objects, compresses, and writes `destination`
    /// atomically. The source file is never touched.
    #[instrument(skip_all, fields(destination = %destination.display()))]
    pub fn save_compacted(&mut self, destination: &Path) -> Result<(), DocumentError> {
        let pruned = self.document.prune_objects();
        let emptied = self.document.delete_zero_length_streams();
        self.document.renumber_objects();
        self.document.compress();

        let mut bytes = Vec::new();
        self.document
            .save_to(&mut bytes)
            .map_err(|e| DocumentError::Save(e.to_string()))?;

        debug!(
            pruned = pruned.len(),
            emptied = emptied.len(),
            bytes = bytes.len(),
            "document serialized"
        );
        utils::write_atomic(destination, &bytes)?;
        Ok(())
    }
}
