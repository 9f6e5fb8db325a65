//! Positioned text extraction for a single page
//!
//! The core never touches lopdf directly for text: it is written against the
//! `TextExtractor` trait. `PageLayout` is the lopdf-backed implementation,
//! built by interpreting the page content stream with the page's fonts.

use lopdf::{Document, Object};

use crate::types::Rect;

pub mod content_processor;
pub mod font_processor;

pub use content_processor::{Glyph, PageLayout, TextLine};
pub use font_processor::{PageFont, ToUnicodeMap};

/// Text access for one page, as seen by the redaction core
pub trait TextExtractor {
    /// Full plain text of the page in reading order, one line per `\n`.
    fn extract_text(&self) -> &str;

    /// Every rectangle where `exact` is rendered within a single line.
    /// Leading and trailing whitespace of `exact` is ignored.
    ///
    /// An empty result is valid: the text may be split across lines.
    fn locate(&self, exact: &str) -> Vec<Rect>;
}

/// Follows indirect references until a direct object is reached.
pub(crate) fn resolve<'a>(doc: &'a Document, mut object: &'a Object) -> &'a Object {
    for _ in 0..32 {
        match object {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(target) => object = target,
                Err(_) => return object,
            },
            _ => return object,
        }
    }
    object
}

/// Numeric value of an integer or real operand.
pub(crate) fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}
