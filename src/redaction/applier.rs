//! Burning redactions into the page content stream
//!
//! Covered glyphs are removed from the text-showing operations, not just
//! painted over. Each removed glyph is replaced by a `TJ` displacement equal
//! to its advance so the remaining text keeps its position. The opaque fills
//! are drawn after the original content, which is isolated in its own
//! `q`/`Q` pair.

use std::collections::{BTreeMap, BTreeSet};

use lopdf::content::{Content, Operation};
use lopdf::{Object, ObjectId, StringFormat};
use tracing::{debug, instrument};

use crate::content::{number, Glyph, PageLayout};
use crate::error::DocumentError;
use crate::pdf_document::PdfDocument;
use crate::types::RedactionInstruction;

/// Commits planned redactions to a page
pub trait RedactionApplier {
    /// Applies every instruction and returns how many were applied.
    fn apply(&mut self, instructions: &[RedactionInstruction]) -> Result<usize, DocumentError>;
}

/// Applies redactions to one page of an open document
pub struct ContentRedactor<'a> {
    document: &'a mut PdfDocument,
    page: ObjectId,
    layout: &'a PageLayout,
}

impl<'a> ContentRedactor<'a> {
    /// `layout` must have been built from `page` of `document`.
    pub fn new(document: &'a mut PdfDocument, page: ObjectId, layout: &'a PageLayout) -> Self {
        Self {
            document,
            page,
            layout,
        }
    }
}

impl RedactionApplier for ContentRedactor<'_> {
    #[instrument(skip_all, fields(instructions = instructions.len()))]
    fn apply(&mut self, instructions: &[RedactionInstruction]) -> Result<usize, DocumentError> {
        if instructions.is_empty() {
            return Ok(0);
        }

        let content = rewrite_content(self.layout, instructions)?;
        self.document.replace_page_content(self.page, content)?;
        Ok(instructions.len())
    }
}

/// Builds the replacement content stream for a page.
///
/// Pure: the page itself is only touched once the returned bytes are
/// installed.
pub fn rewrite_content(
    layout: &PageLayout,
    instructions: &[RedactionInstruction],
) -> Result<Vec<u8>, DocumentError> {
    let removed: BTreeSet<usize> = layout
        .glyphs()
        .iter()
        .enumerate()
        .filter(|(_, glyph)| {
            let (cx, cy) = glyph.bbox.center();
            instructions.iter().any(|i| i.rect.contains_point(cx, cy))
        })
        .map(|(index, _)| index)
        .collect();

    // glyphs of every affected operation, in content order
    let mut affected: BTreeMap<usize, Vec<(&Glyph, bool)>> = BTreeMap::new();
    for &index in &removed {
        affected.entry(layout.glyphs()[index].op_index).or_default();
    }
    for (index, glyph) in layout.glyphs().iter().enumerate() {
        if let Some(glyphs) = affected.get_mut(&glyph.op_index) {
            glyphs.push((glyph, removed.contains(&index)));
        }
    }

    let mut operations = Vec::with_capacity(layout.operations().len() + 2 + 5 * instructions.len());
    operations.push(Operation::new("q", vec![]));
    for (index, op) in layout.operations().iter().enumerate() {
        match affected.get(&index) {
            Some(glyphs) => operations.extend(strip_glyphs(op, glyphs)),
            None => operations.push(op.clone()),
        }
    }
    operations.push(Operation::new("Q", vec![]));

    for instruction in instructions {
        let [x, y, w, h] = layout.to_user_space(&instruction.rect);
        let fill = instruction.fill;
        operations.extend([
            Operation::new("q", vec![]),
            Operation::new("rg", vec![real(fill.r), real(fill.g), real(fill.b)]),
            Operation::new("re", vec![real(x), real(y), real(w), real(h)]),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    debug!(
        glyphs_removed = removed.len(),
        operations_rewritten = affected.len(),
        "page content rewritten"
    );
    Content { operations }
        .encode()
        .map_err(|e| DocumentError::Content(e.to_string()))
}

/// Rewrites one text-showing operation without its removed glyphs.
fn strip_glyphs(op: &Operation, glyphs: &[(&Glyph, bool)]) -> Vec<Operation> {
    let elements: Vec<Object> = match (op.operator.as_str(), op.operands.as_slice()) {
        ("TJ", [Object::Array(items)]) => items.clone(),
        ("Tj" | "'", [string]) => vec![string.clone()],
        ("\"", [_, _, string]) => vec![string.clone()],
        _ => return vec![op.clone()],
    };

    let mut array: Vec<Object> = Vec::with_capacity(elements.len() + glyphs.len());
    for (element, item) in elements.into_iter().enumerate() {
        let (bytes, format) = match item {
            Object::String(bytes, format) => (bytes, format),
            other => {
                push_item(&mut array, other);
                continue;
            }
        };

        let mut kept = Vec::new();
        for (glyph, is_removed) in glyphs.iter().filter(|(g, _)| g.element == element) {
            if *is_removed {
                flush(&mut array, &mut kept, format.clone());
                push_item(&mut array, real(glyph.tj_adjustment));
            } else if let Some(code) = bytes.get(glyph.byte_range.clone()) {
                kept.extend_from_slice(code);
            }
        }
        flush(&mut array, &mut kept, format.clone());
    }

    let show = Operation::new("TJ", vec![Object::Array(array)]);
    match (op.operator.as_str(), op.operands.as_slice()) {
        ("'", _) => vec![Operation::new("T*", vec![]), show],
        ("\"", [aw, ac, _]) => vec![
            Operation::new("Tw", vec![aw.clone()]),
            Operation::new("Tc", vec![ac.clone()]),
            Operation::new("T*", vec![]),
            show,
        ],
        _ => vec![show],
    }
}

fn flush(array: &mut Vec<Object>, kept: &mut Vec<u8>, format: StringFormat) {
    if !kept.is_empty() {
        array.push(Object::String(std::mem::take(kept), format));
    }
}

/// Appends to a `TJ` array, folding consecutive displacements together.
fn push_item(array: &mut Vec<Object>, item: Object) {
    if let (Some(n), Some(last)) = (number(&item), array.last_mut()) {
        if let Some(m) = number(last) {
            *last = real(m + n);
            return;
        }
    }
    array.push(item);
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}
