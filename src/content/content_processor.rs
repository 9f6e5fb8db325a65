//! Content stream interpretation into positioned glyphs and text lines
//!
//! Tracks just enough of the graphics and text state to place every shown
//! glyph on the page: CTM, text and line matrices, font, size, spacing,
//! horizontal scaling, leading and rise.

use std::collections::BTreeMap;
use std::ops::Range;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, trace};

use super::font_processor::PageFont;
use super::{number, resolve, TextExtractor};
use crate::error::DocumentError;
use crate::types::Rect;

/// Glyph box extent above the baseline, in em (small glyph heights).
const ASCENT: f64 = 0.8;
/// Glyph box extent below the baseline, in em.
const DESCENT: f64 = -0.2;
/// Baseline shift, in em, that starts a new line.
const LINE_BREAK_SHIFT: f64 = 0.3;
/// Horizontal gap, in em, rendered as a space between two glyphs.
const WORD_GAP: f64 = 0.25;

const US_LETTER: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Affine transform `[a b c d e f]` as used by PDF
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    pub(crate) const IDENTITY: Matrix = Matrix { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self × other`: apply `self` first, then `other`.
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }

    fn from_operands(operands: &[Object]) -> Option<Matrix> {
        let v: Vec<f64> = operands.iter().filter_map(number).collect();
        (v.len() == 6).then(|| Matrix::new(v[0], v[1], v[2], v[3], v[4], v[5]))
    }
}

/// Text state parameters saved and restored with `q`/`Q`
#[derive(Debug, Clone)]
struct TextState {
    font: Option<Vec<u8>>,
    size: f64,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scale: f64,
    leading: f64,
    rise: f64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

/// One shown glyph, tied back to the operation that drew it
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Index of the text-showing operation in the decoded content
    pub op_index: usize,
    /// Index of the string operand within a `TJ` array (0 otherwise)
    pub element: usize,
    /// Byte range of the character code within that string
    pub byte_range: Range<usize>,
    pub text: String,
    pub bbox: Rect,
    /// Baseline position in page coordinates
    pub baseline: f64,
    /// Effective font size on the page
    pub size: f64,
    /// `TJ` displacement that advances the pen exactly as this glyph did
    pub tj_adjustment: f64,
}

/// A run of glyphs sharing a baseline, with its text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLine {
    pub text: String,
    /// Byte ranges of `text` and the glyph each came from; `None` for
    /// inserted word gaps.
    pub segments: Vec<(Range<usize>, Option<usize>)>,
}

/// Positioned text of one page, built from its content stream
#[derive(Debug, Clone)]
pub struct PageLayout {
    media_box: [f64; 4],
    operations: Vec<Operation>,
    glyphs: Vec<Glyph>,
    lines: Vec<TextLine>,
    text: String,
}

impl PageLayout {
    /// Interprets the content of `page_id` within `doc`.
    pub fn from_page(doc: &Document, page_id: ObjectId) -> Result<Self, DocumentError> {
        let content = doc.get_page_content(page_id)?;
        let operations = Content::decode(&content)
            .map_err(|e| DocumentError::Content(e.to_string()))?
            .operations;
        let fonts = page_fonts(doc, page_id);
        let media_box = media_box(doc, page_id);

        debug!(
            operations = operations.len(),
            fonts = fonts.len(),
            "interpreting page content"
        );
        Ok(Self::interpret(operations, &fonts, media_box))
    }

    /// Builds a layout from already decoded operations.
    pub fn interpret(
        operations: Vec<Operation>,
        fonts: &BTreeMap<Vec<u8>, PageFont>,
        media_box: [f64; 4],
    ) -> Self {
        let glyphs = Interpreter::new(fonts, media_box).run(&operations);
        let lines = build_lines(&glyphs);
        let mut text = String::new();
        for line in &lines {
            text.push_str(&line.text);
            text.push('\n');
        }

        Self {
            media_box,
            operations,
            glyphs,
            lines,
            text,
        }
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    pub fn lines(&self) -> &[TextLine] {
        &self.lines
    }

    /// MediaBox as `[llx, lly, urx, ury]` in user space.
    pub fn media_box(&self) -> [f64; 4] {
        self.media_box
    }

    /// Converts a page rectangle back to user-space `x y w h` for `re`.
    pub fn to_user_space(&self, rect: &Rect) -> [f64; 4] {
        let [llx, _, _, ury] = self.media_box;
        [llx + rect.x0, ury - rect.y1, rect.width(), rect.height()]
    }
}

impl TextExtractor for PageLayout {
    fn extract_text(&self) -> &str {
        &self.text
    }

    fn locate(&self, exact: &str) -> Vec<Rect> {
        // lines never carry their own line break
        let exact = exact.trim();
        if exact.is_empty() {
            return Vec::new();
        }

        let mut rects = Vec::new();
        for line in &self.lines {
            for (start, found) in line.text.match_indices(exact) {
                let end = start + found.len();
                let bbox = line
                    .segments
                    .iter()
                    .filter(|(range, _)| range.start < end && range.end > start)
                    .filter_map(|(_, glyph)| glyph.map(|g| self.glyphs[g].bbox))
                    .reduce(|acc, r| acc.union(&r));
                if let Some(bbox) = bbox {
                    rects.push(bbox);
                }
            }
        }
        rects
    }
}

struct Interpreter<'f> {
    fonts: &'f BTreeMap<Vec<u8>, PageFont>,
    fallback_font: PageFont,
    media_box: [f64; 4],
    ctm: Matrix,
    state: TextState,
    stack: Vec<(Matrix, TextState)>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    glyphs: Vec<Glyph>,
}

impl<'f> Interpreter<'f> {
    fn new(fonts: &'f BTreeMap<Vec<u8>, PageFont>, media_box: [f64; 4]) -> Self {
        Self {
            fonts,
            fallback_font: PageFont::default(),
            media_box,
            ctm: Matrix::IDENTITY,
            state: TextState::default(),
            stack: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            glyphs: Vec::new(),
        }
    }

    fn run(mut self, operations: &[Operation]) -> Vec<Glyph> {
        for (index, op) in operations.iter().enumerate() {
            self.step(index, op);
        }
        self.glyphs
    }

    fn step(&mut self, index: usize, op: &Operation) {
        let nums: Vec<f64> = op.operands.iter().filter_map(number).collect();

        match op.operator.as_str() {
            "q" => self.stack.push((self.ctm, self.state.clone())),
            "Q" => {
                if let Some((ctm, state)) = self.stack.pop() {
                    self.ctm = ctm;
                    self.state = state;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(&op.operands) {
                    self.ctm = m.then(&self.ctm);
                }
            }
            "BT" => {
                self.text_matrix = Matrix::IDENTITY;
                self.line_matrix = Matrix::IDENTITY;
            }
            "Tf" => {
                if let [Object::Name(name), size] = op.operands.as_slice() {
                    self.state.font = Some(name.clone());
                    self.state.size = number(size).unwrap_or(0.0);
                }
            }
            "Tc" => {
                if let Some(v) = nums.first() {
                    self.state.char_spacing = *v;
                }
            }
            "Tw" => {
                if let Some(v) = nums.first() {
                    self.state.word_spacing = *v;
                }
            }
            "Tz" => {
                if let Some(v) = nums.first() {
                    self.state.horizontal_scale = *v / 100.0;
                }
            }
            "TL" => {
                if let Some(v) = nums.first() {
                    self.state.leading = *v;
                }
            }
            "Ts" => {
                if let Some(v) = nums.first() {
                    self.state.rise = *v;
                }
            }
            "Td" => {
                if let [tx, ty] = nums.as_slice() {
                    self.move_line(*tx, *ty);
                }
            }
            "TD" => {
                if let [tx, ty] = nums.as_slice() {
                    self.state.leading = -ty;
                    self.move_line(*tx, *ty);
                }
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(&op.operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    self.show(index, 0, bytes);
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    self.show(index, 0, bytes);
                }
            }
            "\"" => {
                if let [aw, ac, Object::String(bytes, _)] = op.operands.as_slice() {
                    self.state.word_spacing = number(aw).unwrap_or(0.0);
                    self.state.char_spacing = number(ac).unwrap_or(0.0);
                    self.next_line();
                    self.show(index, 0, bytes);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    for (element, item) in items.iter().enumerate() {
                        match item {
                            Object::String(bytes, _) => self.show(index, element, bytes),
                            other => {
                                if let Some(n) = number(other) {
                                    let tx = -n / 1000.0
                                        * self.state.size
                                        * self.state.horizontal_scale;
                                    self.advance(tx);
                                }
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translate(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.state.leading);
    }

    fn advance(&mut self, tx: f64) {
        self.text_matrix = Matrix::translate(tx, 0.0).then(&self.text_matrix);
    }

    fn show(&mut self, op_index: usize, element: usize, bytes: &[u8]) {
        let font = self
            .state
            .font
            .as_ref()
            .and_then(|name| self.fonts.get(name))
            .unwrap_or(&self.fallback_font);

        let size = self.state.size;
        let scale = self.state.horizontal_scale;
        let [llx, _, _, ury] = self.media_box;
        let mut shown = Vec::new();

        for (byte_range, code) in font.split_codes(bytes) {
            let w0 = font.width(code) / 1000.0;
            let word_space = if font.is_word_space(byte_range.len(), code) {
                self.state.word_spacing
            } else {
                0.0
            };

            let render = Matrix::new(size * scale, 0.0, 0.0, size, 0.0, self.state.rise)
                .then(&self.text_matrix)
                .then(&self.ctm);
            let corners = [
                render.apply(0.0, DESCENT),
                render.apply(w0, DESCENT),
                render.apply(0.0, ASCENT),
                render.apply(w0, ASCENT),
            ];
            let (mut min_x, mut min_y) = (f64::MAX, f64::MAX);
            let (mut max_x, mut max_y) = (f64::MIN, f64::MIN);
            for (x, y) in corners {
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
            let bbox = Rect::new(min_x - llx, ury - max_y, max_x - llx, ury - min_y);
            let (_, baseline_y) = render.apply(0.0, 0.0);

            let device = self.text_matrix.then(&self.ctm);
            let effective_size = size.abs() * device.c.hypot(device.d);

            let tj_adjustment = if size != 0.0 {
                -(w0 * 1000.0 + (self.state.char_spacing + word_space) * 1000.0 / size)
            } else {
                0.0
            };

            shown.push(Glyph {
                op_index,
                element,
                byte_range,
                text: font.decode(code),
                bbox,
                baseline: ury - baseline_y,
                size: effective_size,
                tj_adjustment,
            });

            let tx = (w0 * size + self.state.char_spacing + word_space) * scale;
            self.text_matrix = Matrix::translate(tx, 0.0).then(&self.text_matrix);
        }

        trace!(op_index, glyphs = shown.len(), "shown text");
        self.glyphs.extend(shown);
    }
}

/// Groups glyphs into lines in content order.
fn build_lines(glyphs: &[Glyph]) -> Vec<TextLine> {
    let mut lines: Vec<TextLine> = Vec::new();
    let mut previous: Option<&Glyph> = None;

    for (index, glyph) in glyphs.iter().enumerate() {
        if glyph.text.is_empty() {
            continue;
        }
        let em = glyph.size.max(1.0);

        let starts_line = match previous {
            None => true,
            Some(prev) => {
                (glyph.baseline - prev.baseline).abs() > LINE_BREAK_SHIFT * em
                    || glyph.bbox.x0 < prev.bbox.x1 - em
            }
        };

        if starts_line {
            lines.push(TextLine::default());
        } else if let Some(prev) = previous {
            let gap = glyph.bbox.x0 - prev.bbox.x1;
            let spaced = prev.text.ends_with(char::is_whitespace)
                || glyph.text.starts_with(char::is_whitespace);
            if gap > WORD_GAP * em && !spaced {
                if let Some(line) = lines.last_mut() {
                    let start = line.text.len();
                    line.text.push(' ');
                    line.segments.push((start..line.text.len(), None));
                }
            }
        }

        if let Some(line) = lines.last_mut() {
            let start = line.text.len();
            line.text.push_str(&glyph.text);
            line.segments.push((start..line.text.len(), Some(index)));
        }
        previous = Some(glyph);
    }
    lines
}

/// Loads every font in the page's (possibly inherited) resources.
fn page_fonts(doc: &Document, page_id: ObjectId) -> BTreeMap<Vec<u8>, PageFont> {
    let mut fonts = BTreeMap::new();
    let Some(resources) = inherited(doc, page_id, b"Resources") else {
        return fonts;
    };
    let Object::Dictionary(resources) = resolve(doc, resources) else {
        return fonts;
    };
    let Ok(font_dict) = resources.get(b"Font") else {
        return fonts;
    };
    if let Object::Dictionary(font_dict) = resolve(doc, font_dict) {
        for (name, font) in font_dict.iter() {
            if let Object::Dictionary(font) = resolve(doc, font) {
                fonts.insert(name.clone(), PageFont::from_dict(doc, font));
            }
        }
    }
    fonts
}

fn media_box(doc: &Document, page_id: ObjectId) -> [f64; 4] {
    let Some(object) = inherited(doc, page_id, b"MediaBox") else {
        return US_LETTER;
    };
    match resolve(doc, object) {
        Object::Array(items) if items.len() == 4 => {
            let v: Vec<f64> = items
                .iter()
                .filter_map(|o| number(resolve(doc, o)))
                .collect();
            if v.len() == 4 {
                [v[0].min(v[2]), v[1].min(v[3]), v[0].max(v[2]), v[1].max(v[3])]
            } else {
                US_LETTER
            }
        }
        _ => US_LETTER,
    }
}

/// Looks up an inheritable page attribute, walking `/Parent` links.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_object(page_id).ok()?.as_dict().ok()?;
    for _ in 0..64 {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent = node.get(b"Parent").ok()?;
        node = match resolve(doc, parent) {
            Object::Dictionary(d) => d,
            _ => return None,
        };
    }
    None
}
