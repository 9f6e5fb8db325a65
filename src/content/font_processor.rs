//! Font metrics and text decoding for content stream interpretation
//!
//! Only what positioned extraction needs: byte-to-code splitting, advance
//! widths and Unicode mapping. Glyph outlines are never read.

use std::collections::BTreeMap;
use std::ops::Range;

use lopdf::{Dictionary, Document, Object};
use tracing::trace;

use super::{number, resolve};

/// Width used when a simple font supplies no metrics at all.
const DEFAULT_WIDTH: f64 = 500.0;

/// Default CID font width per the PDF reference.
const DEFAULT_CID_WIDTH: f64 = 1000.0;

/// Largest bfrange accepted from a ToUnicode CMap.
const MAX_RANGE_SPAN: u32 = 0xFFFF;

/// Helvetica advance widths for codes 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 222, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 222, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Metrics for the standard 14 fonts when `/Widths` is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StandardMetrics {
    Helvetica,
    Courier,
    Unknown,
}

impl StandardMetrics {
    fn from_base_font(name: &[u8]) -> Self {
        let name = String::from_utf8_lossy(name);
        // Subset fonts carry a six-letter tag, e.g. "ABCDEF+Helvetica".
        let name = name.split_once('+').map(|(_, rest)| rest.to_string()).unwrap_or_else(|| name.to_string());

        if name.starts_with("Courier") {
            StandardMetrics::Courier
        } else if name.starts_with("Helvetica") || name.starts_with("Arial") {
            StandardMetrics::Helvetica
        } else {
            StandardMetrics::Unknown
        }
    }

    fn width(&self, code: u32) -> f64 {
        match self {
            StandardMetrics::Courier => 600.0,
            StandardMetrics::Helvetica => match code {
                32..=126 => HELVETICA_WIDTHS[(code - 32) as usize] as f64,
                _ => 556.0,
            },
            StandardMetrics::Unknown => DEFAULT_WIDTH,
        }
    }
}

/// Code-to-Unicode mapping parsed from a `/ToUnicode` CMap
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToUnicodeMap {
    map: BTreeMap<u32, String>,
}

impl ToUnicodeMap {
    pub fn get(&self, code: u32) -> Option<&str> {
        self.map.get(&code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Parses the `bfchar` and `bfrange` sections of a CMap program.
    pub fn parse(program: &[u8]) -> Self {
        let tokens = tokenize_cmap(program);
        let mut map = BTreeMap::new();
        let mut i = 0;

        while i < tokens.len() {
            match &tokens[i] {
                CMapToken::Keyword(k) if k == "beginbfchar" => {
                    i += 1;
                    while i + 1 < tokens.len() {
                        match (&tokens[i], &tokens[i + 1]) {
                            (CMapToken::Hex(src), CMapToken::Hex(dst)) => {
                                map.insert(code_of(src), utf16_be(dst));
                                i += 2;
                            }
                            _ => break,
                        }
                    }
                }
                CMapToken::Keyword(k) if k == "beginbfrange" => {
                    i += 1;
                    while i + 2 < tokens.len() {
                        let (lo, hi) = match (&tokens[i], &tokens[i + 1]) {
                            (CMapToken::Hex(lo), CMapToken::Hex(hi)) => (code_of(lo), code_of(hi)),
                            _ => break,
                        };
                        if hi < lo || hi - lo > MAX_RANGE_SPAN {
                            i += 3;
                            continue;
                        }
                        match &tokens[i + 2] {
                            CMapToken::Hex(dst) => {
                                let base: Vec<u16> = utf16_units(dst);
                                for (offset, code) in (lo..=hi).enumerate() {
                                    let mut units = base.clone();
                                    if let Some(last) = units.last_mut() {
                                        *last = last.wrapping_add(offset as u16);
                                    }
                                    map.insert(code, String::from_utf16_lossy(&units));
                                }
                            }
                            CMapToken::Array(items) => {
                                for (code, dst) in (lo..=hi).zip(items.iter()) {
                                    map.insert(code, utf16_be(dst));
                                }
                            }
                            CMapToken::Keyword(_) => break,
                        }
                        i += 3;
                    }
                }
                _ => i += 1,
            }
        }

        Self { map }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CMapToken {
    Hex(Vec<u8>),
    Array(Vec<Vec<u8>>),
    Keyword(String),
}

fn tokenize_cmap(program: &[u8]) -> Vec<CMapToken> {
    let mut tokens = Vec::new();
    let mut array: Option<Vec<Vec<u8>>> = None;
    let mut i = 0;

    while i < program.len() {
        let c = program[i];
        match c {
            b'%' => {
                while i < program.len() && program[i] != b'\n' && program[i] != b'\r' {
                    i += 1;
                }
            }
            b'<' if program.get(i + 1) == Some(&b'<') => i += 2,
            b'>' if program.get(i + 1) == Some(&b'>') => i += 2,
            b'<' => {
                let start = i + 1;
                let mut end = start;
                while end < program.len() && program[end] != b'>' {
                    end += 1;
                }
                let bytes = hex_bytes(&program[start..end]);
                match array.as_mut() {
                    Some(items) => items.push(bytes),
                    None => tokens.push(CMapToken::Hex(bytes)),
                }
                i = end + 1;
            }
            b'[' => {
                array = Some(Vec::new());
                i += 1;
            }
            b']' => {
                if let Some(items) = array.take() {
                    tokens.push(CMapToken::Array(items));
                }
                i += 1;
            }
            b'(' => {
                // Literal strings only appear in CMap headers; skip them.
                let mut depth = 0usize;
                while i < program.len() {
                    match program[i] {
                        b'\\' => i += 1,
                        b'(' => depth += 1,
                        b')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
                i += 1;
            }
            c if c.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < program.len()
                    && !program[i].is_ascii_whitespace()
                    && !b"<>[]()%/".contains(&program[i])
                {
                    i += 1;
                }
                if i == start {
                    i += 1;
                } else if array.is_none() {
                    tokens.push(CMapToken::Keyword(
                        String::from_utf8_lossy(&program[start..i]).into_owned(),
                    ));
                }
            }
        }
    }
    tokens
}

fn hex_bytes(digits: &[u8]) -> Vec<u8> {
    let nibbles: Vec<u8> = digits
        .iter()
        .filter_map(|d| (*d as char).to_digit(16).map(|v| v as u8))
        .collect();
    nibbles
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect()
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().take(4).fold(0u32, |acc, b| (acc << 8) | *b as u32)
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => *single as u16,
            _ => 0,
        })
        .collect()
}

fn utf16_be(bytes: &[u8]) -> String {
    String::from_utf16_lossy(&utf16_units(bytes))
}

/// WinAnsi code points that differ from Latin-1 in 0x80..=0x9F.
fn win_ansi(byte: u8) -> char {
    match byte {
        0x80 => '€',
        0x82 => '‚',
        0x83 => 'ƒ',
        0x84 => '„',
        0x85 => '…',
        0x86 => '†',
        0x87 => '‡',
        0x88 => 'ˆ',
        0x89 => '‰',
        0x8A => 'Š',
        0x8B => '‹',
        0x8C => 'Œ',
        0x8E => 'Ž',
        0x91 => '‘',
        0x92 => '’',
        0x93 => '“',
        0x94 => '”',
        0x95 => '•',
        0x96 => '–',
        0x97 => '—',
        0x98 => '˜',
        0x99 => '™',
        0x9A => 'š',
        0x9B => '›',
        0x9C => 'œ',
        0x9E => 'ž',
        0x9F => 'Ÿ',
        other => other as char,
    }
}

/// A font resource as needed for layout: code splitting, widths, decoding
#[derive(Debug, Clone)]
pub struct PageFont {
    composite: bool,
    first_char: u32,
    widths: Vec<f64>,
    missing_width: Option<f64>,
    cid_widths: BTreeMap<u32, f64>,
    default_cid_width: f64,
    standard: StandardMetrics,
    to_unicode: Option<ToUnicodeMap>,
}

impl Default for PageFont {
    fn default() -> Self {
        Self {
            composite: false,
            first_char: 0,
            widths: Vec::new(),
            missing_width: None,
            cid_widths: BTreeMap::new(),
            default_cid_width: DEFAULT_CID_WIDTH,
            standard: StandardMetrics::Unknown,
            to_unicode: None,
        }
    }
}

impl PageFont {
    /// Reads metrics from a font dictionary. Missing or malformed entries
    /// fall back to defaults rather than failing the page.
    pub fn from_dict(doc: &Document, dict: &Dictionary) -> Self {
        let mut font = PageFont::default();

        let subtype = name_of(doc, dict, b"Subtype");
        font.composite = subtype.as_deref() == Some(b"Type0".as_slice());

        if let Some(base) = name_of(doc, dict, b"BaseFont") {
            font.standard = StandardMetrics::from_base_font(&base);
        }

        if font.composite {
            if let Some(descendant) = first_descendant(doc, dict) {
                if let Ok(dw) = descendant.get(b"DW") {
                    if let Some(dw) = number(resolve(doc, dw)) {
                        font.default_cid_width = dw;
                    }
                }
                if let Ok(w) = descendant.get(b"W") {
                    if let Object::Array(items) = resolve(doc, w) {
                        font.cid_widths = parse_cid_widths(doc, items);
                    }
                }
            }
        } else {
            if let Ok(first) = dict.get(b"FirstChar") {
                font.first_char = number(resolve(doc, first)).unwrap_or(0.0).max(0.0) as u32;
            }
            if let Ok(widths) = dict.get(b"Widths") {
                if let Object::Array(items) = resolve(doc, widths) {
                    font.widths = items
                        .iter()
                        .map(|w| number(resolve(doc, w)).unwrap_or(0.0))
                        .collect();
                }
            }
            if let Ok(descriptor) = dict.get(b"FontDescriptor") {
                if let Object::Dictionary(descriptor) = resolve(doc, descriptor) {
                    if let Ok(mw) = descriptor.get(b"MissingWidth") {
                        font.missing_width = number(resolve(doc, mw));
                    }
                }
            }
        }

        if let Ok(to_unicode) = dict.get(b"ToUnicode") {
            if let Object::Stream(stream) = resolve(doc, to_unicode) {
                let program = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                let map = ToUnicodeMap::parse(&program);
                trace!(entries = map.len(), "parsed ToUnicode CMap");
                font.to_unicode = Some(map);
            }
        }

        font
    }

    pub fn is_composite(&self) -> bool {
        self.composite
    }

    /// Splits a string operand into character codes with their byte ranges.
    pub fn split_codes(&self, bytes: &[u8]) -> Vec<(Range<usize>, u32)> {
        let step = if self.composite { 2 } else { 1 };
        let mut codes = Vec::with_capacity(bytes.len() / step + 1);
        let mut i = 0;
        while i < bytes.len() {
            let end = (i + step).min(bytes.len());
            codes.push((i..end, code_of(&bytes[i..end])));
            i = end;
        }
        codes
    }

    /// Advance width in thousandths of text space.
    pub fn width(&self, code: u32) -> f64 {
        if self.composite {
            return self
                .cid_widths
                .get(&code)
                .copied()
                .unwrap_or(self.default_cid_width);
        }
        if code >= self.first_char {
            if let Some(w) = self.widths.get((code - self.first_char) as usize) {
                return *w;
            }
        }
        self.missing_width
            .unwrap_or_else(|| self.standard.width(code))
    }

    /// Unicode text for a character code.
    pub fn decode(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|m| m.get(code)) {
            return text.to_string();
        }
        if self.composite {
            return char::REPLACEMENT_CHARACTER.to_string();
        }
        win_ansi(code as u8).to_string()
    }

    /// Word spacing applies to the single-byte code 32 only.
    pub fn is_word_space(&self, byte_len: usize, code: u32) -> bool {
        byte_len == 1 && code == 32
    }
}

fn name_of(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<Vec<u8>> {
    match dict.get(key).map(|o| resolve(doc, o)) {
        Ok(Object::Name(name)) => Some(name.clone()),
        _ => None,
    }
}

fn first_descendant<'a>(doc: &'a Document, dict: &'a Dictionary) -> Option<&'a Dictionary> {
    let descendants = dict.get(b"DescendantFonts").ok()?;
    match resolve(doc, descendants) {
        Object::Array(items) => match resolve(doc, items.first()?) {
            Object::Dictionary(d) => Some(d),
            _ => None,
        },
        _ => None,
    }
}

/// Parses a CIDFont `/W` array: `c [w1 w2 ...]` and `c_first c_last w` forms.
fn parse_cid_widths(doc: &Document, items: &[Object]) -> BTreeMap<u32, f64> {
    let mut widths = BTreeMap::new();
    let mut i = 0;

    while i < items.len() {
        let first = match number(resolve(doc, &items[i])) {
            Some(v) if v >= 0.0 => v as u32,
            _ => break,
        };
        match items.get(i + 1).map(|o| resolve(doc, o)) {
            Some(Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    let code = u32::try_from(offset).ok().and_then(|o| first.checked_add(o));
                    if let (Some(code), Some(w)) = (code, number(resolve(doc, w))) {
                        widths.insert(code, w);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let last = match number(last) {
                    Some(v) if v >= first as f64 => v as u32,
                    _ => break,
                };
                let w = match items.get(i + 2).and_then(|o| number(resolve(doc, o))) {
                    Some(w) => w,
                    None => break,
                };
                if last - first <= MAX_RANGE_SPAN {
                    for code in first..=last {
                        widths.insert(code, w);
                    }
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}
