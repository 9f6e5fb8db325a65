use std::fs;
use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use tempfile::TempDir;

/// Font size used for every fixture line
pub const FONT_SIZE: i64 = 10;
pub const PAGE_HEIGHT: i64 = 792;

/// A line of text placed so that its glyph boxes start at `top`
/// (page coordinates, y growing downward)
#[derive(Debug, Clone, Copy)]
pub struct Placed<'a> {
    pub x: i64,
    pub top: i64,
    pub text: &'a str,
}

pub fn at(x: i64, top: i64, text: &str) -> Placed<'_> {
    Placed { x, top, text }
}

pub struct TestFixtures;

impl TestFixtures {
    /// One-page Helvetica document with each line drawn by its own `Tj`.
    pub fn pdf_with_lines(lines: &[Placed<'_>]) -> Vec<u8> {
        Self::pdf_with_pages(&[lines])
    }

    pub fn pdf_with_pages(pages: &[&[Placed<'_>]]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut kids = Vec::new();
        for lines in pages {
            let mut operations = Vec::new();
            for line in lines.iter() {
                // glyph boxes reach 0.8 em above the baseline
                let baseline = PAGE_HEIGHT - line.top - FONT_SIZE * 8 / 10;
                operations.extend([
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
                    Operation::new("Td", vec![line.x.into(), baseline.into()]),
                    Operation::new("Tj", vec![win_ansi(line.text)]),
                    Operation::new("ET", vec![]),
                ]);
            }
            let content = Content { operations }.encode().unwrap();
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), PAGE_HEIGHT.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    pub fn corrupt_pdf() -> Vec<u8> {
        b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog /Pages 2 0 R\n%%EOF".to_vec()
    }
}

fn win_ansi(text: &str) -> Object {
    let bytes = text
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect();
    Object::String(bytes, StringFormat::Literal)
}

/// Scratch input/output directories for one test
pub struct TestEnv {
    _dir: TempDir,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("entrada");
        let output = dir.path().join("saida");
        fs::create_dir_all(&input).unwrap();
        Self {
            _dir: dir,
            input,
            output,
        }
    }

    pub fn write_input(&self, relative: &str, bytes: &[u8]) -> PathBuf {
        let path = self.input.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, bytes).unwrap();
        path
    }

    pub fn output_path(&self, relative: &str) -> PathBuf {
        self.output.join(relative)
    }
}

/// First-page text of the PDF at `path`, as the redaction engine sees it.
pub fn first_page_text(path: &Path) -> String {
    use idmask::TextExtractor;

    let document = idmask::PdfDocument::open(path).unwrap();
    let page = document.first_page().unwrap();
    document.layout(page).unwrap().extract_text().to_string()
}
