use idmask::{PageLayout, PdfDocument, TextExtractor};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use crate::fixtures::{at, TestFixtures};

fn layout_of(bytes: &[u8]) -> PageLayout {
    let document = Document::load_mem(bytes).unwrap();
    let page = *document.get_pages().get(&1).unwrap();
    PageLayout::from_page(&document, page).unwrap()
}

#[test]
fn label_boxes_start_at_their_top_edge() {
    let layout = layout_of(&TestFixtures::pdf_with_lines(&[
        at(72, 100, "ID Único"),
        at(72, 140, "CPF 123.456.789-09"),
    ]));

    assert_eq!(layout.extract_text(), "ID Único\nCPF 123.456.789-09\n");

    let rects = layout.locate("ID Único");
    assert_eq!(rects.len(), 1);
    assert!((rects[0].y0 - 100.0).abs() < 1e-6);
    assert!((rects[0].x0 - 72.0).abs() < 1e-6);

    let numbers = layout.locate("123.456.789-09");
    assert_eq!(numbers.len(), 1);
    assert!((numbers[0].y0 - 140.0).abs() < 1e-6);
    assert!(numbers[0].x0 > 72.0);
}

#[test]
fn split_text_is_not_located() {
    let layout = layout_of(&TestFixtures::pdf_with_lines(&[
        at(72, 100, "123.456"),
        at(72, 200, ".789-09"),
    ]));

    assert!(layout.locate("123.456.789-09").is_empty());
}

fn type0_document(media_box: [i64; 4]) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let cmap = b"/CIDInit /ProcSet findresource begin\n\
        begincmap\n\
        1 begincodespacerange <0000> <FFFF> endcodespacerange\n\
        3 beginbfchar\n\
        <0001> <0043>\n\
        <0002> <0050>\n\
        <0003> <0046>\n\
        endbfchar\n\
        endcmap\n"
        .to_vec();
    let to_unicode = doc.add_object(Stream::new(dictionary! {}, cmap));
    let descendant = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => "Embedded",
        "DW" => 500,
    });
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "Embedded",
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(descendant)],
        "ToUnicode" => to_unicode,
    });

    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F0".into(), 20.into()]),
            Operation::new("Td", vec![10.into(), 50.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(
                    vec![0x00, 0x01, 0x00, 0x02, 0x00, 0x03],
                    StringFormat::Hexadecimal,
                )],
            ),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => media_box.iter().map(|v| Object::Integer(*v)).collect::<Vec<_>>(),
        "Resources" => dictionary! {
            "Font" => dictionary! { "F0" => font_id },
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

#[test]
fn composite_font_decodes_through_to_unicode() {
    let doc = type0_document([0, 0, 200, 100]);
    let page = *doc.get_pages().get(&1).unwrap();
    let layout = PageLayout::from_page(&doc, page).unwrap();

    assert_eq!(layout.extract_text(), "CPF\n");
    let rects = layout.locate("CPF");
    assert_eq!(rects.len(), 1);
    // three glyphs of 500/1000 em at size 20
    assert!((rects[0].width() - 30.0).abs() < 1e-6);
    // baseline 50 on a 100 tall page, ascent 0.8 em
    assert!((rects[0].y0 - 34.0).abs() < 1e-6);
}

#[test]
fn page_coordinates_follow_an_offset_media_box() {
    let doc = type0_document([0, 20, 200, 120]);
    let page = *doc.get_pages().get(&1).unwrap();
    let layout = PageLayout::from_page(&doc, page).unwrap();

    assert_eq!(layout.media_box(), [0.0, 20.0, 200.0, 120.0]);
    let rect = layout.locate("CPF")[0];
    assert!((rect.y0 - 54.0).abs() < 1e-6);

    let [_, y, _, h] = layout.to_user_space(&rect);
    assert!((y - 46.0).abs() < 1e-6);
    assert!((h - 20.0).abs() < 1e-6);
}

#[test]
fn saved_document_reopens_with_the_same_layout() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("type0.pdf");
    type0_document([0, 0, 200, 100]).save(&path).unwrap();

    let document = PdfDocument::open(&path).unwrap();
    let page = document.first_page().unwrap();
    let layout = document.layout(page).unwrap();
    assert_eq!(layout.extract_text(), "CPF\n");
}
