use std::fs;

use idmask::{
    DocumentPipeline, PatternCatalog, RedactionConfig, Stage, Verification, VerificationMode,
};
use pretty_assertions::assert_eq;

use crate::fixtures::{at, first_page_text, TestEnv, TestFixtures};

fn has_digit_run(text: &str) -> bool {
    text.chars().filter(char::is_ascii_digit).count() >= 7
}

#[test]
fn strict_identifier_without_label_is_redacted_and_verified() {
    let env = TestEnv::new();
    let source = env.write_input(
        "a.pdf",
        &TestFixtures::pdf_with_lines(&[at(72, 100, "Nome: Maria"), at(72, 130, "CPF: 123.456.789-09")]),
    );
    let original = fs::read(&source).unwrap();
    let destination = env.output_path("a.pdf");

    let catalog = PatternCatalog::compile().unwrap();
    let config = RedactionConfig::default();
    let result = DocumentPipeline::new(&catalog, &config)
        .process(&source, &destination)
        .unwrap();

    assert_eq!(result.redactions, 1);
    assert_eq!(result.verification, Verification::Clean);

    let text = first_page_text(&destination);
    assert!(text.contains("Nome: Maria"));
    assert!(text.contains("CPF:"));
    assert!(!has_digit_run(&text));
    assert_eq!(fs::read(&source).unwrap(), original);
}

#[test]
fn label_band_keeps_protected_number_and_flags_it() {
    let env = TestEnv::new();
    let source = env.write_input(
        "b.pdf",
        &TestFixtures::pdf_with_lines(&[
            at(300, 60, "12345678901"),
            at(72, 85, "12345678901"),
            at(72, 100, "ID Único"),
        ]),
    );
    let destination = env.output_path("b.pdf");

    let catalog = PatternCatalog::compile().unwrap();
    let config = RedactionConfig::default();
    let result = DocumentPipeline::new(&catalog, &config)
        .process(&source, &destination)
        .unwrap();

    // both loose patterns hit the eligible run; duplicates collapse
    assert_eq!(result.redactions, 1);
    // the protected number is still on the page
    assert_eq!(result.verification, Verification::Residual);
    assert_eq!(first_page_text(&destination), "12345678901\nID Único\n");
}

#[test]
fn zone_aware_verification_accepts_protected_number() {
    let env = TestEnv::new();
    let source = env.write_input(
        "b.pdf",
        &TestFixtures::pdf_with_lines(&[at(72, 85, "12345678901"), at(72, 100, "ID Único")]),
    );
    let destination = env.output_path("b.pdf");

    let catalog = PatternCatalog::compile().unwrap();
    let config = RedactionConfig {
        verification: VerificationMode::ZoneAware,
        ..RedactionConfig::default()
    };
    let result = DocumentPipeline::new(&catalog, &config)
        .process(&source, &destination)
        .unwrap();

    assert_eq!(result.redactions, 0);
    assert_eq!(result.verification, Verification::Clean);
}

#[test]
fn sanitized_output_is_a_fixed_point() {
    let env = TestEnv::new();
    let source = env.write_input(
        "c.pdf",
        &TestFixtures::pdf_with_lines(&[at(72, 100, "RG 12.345.678-X e CPF 98765432100")]),
    );
    let first = env.output_path("c.pdf");
    let second = env.output_path("again/c.pdf");

    let catalog = PatternCatalog::compile().unwrap();
    let config = RedactionConfig::default();
    let pipeline = DocumentPipeline::new(&catalog, &config);

    let initial = pipeline.process(&source, &first).unwrap();
    assert_eq!(initial.redactions, 2);
    assert_eq!(initial.verification, Verification::Clean);

    let rerun = pipeline.process(&first, &second).unwrap();
    assert_eq!(rerun.redactions, 0);
    assert_eq!(rerun.verification, Verification::Clean);
}

#[test]
fn identifier_ending_a_line_is_redacted() {
    let env = TestEnv::new();
    let source = env.write_input(
        "rg.pdf",
        &TestFixtures::pdf_with_lines(&[at(72, 100, "RG 12345678"), at(72, 130, "Nome Maria")]),
    );
    let destination = env.output_path("rg.pdf");

    let catalog = PatternCatalog::compile().unwrap();
    let config = RedactionConfig::default();
    let result = DocumentPipeline::new(&catalog, &config)
        .process(&source, &destination)
        .unwrap();

    assert_eq!(result.redactions, 1);
    assert_eq!(result.verification, Verification::Clean);
    let text = first_page_text(&destination);
    assert!(text.contains("Nome Maria"));
    assert!(!has_digit_run(&text));
}

#[test]
fn repeated_runs_agree() {
    let env = TestEnv::new();
    let source = env.write_input(
        "d.pdf",
        &TestFixtures::pdf_with_lines(&[
            at(72, 100, "123.456.789-09"),
            at(72, 200, "1234567-8"),
            at(72, 300, "sem dados"),
        ]),
    );

    let catalog = PatternCatalog::compile().unwrap();
    let config = RedactionConfig::default();
    let pipeline = DocumentPipeline::new(&catalog, &config);

    let a = pipeline.process(&source, &env.output_path("run1/d.pdf")).unwrap();
    let b = pipeline.process(&source, &env.output_path("run2/d.pdf")).unwrap();

    assert_eq!(a.redactions, b.redactions);
    assert_eq!(a.redactions, 2);
    assert_eq!(
        first_page_text(&env.output_path("run1/d.pdf")),
        first_page_text(&env.output_path("run2/d.pdf"))
    );
}

#[test]
fn only_the_first_page_is_touched() {
    let env = TestEnv::new();
    let source = env.write_input(
        "e.pdf",
        &TestFixtures::pdf_with_pages(&[
            &[at(72, 100, "CPF 123.456.789-09")],
            &[at(72, 100, "CPF 987.654.321-00")],
        ]),
    );
    let destination = env.output_path("e.pdf");

    let catalog = PatternCatalog::compile().unwrap();
    let config = RedactionConfig::default();
    let result = DocumentPipeline::new(&catalog, &config)
        .process(&source, &destination)
        .unwrap();
    assert_eq!(result.redactions, 1);

    let document = lopdf::Document::load(&destination).unwrap();
    let pages = document.get_pages();
    assert_eq!(pages.len(), 2);
    let second = document.get_page_content(pages[&2]).unwrap();
    let second = String::from_utf8_lossy(&second);
    assert!(second.contains("987.654.321-00"));
}

#[test]
fn dry_run_writes_nothing() {
    let env = TestEnv::new();
    let source = env.write_input(
        "f.pdf",
        &TestFixtures::pdf_with_lines(&[at(72, 100, "CPF 123.456.789-09")]),
    );
    let destination = env.output_path("f.pdf");

    let catalog = PatternCatalog::compile().unwrap();
    let config = RedactionConfig {
        dry_run: true,
        ..RedactionConfig::default()
    };
    let result = DocumentPipeline::new(&catalog, &config)
        .process(&source, &destination)
        .unwrap();

    assert_eq!(result.redactions, 1);
    assert_eq!(result.verification, Verification::Skipped);
    assert!(!destination.exists());
}

#[test]
fn corrupt_document_fails_at_open() {
    let env = TestEnv::new();
    let source = env.write_input("broken.pdf", &TestFixtures::corrupt_pdf());

    let catalog = PatternCatalog::compile().unwrap();
    let config = RedactionConfig::default();
    let err = DocumentPipeline::new(&catalog, &config)
        .process(&source, &env.output_path("broken.pdf"))
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Opened));
    assert!(!env.output_path("broken.pdf").exists());
}
