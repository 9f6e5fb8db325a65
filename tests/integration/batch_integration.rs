use std::fs;

use idmask::{report, BatchOutcome, BatchRunner, DocumentOutcome, Error, PatternCatalog, RedactionConfig};
use pretty_assertions::assert_eq;

use crate::fixtures::{at, TestEnv, TestFixtures};

fn identifier_pdf() -> Vec<u8> {
    TestFixtures::pdf_with_lines(&[at(72, 100, "CPF 123.456.789-09")])
}

#[test]
fn batch_mirrors_tree_and_isolates_failures() {
    let env = TestEnv::new();
    env.write_input("a.pdf", &identifier_pdf());
    env.write_input("broken.pdf", &TestFixtures::corrupt_pdf());
    env.write_input("sub/b.pdf", &identifier_pdf());
    env.write_input("notes.txt", b"CPF 123.456.789-09");

    let catalog = PatternCatalog::compile().unwrap();
    let config = RedactionConfig {
        jobs: Some(2),
        ..RedactionConfig::default()
    };
    let outcome = BatchRunner::new(&catalog, &config)
        .run(&env.input, &env.output)
        .unwrap();

    let BatchOutcome::Completed { outcomes, summary } = &outcome else {
        panic!("expected a completed batch");
    };

    let sources: Vec<_> = outcomes
        .iter()
        .map(|o| match o {
            DocumentOutcome::Completed(result) => result.source.clone(),
            DocumentOutcome::Failed { source, .. } => source.clone(),
        })
        .collect();
    assert_eq!(
        sources,
        vec![
            env.input.join("a.pdf"),
            env.input.join("broken.pdf"),
            env.input.join("sub/b.pdf"),
        ]
    );

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.total_redactions, 2);
    assert_eq!(summary.failures.len(), 1);
    assert!(env.output_path("a.pdf").exists());
    assert!(env.output_path("sub/b.pdf").exists());
    assert!(!env.output_path("broken.pdf").exists());
    assert!(!env.output_path("notes.txt").exists());
}

#[test]
fn empty_input_reports_no_documents() {
    let env = TestEnv::new();

    let catalog = PatternCatalog::compile().unwrap();
    let config = RedactionConfig::default();
    let outcome = BatchRunner::new(&catalog, &config)
        .run(&env.input, &env.output)
        .unwrap();

    assert!(matches!(outcome, BatchOutcome::NoInputs));
    assert!(!env.output.exists());
}

#[test]
fn top_level_only_when_not_recursive() {
    let env = TestEnv::new();
    env.write_input("a.pdf", &identifier_pdf());
    env.write_input("sub/b.pdf", &identifier_pdf());

    let catalog = PatternCatalog::compile().unwrap();
    let config = RedactionConfig {
        recursive: false,
        ..RedactionConfig::default()
    };
    let outcome = BatchRunner::new(&catalog, &config)
        .run(&env.input, &env.output)
        .unwrap();

    let BatchOutcome::Completed { summary, .. } = outcome else {
        panic!("expected a completed batch");
    };
    assert_eq!(summary.processed, 1);
    assert!(!env.output_path("sub/b.pdf").exists());
}

#[test]
fn json_report_describes_the_run() {
    let env = TestEnv::new();
    env.write_input("a.pdf", &identifier_pdf());
    env.write_input("broken.pdf", &TestFixtures::corrupt_pdf());

    let catalog = PatternCatalog::compile().unwrap();
    let config = RedactionConfig::default();
    let outcome = BatchRunner::new(&catalog, &config)
        .run(&env.input, &env.output)
        .unwrap();

    let report_path = env.output_path("report.json");
    report::write_report(&report_path, &outcome).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(json["processed"], 1);
    assert_eq!(json["total_redactions"], 1);
    assert_eq!(json["dry_run"], false);
    assert_eq!(json["results"][0]["verification"], "clean");
    assert_eq!(json["failures"][0]["stage"], "opened");
}

#[test]
fn console_report_lists_every_document() {
    let env = TestEnv::new();
    env.write_input("a.pdf", &identifier_pdf());

    let catalog = PatternCatalog::compile().unwrap();
    let config = RedactionConfig::default();
    let outcome = BatchRunner::new(&catalog, &config)
        .run(&env.input, &env.output)
        .unwrap();

    let mut out = Vec::new();
    report::print_outcome(&mut out, &outcome).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "[OK] a.pdf -> a.pdf (redactions: 1)\n\nDone. Documents processed: 1. Redactions applied: 1.\n"
    );
}

#[test]
fn missing_input_directory_is_fatal() {
    let env = TestEnv::new();

    let catalog = PatternCatalog::compile().unwrap();
    let config = RedactionConfig::default();
    let err = BatchRunner::new(&catalog, &config)
        .run(&env.input.join("missing"), &env.output)
        .unwrap_err();

    assert!(matches!(err, Error::InputNotFound(_)));
    assert_eq!(err.exit_code(), 1);
}
