use std::fs;
use std::process::Output;

use assert_cmd::Command;
use pretty_assertions::assert_eq;

use crate::fixtures::{at, TestEnv, TestFixtures};

fn idmask(env: &TestEnv, extra: &[&str]) -> Output {
    Command::cargo_bin("idmask")
        .unwrap()
        .arg("--input")
        .arg(&env.input)
        .arg("--output")
        .arg(&env.output)
        .args(extra)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn full_run_prints_status_and_summary() {
    let env = TestEnv::new();
    env.write_input(
        "a.pdf",
        &TestFixtures::pdf_with_lines(&[at(72, 100, "CPF 123.456.789-09")]),
    );

    let output = idmask(&env, &[]);

    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.contains("[OK] a.pdf -> a.pdf (redactions: 1)"));
    assert!(text.contains("Done. Documents processed: 1. Redactions applied: 1."));
    assert!(env.output_path("a.pdf").exists());
}

#[test]
fn empty_input_is_not_an_error() {
    let env = TestEnv::new();

    let output = idmask(&env, &[]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "No PDF documents found.\n");
}

#[test]
fn missing_input_exits_with_failure() {
    let env = TestEnv::new();
    fs::remove_dir(&env.input).unwrap();

    let output = idmask(&env, &[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Input directory not found"));
}

#[test]
fn invalid_config_exits_with_usage_error() {
    let env = TestEnv::new();
    let config = env.input.parent().unwrap().join("config.yaml");
    fs::write(&config, "margin: -5\n").unwrap();

    let output = idmask(&env, &["--config", config.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("margin"));
}

#[test]
fn corrupt_document_is_reported_and_run_continues() {
    let env = TestEnv::new();
    env.write_input("broken.pdf", &TestFixtures::corrupt_pdf());
    env.write_input(
        "ok.pdf",
        &TestFixtures::pdf_with_lines(&[at(72, 100, "sem identificadores")]),
    );

    let output = idmask(&env, &[]);

    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.contains("[ERRO]"));
    assert!(text.contains("[OK] ok.pdf -> ok.pdf (redactions: 0)"));
    assert!(text.contains("Done. Documents processed: 1. Redactions applied: 0."));
}

#[test]
fn dry_run_leaves_output_untouched() {
    let env = TestEnv::new();
    env.write_input(
        "a.pdf",
        &TestFixtures::pdf_with_lines(&[at(72, 100, "RG 12.345.678-X")]),
    );

    let output = idmask(&env, &["--dry-run"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("[DRY-RUN] a.pdf (planned redactions: 1)"));
    assert!(!env.output.exists());
}
