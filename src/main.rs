//! idmask command-line interface
//!
//! Redacts CPF/RG-shaped identifiers from the first page of every PDF under
//! an input directory, mirroring the tree into an output directory.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command, ValueEnum};
use idmask::config::{RedactionConfig, VerificationMode};
use idmask::error::Result;
use idmask::{init_logging, report, BatchRunner, PatternCatalog};
use tracing::{info, Level};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    /// Error messages only
    Error,
    /// Warning and error messages (default)
    Warn,
    /// Info, warning, and error messages
    Info,
    /// Debug and all messages
    Debug,
    /// Trace and all messages (most verbose)
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

fn main() -> ExitCode {
    let matches = build_cli().get_matches();

    let level = matches
        .get_one::<LogLevel>("verbose")
        .copied()
        .unwrap_or(LogLevel::Warn);
    init_logging(level.into());

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let input = required_path(matches, "input");
    let output = required_path(matches, "output");
    let config = build_config(matches)?;
    let catalog = PatternCatalog::compile()?;

    info!(
        input = %input.display(),
        output = %output.display(),
        dry_run = config.dry_run,
        "starting redaction run"
    );

    let outcome = BatchRunner::new(&catalog, &config).run(&input, &output)?;

    let stdout = io::stdout();
    report::print_outcome(&mut stdout.lock(), &outcome)?;

    if let Some(path) = matches.get_one::<PathBuf>("report") {
        report::write_report(path, &outcome)?;
    }
    Ok(())
}

fn required_path(matches: &ArgMatches, id: &str) -> PathBuf {
    matches
        .get_one::<PathBuf>(id)
        .cloned()
        .unwrap_or_default()
}

/// Config file values first, then command-line overrides.
fn build_config(matches: &ArgMatches) -> Result<RedactionConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => RedactionConfig::load(path)?,
        None => RedactionConfig::default(),
    };

    if let Some(glob) = matches.get_one::<String>("glob") {
        config.glob = glob.clone();
    }
    if matches.get_flag("no-recursive") {
        config.recursive = false;
    }
    if let Some(label) = matches.get_one::<String>("label") {
        config.label = label.clone();
    }
    if let Some(margin) = matches.get_one::<f64>("margin") {
        config.margin = *margin;
    }
    if let Some(jobs) = matches.get_one::<usize>("jobs") {
        config.jobs = Some(*jobs);
    }
    if let Some(mode) = matches.get_one::<VerificationMode>("verification") {
        config.verification = *mode;
    }
    if matches.get_flag("dry-run") {
        config.dry_run = true;
    }

    config.validate()?;
    Ok(config)
}

fn build_cli() -> Command {
    Command::new("idmask")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Redacts national ID numbers from the first page of PDF documents")
        .long_about(
            "Scans the first page of every PDF under the input directory for CPF and RG \
             shaped numbers, burns opaque redactions over them, writes the sanitized copy \
             to the same relative path under the output directory, and re-checks the \
             written file for anything left behind.",
        )
        // Input/Output
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Source directory of PDF documents")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Destination directory for sanitized documents")
                .required(true),
        )
        .arg(
            Arg::new("glob")
                .short('g')
                .long("glob")
                .value_name("PATTERN")
                .help("File-name glob; use a pattern with '/' to match relative paths [default: *.pdf]"),
        )
        .arg(
            Arg::new("no-recursive")
                .long("no-recursive")
                .action(ArgAction::SetTrue)
                .help("Only look at the top level of the input directory"),
        )
        // Configuration
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file (JSON/YAML)"),
        )
        .arg(
            Arg::new("label")
                .long("label")
                .value_name("TEXT")
                .help("Protected label marking the region never redacted [default: ID Único]"),
        )
        .arg(
            Arg::new("margin")
                .long("margin")
                .value_name("UNITS")
                .value_parser(value_parser!(f64))
                .help("Safety margin above the protected label [default: 20]"),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Number of documents processed in parallel [default: CPU count]"),
        )
        .arg(
            Arg::new("verification")
                .long("verification")
                .value_parser(value_parser!(VerificationMode))
                .help("How leftover matches are judged after saving [default: full-text]"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Plan redactions and report counts without writing anything"),
        )
        // Output
        .arg(
            Arg::new("report")
                .short('r')
                .long("report")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Write a JSON summary of the run"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .value_parser(value_parser!(LogLevel))
                .default_value("warn")
                .help("Diagnostic log level on stderr"),
        )
}
