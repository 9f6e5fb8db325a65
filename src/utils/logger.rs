//! Diagnostic logging setup

use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Installs the global subscriber writing diagnostics to stderr.
///
/// `RUST_LOG` takes precedence over `level` when set. A second install is
/// ignored.
pub fn init_logging(level: Level) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("idmask={}", level.as_str().to_ascii_lowercase()))
    });

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
