//! Tracing setup for the echocore CLI.
//!
//! Console output always goes to stderr so verdicts, diffs and JSON reports
//! on stdout stay machine-readable. `--log-dir` adds a daily-rotated JSON
//! file next to the console layer.
//!
//! The filter comes from [`LOG_ENV`], then `RUST_LOG`, then the `-v` count
//! (see [`default_directive`]).

use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Environment variable holding an explicit filter directive.
pub const LOG_ENV: &str = "ECHOCORE_LOG";

/// File name prefix of rotated log files; the date is appended.
pub const LOG_FILE_PREFIX: &str = "echocore.log";

/// Keeps the non-blocking file writer alive. Dropping it flushes the file.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// Filter directive for a `-v` count.
///
/// Other crates stay at `warn`; only echocore's own targets get louder until
/// `-vvv`, which traces everything.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "warn,echocore=info",
        2 => "warn,echocore=debug",
        _ => "trace",
    }
}

fn env_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)))
}

/// Console logging plus `{logs_dir}/echocore.log.YYYY-MM-DD` in JSON.
///
/// The file always records at least echocore's `info` events, so audits of
/// a run can be matched against its log even when the console is quiet.
///
/// # Errors
///
/// Returns an error if the logs directory cannot be created or a global
/// subscriber is already installed.
pub fn init_production(logs_dir: &Path, verbosity: u8) -> anyhow::Result<LoggingGuard> {
    std::fs::create_dir_all(logs_dir).with_context(|| {
        format!("failed to create logs directory {}", logs_dir.display())
    })?;

    let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(env_filter(verbosity.max(1)));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity >= 2)
        .with_filter(env_filter(verbosity));

    tracing_subscriber::registry()
        .with(json_layer)
        .with(console_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(LoggingGuard { _guard: guard })
}

/// Console-only logging for one-shot commands. Quiet (`warn`) unless `-v`.
pub fn init_cli(verbosity: u8) {
    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(verbosity >= 2)
        .try_init();
}
