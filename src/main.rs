//! echocore CLI entry point.
//!
//! Provides `classify`, `patch`, `diagnose`, and `audit` subcommands. Every
//! invocation records a startup event in the audit trail; audit failures are
//! logged and never abort the command.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};

use echocore::audit::AuditLog;
use echocore::config::{EchoConfig, Platform};
use echocore::diagnostics::{suggest_fixes, BuildDiagnostics};
use echocore::guard::ThreatGuard;
use echocore::logging;
use echocore::patch::PatchEngine;

/// echocore: threat classification, source patching, and build diagnostics.
#[derive(Parser)]
#[command(name = "echocore", version, about)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write rotated JSON logs to this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// More log output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Classify text (or stdin) for threats.
    Classify {
        /// Text to classify; read from stdin when absent.
        text: Option<String>,
    },
    /// Detect and fix risky patterns in a source file.
    Patch {
        /// Source file to analyse.
        file: PathBuf,
        /// Write the patched text back to the file.
        #[arg(long)]
        write: bool,
    },
    /// Explain a failed build log (or stdin).
    Diagnose {
        /// Build log file; read from stdin when absent.
        log: Option<PathBuf>,
        /// Platform to tailor fixes for (android, linux, windows, other).
        #[arg(long)]
        platform: Option<Platform>,
    },
    /// Append a manual event to the audit trail.
    Audit {
        /// Event text.
        event: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _logging_guard = match &cli.log_dir {
        Some(dir) => Some(logging::init_production(dir, cli.verbose)?),
        None => {
            logging::init_cli(cli.verbose);
            None
        }
    };

    let config =
        EchoConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    debug!(platform = %config.platform(), "configuration loaded");

    let audit = open_audit(&config);
    record(audit.as_ref(), "System startup");

    match cli.command {
        Command::Classify { text } => handle_classify(&config, audit.as_ref(), text, cli.json),
        Command::Patch { file, write } => {
            handle_patch(&config, audit.as_ref(), &file, write, cli.json)
        }
        Command::Diagnose { log, platform } => handle_diagnose(
            audit.as_ref(),
            log.as_deref(),
            platform.unwrap_or_else(|| config.platform()),
            cli.json,
        ),
        Command::Audit { event } => handle_audit(audit.as_ref(), &event),
    }
}

/// Open the configured audit log, or warn and run without one.
fn open_audit(config: &EchoConfig) -> Option<AuditLog> {
    let path = match config.audit_log_path() {
        Ok(path) => path,
        Err(e) => {
            warn!(error = %e, "cannot resolve audit log path, auditing disabled");
            return None;
        }
    };
    match AuditLog::open(&path, config.audit.watermark.clone()) {
        Ok(log) => Some(log),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot open audit log, auditing disabled");
            None
        }
    }
}

/// Best-effort audit append.
fn record(audit: Option<&AuditLog>, event: &str) {
    if let Some(log) = audit {
        if let Err(e) = log.append(event) {
            warn!(error = %e, event = %event, "failed to write audit event");
        }
    }
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(p) => {
            std::fs::read_to_string(p).with_context(|| format!("failed to read {}", p.display()))
        }
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn handle_classify(
    config: &EchoConfig,
    audit: Option<&AuditLog>,
    text: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let text = match text {
        Some(t) => t,
        None => read_input(None)?,
    };
    let guard = ThreatGuard::from_config(config).context("failed to build threat guard")?;
    let verdict = guard.classify(&text);

    if verdict.is_flagged() {
        info!(verdict = %verdict, "input flagged");
        if let Some(log) = audit {
            if let Err(e) = log.record_verdict(&verdict) {
                warn!(error = %e, "failed to audit verdict");
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string(&verdict)?);
    } else {
        println!("{verdict}");
    }
    Ok(())
}

fn handle_patch(
    config: &EchoConfig,
    audit: Option<&AuditLog>,
    file: &Path,
    write: bool,
    json: bool,
) -> anyhow::Result<()> {
    let source = read_input(Some(file))?;
    let engine = PatchEngine::new(config.patch.clone()).context("failed to build patch engine")?;
    let result = engine
        .run(&source)
        .with_context(|| format!("failed to patch {}", file.display()))?;

    if write && result.patched_text != source {
        std::fs::write(file, &result.patched_text)
            .with_context(|| format!("failed to write {}", file.display()))?;
        info!(path = %file.display(), "patched file written");
    }
    record(
        audit,
        &format!(
            "Patched {}: {} ops applied",
            file.display(),
            result.applied_ops.len()
        ),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.diff_text.is_empty() {
        println!("No changes.");
    } else {
        print!("{}", result.diff_text);
    }
    Ok(())
}

fn handle_diagnose(
    audit: Option<&AuditLog>,
    log: Option<&Path>,
    platform: Platform,
    json: bool,
) -> anyhow::Result<()> {
    let text = read_input(log)?;
    let diagnostics = BuildDiagnostics::new().context("failed to build diagnostics")?;
    let issues = diagnostics.parse_log(&text);
    let fixes = suggest_fixes(&issues, platform);
    let triage = diagnostics.triage(&text);
    let advice = triage.advice(platform);

    record(
        audit,
        &format!("Build log diagnosed: {} issues ({platform})", issues.len()),
    );

    if json {
        let report = serde_json::json!({
            "platform": platform,
            "issues": issues,
            "fixes": fixes,
            "triage": triage,
            "advice": advice,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if issues.is_empty() {
        println!("No known issues found.");
    } else {
        println!("Issues:");
        for issue in &issues {
            println!("  - {issue}");
        }
        println!("Suggestions:");
        for fix in &fixes {
            println!("  {fix}");
        }
    }
    println!("Triage:");
    for line in &advice {
        println!("  {line}");
    }
    Ok(())
}

fn handle_audit(audit: Option<&AuditLog>, event: &str) -> anyhow::Result<()> {
    let log = audit.context("audit log is unavailable")?;
    let entry = log.append(event).context("failed to write audit event")?;
    println!("{entry}");
    Ok(())
}
