//! Build-failure diagnostics.
//!
//! Scans raw build logs for known failure signatures and maps each
//! [`LogIssue`] to platform-aware remediation commands. Unknown log content
//! is not an error; it yields no issues.

mod fixes;
mod triage;

use std::{fmt, mem};

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::catalog::HEADER_SIGNATURES;

pub use fixes::{module_install_command, suggest_fixes, CONTAINERIZED_BUILD_HINT};
pub use triage::Triage;

/// Reason attached to package-manager failures.
pub const PACKAGE_MANAGER_REASON: &str = "Cannot detect or use a package manager.";

/// A known failure signature found in a log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogIssue {
    /// A Python import failed.
    MissingModule {
        /// Module path as printed by Python.
        name: String,
    },
    /// A C header was not found by the compiler.
    MissingHeader {
        /// Header literal, e.g. `zlib.h`.
        header: String,
        /// Human-readable cause.
        reason: String,
    },
    /// The build tool could not find a usable package manager.
    PackageManagerFailure {
        /// Human-readable cause.
        reason: String,
    },
}

impl fmt::Display for LogIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingModule { name } => write!(f, "missing Python module '{name}'"),
            Self::MissingHeader { header, reason } => write!(f, "missing header {header}: {reason}"),
            Self::PackageManagerFailure { reason } => write!(f, "package manager: {reason}"),
        }
    }
}

/// Errors building the diagnostics engine.
#[derive(Debug, thiserror::Error)]
pub enum DiagnosticsError {
    /// A signature pattern failed to compile.
    #[error("invalid diagnostics pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Extracts known failure signatures from build logs.
#[derive(Debug, Clone)]
pub struct BuildDiagnostics {
    missing_module: Regex,
    package_manager: Regex,
}

impl BuildDiagnostics {
    /// Compile the signature patterns.
    pub fn new() -> Result<Self, DiagnosticsError> {
        Ok(Self {
            missing_module: Regex::new(r"No module named '([\w.]+)'")?,
            package_manager: Regex::new(
                r"(?i)couldn['\u{2019}]t detect or use apt|cannot detect or use a package manager",
            )?,
        })
    }

    /// Every known issue in `log`.
    ///
    /// Issues of one kind are reported together, in log order. The kinds
    /// themselves follow the order in which each first appears.
    ///
    /// Missing modules are reported once per occurrence. Each header is
    /// reported at most once, and only when the log also contains
    /// `No such file` or `fatal error` somewhere.
    pub fn parse_log(&self, log: &str) -> Vec<LogIssue> {
        let mut found: Vec<(usize, LogIssue)> = Vec::new();

        for caps in self.missing_module.captures_iter(log) {
            if let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) {
                found.push((
                    whole.start(),
                    LogIssue::MissingModule {
                        name: name.as_str().to_owned(),
                    },
                ));
            }
        }

        if log.contains("No such file") || log.contains("fatal error") {
            for sig in HEADER_SIGNATURES {
                if let Some(pos) = log.find(sig.header) {
                    found.push((
                        pos,
                        LogIssue::MissingHeader {
                            header: sig.header.to_owned(),
                            reason: sig.reason.to_owned(),
                        },
                    ));
                }
            }
        }

        if let Some(m) = self.package_manager.find(log) {
            found.push((
                m.start(),
                LogIssue::PackageManagerFailure {
                    reason: PACKAGE_MANAGER_REASON.to_owned(),
                },
            ));
        }

        found.sort_by_key(|(pos, _)| *pos);
        debug!(issues = found.len(), "build log parsed");
        group_by_kind(found.iter().map(|(_, issue)| issue))
            .into_iter()
            .cloned()
            .collect()
    }
}

/// Stable regroup of `issues` by kind, kinds ranked by first appearance.
pub(crate) fn group_by_kind<'a>(
    issues: impl IntoIterator<Item = &'a LogIssue>,
) -> Vec<&'a LogIssue> {
    let mut kinds = Vec::new();
    let mut ranked: Vec<(usize, &LogIssue)> = issues
        .into_iter()
        .map(|issue| {
            let kind = mem::discriminant(issue);
            let rank = match kinds.iter().position(|k| *k == kind) {
                Some(rank) => rank,
                None => {
                    kinds.push(kind);
                    kinds.len().saturating_sub(1)
                }
            };
            (rank, issue)
        })
        .collect();
    ranked.sort_by_key(|(rank, _)| *rank);
    ranked.into_iter().map(|(_, issue)| issue).collect()
}
