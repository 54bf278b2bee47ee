//! One-shot triage of a failed build's stderr.
//!
//! Coarser than [`BuildDiagnostics::parse_log`]: picks the single most
//! likely failure class, first match wins.

use serde::Serialize;

use crate::config::Platform;

use super::{module_install_command, suggest_fixes, BuildDiagnostics, LogIssue};

/// Most likely failure class of a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum Triage {
    /// The JDK is missing or broken.
    JdkMissing,
    /// Python packages are missing.
    MissingPythonPackages {
        /// Module names found in the output.
        modules: Vec<String>,
    },
    /// `buildozer.spec` was not found.
    BuildSpecMissing,
    /// Native headers or libraries are missing (linker or include failures).
    NativeLibraries {
        /// Header issues found in the output, possibly empty.
        issues: Vec<LogIssue>,
    },
    /// Nothing recognisable.
    Unrecognized,
}

impl BuildDiagnostics {
    /// Classify `stderr` into one [`Triage`] class.
    pub fn triage(&self, stderr: &str) -> Triage {
        let lower = stderr.to_lowercase();

        if lower.contains("openjdk") {
            return Triage::JdkMissing;
        }
        if lower.contains("missing requirements") || lower.contains("no module named") {
            let modules = self
                .parse_log(stderr)
                .into_iter()
                .filter_map(|issue| match issue {
                    LogIssue::MissingModule { name } => Some(name),
                    _ => None,
                })
                .collect();
            return Triage::MissingPythonPackages { modules };
        }
        if lower.contains("buildozer.spec") && lower.contains("not found") {
            return Triage::BuildSpecMissing;
        }
        let native_mention = ["zlib", "ffi", "ssl", "python"]
            .iter()
            .any(|lib| lower.contains(lib));
        if lower.contains("error: linker command failed")
            || (lower.contains("undefined reference to") && native_mention)
        {
            let issues = self
                .parse_log(stderr)
                .into_iter()
                .filter(|issue| matches!(issue, LogIssue::MissingHeader { .. }))
                .collect();
            return Triage::NativeLibraries { issues };
        }
        Triage::Unrecognized
    }
}

impl Triage {
    /// Human-readable diagnosis followed by suggested commands.
    pub fn advice(&self, platform: Platform) -> Vec<String> {
        match self {
            Self::JdkMissing => vec![
                "Detected JDK issue.".to_owned(),
                format!("Suggestion: {}", jdk_install_command(platform)),
            ],
            Self::MissingPythonPackages { modules } => {
                let mut lines = vec!["Detected missing Python package.".to_owned()];
                lines.extend(
                    modules
                        .iter()
                        .map(|m| format!("Suggestion: {}", module_install_command(m, platform))),
                );
                lines
            }
            Self::BuildSpecMissing => vec![
                "buildozer.spec is missing. Critical blocker.".to_owned(),
                "Suggestion: run `buildozer init` in your project directory or copy a template."
                    .to_owned(),
            ],
            Self::NativeLibraries { issues } => {
                let mut lines =
                    vec!["Detected missing C/C++ development headers or libraries.".to_owned()];
                let installs: Vec<String> = suggest_fixes(issues, platform)
                    .into_iter()
                    .filter(|fix| fix.contains("install"))
                    .collect();
                if installs.is_empty() {
                    lines.push(bulk_native_install(platform).to_owned());
                } else {
                    lines.extend(installs);
                }
                lines
            }
            Self::Unrecognized => {
                vec!["Unrecognized error. Recommend manual inspection of the build log.".to_owned()]
            }
        }
    }
}

fn jdk_install_command(platform: Platform) -> &'static str {
    match platform {
        Platform::Android => "pkg install openjdk-17 -y",
        Platform::Windows => "winget install Microsoft.OpenJDK.17",
        Platform::Linux | Platform::Other => "sudo apt install openjdk-17 -y",
    }
}

fn bulk_native_install(platform: Platform) -> &'static str {
    match platform {
        Platform::Android => "Run `pkg install zlib-dev libffi openssl-dev python-dev` or equivalent.",
        Platform::Windows => "Run `vcpkg install zlib libffi openssl` or equivalent.",
        Platform::Linux | Platform::Other => {
            "Run `sudo apt-get install zlib1g-dev libffi-dev libssl-dev python3-dev` or equivalent."
        }
    }
}
