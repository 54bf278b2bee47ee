//! Platform-aware remediation for parsed log issues.

use crate::catalog::{HeaderLibrary, HEADER_SIGNATURES};
use crate::config::Platform;

use super::{group_by_kind, LogIssue};

/// Closing suggestion appended whenever at least one issue was found.
pub const CONTAINERIZED_BUILD_HINT: &str = "AI Suggestion: Review dependency graph and consider using containerized builds for reproducibility.";

const PACKAGE_MANAGER_HINT: &str = "Please ensure your system has a functional package manager (apt, pkg, dnf, or yum) and correct PATH.";

/// Remediation strings for `issues`.
///
/// Issues are regrouped by kind first, kinds in order of first appearance,
/// so fixes for the same kind sit together. Each issue's fixes are contiguous. A non-empty issue list always ends
/// with [`CONTAINERIZED_BUILD_HINT`].
pub fn suggest_fixes(issues: &[LogIssue], platform: Platform) -> Vec<String> {
    let mut fixes = Vec::new();
    for issue in group_by_kind(issues) {
        match issue {
            LogIssue::MissingModule { name } => {
                fixes.push(module_install_command(name, platform));
            }
            LogIssue::MissingHeader { header, .. } => {
                fixes.push(header_install_command(header, platform));
            }
            LogIssue::PackageManagerFailure { .. } => {
                fixes.push(PACKAGE_MANAGER_HINT.to_owned());
                if let Some(hint) = package_manager_retry(platform) {
                    fixes.push(hint.to_owned());
                }
            }
        }
    }
    if !issues.is_empty() {
        fixes.push(CONTAINERIZED_BUILD_HINT.to_owned());
    }
    fixes
}

/// Install command for a missing Python module.
///
/// The module path is used as printed. A dotted path names a submodule whose
/// distribution is not derivable from the path, so it is not guessed at.
pub fn module_install_command(name: &str, platform: Platform) -> String {
    match platform {
        Platform::Windows => format!("py -m pip install {name}"),
        Platform::Android | Platform::Linux | Platform::Other => format!("pip install {name}"),
    }
}

fn header_install_command(header: &str, platform: Platform) -> String {
    let Some(sig) = HEADER_SIGNATURES.iter().find(|s| s.header == header) else {
        return format!("Install the development package that provides {header}");
    };
    let (termux, apt, vcpkg) = match sig.library {
        HeaderLibrary::Zlib => ("zlib-dev", "zlib1g-dev", Some("zlib")),
        HeaderLibrary::Libffi => ("libffi-dev", "libffi-dev", Some("libffi")),
        HeaderLibrary::Openssl => ("openssl-dev", "libssl-dev", Some("openssl")),
        HeaderLibrary::Python => ("python-dev", "python3-dev", None),
    };
    match platform {
        Platform::Android => format!("pkg install {termux}"),
        Platform::Linux | Platform::Other => format!("sudo apt-get install {apt}"),
        Platform::Windows => match vcpkg {
            Some(port) => format!("vcpkg install {port}"),
            None => "Reinstall Python from python.org with the development headers (include/) selected"
                .to_owned(),
        },
    }
}

fn package_manager_retry(platform: Platform) -> Option<&'static str> {
    match platform {
        Platform::Android => Some("Try: pkg update && pkg upgrade"),
        Platform::Linux => Some("Try: sudo apt-get update"),
        Platform::Windows => Some("Try: winget source update"),
        Platform::Other => None,
    }
}
