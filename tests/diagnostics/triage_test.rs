//! Single-class build triage.

use echocore::config::Platform;
use echocore::diagnostics::{BuildDiagnostics, LogIssue, Triage};

fn diagnostics() -> BuildDiagnostics {
    BuildDiagnostics::new().expect("diagnostics should build")
}

#[test]
fn matching_is_case_insensitive() {
    assert_eq!(diagnostics().triage("ERROR: OpenJDK 17 required"), Triage::JdkMissing);
    assert_eq!(
        diagnostics().triage("MISSING REQUIREMENTS: kivy"),
        Triage::MissingPythonPackages { modules: vec![] }
    );
}

#[test]
fn build_spec_needs_both_markers() {
    let d = diagnostics();
    assert_eq!(d.triage("buildozer.spec not found"), Triage::BuildSpecMissing);
    assert_eq!(d.triage("reading buildozer.spec"), Triage::Unrecognized);
}

#[test]
fn linker_failure_carries_header_issues() {
    let log = "fatal error: ffi.h: No such file or directory\nerror: linker command failed";
    let triage = diagnostics().triage(log);
    assert_eq!(
        triage,
        Triage::NativeLibraries {
            issues: vec![LogIssue::MissingHeader {
                header: "ffi.h".to_owned(),
                reason: "libffi not found".to_owned(),
            }],
        }
    );
    let advice = triage.advice(Platform::Linux);
    assert_eq!(advice[1], "sudo apt-get install libffi-dev");
    assert_eq!(advice.len(), 2);
}

#[test]
fn jdk_advice_is_platform_specific() {
    let advice = Triage::JdkMissing.advice(Platform::Android);
    assert_eq!(advice[1], "Suggestion: pkg install openjdk-17 -y");
    let advice = Triage::JdkMissing.advice(Platform::Windows);
    assert!(advice[1].contains("winget"));
}

#[test]
fn unrecognized_recommends_manual_inspection() {
    let advice = diagnostics().triage("segfault").advice(Platform::Other);
    assert_eq!(advice.len(), 1);
    assert!(advice[0].starts_with("Unrecognized error"));
}
