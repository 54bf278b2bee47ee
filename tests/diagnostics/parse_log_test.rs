//! Log scanning for known failure signatures.

use echocore::diagnostics::{BuildDiagnostics, LogIssue, PACKAGE_MANAGER_REASON};

fn diagnostics() -> BuildDiagnostics {
    BuildDiagnostics::new().expect("diagnostics should build")
}

fn module(name: &str) -> LogIssue {
    LogIssue::MissingModule {
        name: name.to_owned(),
    }
}

const NUMPY_ZLIB_LOG: &str = "\
Traceback (most recent call last):
  File \"setup.py\", line 3, in <module>
ModuleNotFoundError: No module named 'numpy'
gcc -c src/compress.c -o build/compress.o
src/compress.c:4:10: fatal error: zlib.h: No such file or directory
compilation terminated.
";

#[test]
fn module_and_header_are_found_in_log_order() {
    let issues = diagnostics().parse_log(NUMPY_ZLIB_LOG);
    assert_eq!(
        issues,
        vec![
            module("numpy"),
            LogIssue::MissingHeader {
                header: "zlib.h".to_owned(),
                reason: "zlib headers must be installed".to_owned(),
            },
        ]
    );
}

#[test]
fn header_before_module_is_reported_first() {
    let log = "fatal error: Python.h: No such file or directory\nNo module named 'cython'";
    let issues = diagnostics().parse_log(log);
    assert!(matches!(&issues[0], LogIssue::MissingHeader { header, .. } if header == "Python.h"));
    assert_eq!(issues[1], module("cython"));
}

#[test]
fn every_module_occurrence_is_reported() {
    let log = "No module named 'six'\nretrying\nNo module named 'six'\nNo module named 'attr'";
    let issues = diagnostics().parse_log(log);
    assert_eq!(issues, vec![module("six"), module("six"), module("attr")]);
}

#[test]
fn dotted_module_names_are_captured_whole() {
    let issues = diagnostics().parse_log("No module named 'google.protobuf'");
    assert_eq!(issues, vec![module("google.protobuf")]);
}

#[test]
fn each_header_is_reported_once() {
    let log = "openssl/ssl.h: No such file\nopenssl/ssl.h: No such file";
    let issues = diagnostics().parse_log(log);
    assert_eq!(issues.len(), 1);
}

#[test]
fn package_manager_failure_is_case_insensitive() {
    for log in [
        "Error: Couldn't detect or use apt",
        "error: COULDN'T DETECT OR USE APT, pkg or dnf",
        "Cannot detect or use a package manager",
    ] {
        let issues = diagnostics().parse_log(log);
        assert_eq!(
            issues,
            vec![LogIssue::PackageManagerFailure {
                reason: PACKAGE_MANAGER_REASON.to_owned(),
            }],
            "log {log:?}"
        );
    }
}

#[test]
fn unknown_or_empty_log_has_no_issues() {
    assert!(diagnostics().parse_log("").is_empty());
    assert!(diagnostics().parse_log("BUILD SUCCESSFUL in 12s").is_empty());
}

#[test]
fn issues_render_for_humans() {
    assert_eq!(module("numpy").to_string(), "missing Python module 'numpy'");
    let header = LogIssue::MissingHeader {
        header: "ffi.h".to_owned(),
        reason: "libffi not found".to_owned(),
    };
    assert_eq!(header.to_string(), "missing header ffi.h: libffi not found");
}

#[test]
fn issues_serialize_with_type_tag() {
    let json = serde_json::to_value(module("numpy")).expect("issue should serialize");
    assert_eq!(json["type"], "missing_module");
    assert_eq!(json["name"], "numpy");
}
