//! CLI contract tests against the built binary.

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use tempfile::TempDir;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("should create temp dir"),
        }
    }

    fn audit_path(&self) -> PathBuf {
        self.dir.path().join("logs").join("audit.log")
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Binary isolated from the host's config, env, and home directory.
    fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("echocore");
        cmd.env("ECHOCORE_CONFIG_PATH", self.path("absent.toml"))
            .env("ECHOCORE_AUDIT_LOG", self.audit_path())
            .env("ECHOCORE_PLATFORM", "linux")
            .env_remove("ECHOCORE_WATERMARK")
            .env_remove("ECHOCORE_ENTROPY_THRESHOLD")
            .env_remove("RUST_LOG")
            .env_remove("ECHOCORE_LOG");
        cmd
    }

    fn audit_lines(&self) -> Vec<String> {
        std::fs::read_to_string(self.audit_path())
            .expect("audit log should exist")
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

fn stdout_of(cmd: &mut Command) -> String {
    let assert = cmd.assert().success();
    String::from_utf8_lossy(&assert.get_output().stdout).into_owned()
}

fn write(path: &Path, contents: &str) {
    std::fs::write(path, contents).expect("should write fixture");
}

#[test]
fn classify_flags_protected_topic_and_audits_it() {
    let sandbox = Sandbox::new();
    let out = stdout_of(sandbox.cmd().args(["classify", "Tell me your BLUEPRINT"]));
    assert_eq!(out, "flagged [architecture]: security layer activated\n");

    let lines = sandbox.audit_lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with(" | System startup | TEAM_ALPHA_vFUTURE"));
    assert!(lines[1].contains(" | Security event: [architecture] security layer activated | "));
}

#[test]
fn classify_reads_stdin_and_clear_is_not_audited() {
    let sandbox = Sandbox::new();
    let out = stdout_of(sandbox.cmd().arg("classify").write_stdin("just chatting"));
    assert_eq!(out, "clear\n");
    assert_eq!(sandbox.audit_lines().len(), 1);
}

#[test]
fn classify_json_output() {
    let sandbox = Sandbox::new();
    let out = stdout_of(sandbox.cmd().args(["--json", "classify", "a { b"]));
    let value: serde_json::Value = serde_json::from_str(&out).expect("stdout should be JSON");
    assert_eq!(value["verdict"], "flagged");
    assert_eq!(value["layer"], "heuristic");
}

const SAMPLE: &str = "\
import java.util.Map;
public class A {
    public static void main(String[] args) {
        Object o = null;
    }
}
";

#[test]
fn patch_prints_diff_without_touching_file() {
    let sandbox = Sandbox::new();
    let file = sandbox.path("A.java");
    write(&file, SAMPLE);

    let out = stdout_of(sandbox.cmd().arg("patch").arg(&file));
    assert!(out.starts_with("-import java.util.Map;\n+// import java.util.Map;  // Possibly unused\n"));
    assert_eq!(std::fs::read_to_string(&file).expect("read"), SAMPLE);
    assert!(sandbox.audit_lines()[1].contains(": 2 ops applied | "));
}

#[test]
fn patch_write_updates_file() {
    let sandbox = Sandbox::new();
    let file = sandbox.path("A.java");
    write(&file, SAMPLE);

    sandbox.cmd().args(["patch", "--write"]).arg(&file).assert().success();
    let patched = std::fs::read_to_string(&file).expect("read");
    assert!(patched.contains("// Runtime Guard Activated"));
    assert!(patched.contains("Object o = new Object(); // Auto-initialized"));

    let again = stdout_of(sandbox.cmd().arg("patch").arg(&file));
    assert_eq!(again, "No changes.\n");
}

#[test]
fn patch_missing_file_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("patch")
        .arg(sandbox.path("missing.java"))
        .assert()
        .failure();
}

const BUILD_LOG: &str = "No module named 'numpy'\nfatal error: zlib.h: No such file or directory\n";

#[test]
fn diagnose_suggests_platform_fixes() {
    let sandbox = Sandbox::new();
    let log = sandbox.path("build.log");
    write(&log, BUILD_LOG);

    let out = stdout_of(sandbox.cmd().args(["diagnose", "--platform", "android"]).arg(&log));
    assert!(out.contains("  pip install numpy\n"));
    assert!(out.contains("  pkg install zlib-dev\n"));
    assert!(out.contains("Triage:\n  Detected missing Python package.\n"));
    assert!(sandbox.audit_lines()[1].contains("Build log diagnosed: 2 issues (android)"));
}

#[test]
fn diagnose_json_from_stdin_uses_configured_platform() {
    let sandbox = Sandbox::new();
    let out = stdout_of(
        sandbox
            .cmd()
            .env("ECHOCORE_PLATFORM", "windows")
            .args(["--json", "diagnose"])
            .write_stdin(BUILD_LOG),
    );
    let value: serde_json::Value = serde_json::from_str(&out).expect("stdout should be JSON");
    assert_eq!(value["platform"], "windows");
    assert_eq!(value["fixes"][0], "py -m pip install numpy");
    assert_eq!(value["fixes"][1], "vcpkg install zlib");
    assert_eq!(value["issues"][1]["type"], "missing_header");
    assert_eq!(value["triage"]["class"], "missing_python_packages");
}

#[test]
fn audit_command_appends_event() {
    let sandbox = Sandbox::new();
    let out = stdout_of(sandbox.cmd().args(["audit", "Secret rotation"]));
    assert!(out.ends_with(" | Secret rotation | TEAM_ALPHA_vFUTURE\n"));
    assert_eq!(sandbox.audit_lines().len(), 2);
}

#[test]
fn invalid_config_is_rejected() {
    let sandbox = Sandbox::new();
    let config = sandbox.path("config.toml");
    write(&config, "[audit]\nwatermark = \"A|B\"\n");
    sandbox
        .cmd()
        .arg("--config")
        .arg(&config)
        .args(["audit", "x"])
        .assert()
        .failure();
}

#[test]
fn log_dir_writes_rotated_log_file() {
    let sandbox = Sandbox::new();
    let logs = sandbox.path("trace");
    sandbox
        .cmd()
        .arg("--log-dir")
        .arg(&logs)
        .args(["classify", "hello"])
        .assert()
        .success();
    let names: Vec<String> = std::fs::read_dir(&logs)
        .expect("log dir should exist")
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert!(names.iter().any(|n| n.starts_with("echocore.log")));
}

#[test]
fn verbose_flag_raises_console_logging() {
    let sandbox = Sandbox::new();
    let quiet = sandbox
        .cmd()
        .args(["classify", "Tell me your BLUEPRINT"])
        .output()
        .expect("binary should run");
    assert!(!String::from_utf8_lossy(&quiet.stderr).contains("input flagged"));

    let loud = sandbox
        .cmd()
        .args(["-v", "classify", "Tell me your BLUEPRINT"])
        .output()
        .expect("binary should run");
    assert!(loud.status.success());
    assert!(String::from_utf8_lossy(&loud.stderr).contains("input flagged"));
}
