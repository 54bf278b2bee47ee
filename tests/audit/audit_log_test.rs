//! File-backed audit trail behaviour.

use std::fs;

use echocore::audit::AuditLog;
use echocore::guard::GuardVerdict;

fn read(path: &std::path::Path) -> String {
    fs::read_to_string(path).expect("audit file should be readable")
}

#[test]
fn open_creates_missing_parent_directories() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let path = tmp.path().join("nested").join("logs").join("audit.log");

    let log = AuditLog::open(&path, "WM").expect("audit log should open");
    log.append("System startup").expect("append should succeed");

    assert!(path.exists());
    assert!(read(&path).contains(" | System startup | WM\n"));
}

#[test]
fn reopening_appends_instead_of_truncating() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let path = tmp.path().join("audit.log");

    AuditLog::open(&path, "WM")
        .expect("first open")
        .append("first")
        .expect("append");
    AuditLog::open(&path, "WM")
        .expect("second open")
        .append("second")
        .expect("append");

    let contents = read(&path);
    let events: Vec<&str> = contents
        .lines()
        .filter_map(|line| line.split(" | ").nth(1))
        .collect();
    assert_eq!(events, ["first", "second"]);
}

#[test]
fn returned_entry_matches_written_line() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let path = tmp.path().join("audit.log");
    let log = AuditLog::open(&path, "TEAM_ALPHA_vFUTURE").expect("open");

    let entry = log.append("Secret rotation").expect("append");
    assert_eq!(entry.event, "Secret rotation");
    assert_eq!(entry.watermark, "TEAM_ALPHA_vFUTURE");
    assert_eq!(read(&path), format!("{entry}\n"));
}

#[test]
fn flagged_verdict_is_recorded_as_security_event() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let path = tmp.path().join("audit.log");
    let log = AuditLog::open(&path, "WM").expect("open");

    let verdict = GuardVerdict::Flagged {
        layer: "architecture".to_owned(),
        reason: "security layer activated".to_owned(),
    };
    let entry = log
        .record_verdict(&verdict)
        .expect("record should succeed")
        .expect("flagged verdict should produce an entry");

    assert_eq!(entry.event, "Security event: [architecture] security layer activated");
    assert_eq!(read(&path).lines().count(), 1);
}

#[test]
fn concurrent_appends_never_interleave() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let path = tmp.path().join("audit.log");
    let log = AuditLog::open(&path, "WM").expect("open");

    std::thread::scope(|s| {
        for worker in 0..8 {
            let log = &log;
            s.spawn(move || {
                for n in 0..50 {
                    log.append(&format!("worker {worker} event {n}"))
                        .expect("append should succeed");
                }
            });
        }
    });

    let contents = read(&path);
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 400);
    for line in lines {
        let fields: Vec<&str> = line.split(" | ").collect();
        assert_eq!(fields.len(), 3, "malformed line {line:?}");
        assert!(fields[1].starts_with("worker "));
        assert_eq!(fields[2], "WM");
    }
}

#[test]
fn audit_log_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AuditLog>();
}
