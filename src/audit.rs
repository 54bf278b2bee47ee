//! Append-only audit trail.
//!
//! Each entry is one line: `<timestamp> | <event> | <watermark>`. Appends are
//! serialized through a mutex so concurrent writers never interleave inside
//! a line. Nothing here reads, rewinds, or truncates the sink.
//!
//! Audit is best-effort: callers log an [`AuditError`] and carry on with
//! whatever operation they were performing.

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;

use crate::guard::GuardVerdict;

/// Errors from appending to the audit trail.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The sink could not be opened or written.
    #[error("audit write failed: {0}")]
    WriteFailed(#[from] std::io::Error),
    /// A previous writer panicked while holding the sink.
    #[error("audit lock poisoned")]
    LockPoisoned,
}

/// A single rendered audit entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// RFC 3339 UTC time of the append.
    pub timestamp: String,
    /// Event text, flattened to a single line.
    pub event: String,
    /// Provenance tag.
    pub watermark: String,
}

impl AuditEntry {
    /// Build an entry stamped with the current time.
    pub fn now(event: &str, watermark: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            event: single_line(event),
            watermark: watermark.to_owned(),
        }
    }
}

impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {} | {}", self.timestamp, self.event, self.watermark)
    }
}

fn single_line(event: &str) -> String {
    event.replace(['\r', '\n'], " ")
}

/// Shared append-only audit sink.
pub struct AuditLog {
    writer: Mutex<Box<dyn Write + Send>>,
    watermark: String,
}

impl fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditLog")
            .field("watermark", &self.watermark)
            .finish_non_exhaustive()
    }
}

impl AuditLog {
    /// Open (creating if needed) an audit file in append mode.
    ///
    /// Missing parent directories are created.
    pub fn open(path: impl AsRef<Path>, watermark: impl Into<String>) -> Result<Self, AuditError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self::from_writer(Box::new(file), watermark))
    }

    /// Create an audit log over an arbitrary writer (for testing).
    pub fn from_writer(writer: Box<dyn Write + Send>, watermark: impl Into<String>) -> Self {
        Self {
            writer: Mutex::new(writer),
            watermark: watermark.into(),
        }
    }

    /// Watermark stamped on each entry.
    pub fn watermark(&self) -> &str {
        &self.watermark
    }

    /// Append one event and return the entry as written.
    pub fn append(&self, event: &str) -> Result<AuditEntry, AuditError> {
        let entry = AuditEntry::now(event, &self.watermark);
        let mut writer = self.writer.lock().map_err(|_| AuditError::LockPoisoned)?;
        writeln!(writer, "{entry}")?;
        writer.flush()?;
        Ok(entry)
    }

    /// Append a security event for a flagged verdict; `Clear` writes nothing.
    pub fn record_verdict(&self, verdict: &GuardVerdict) -> Result<Option<AuditEntry>, AuditError> {
        match verdict {
            GuardVerdict::Clear => Ok(None),
            GuardVerdict::Flagged { layer, reason } => self
                .append(&format!("Security event: [{layer}] {reason}"))
                .map(Some),
        }
    }
}
