//! Runtime guard around the program entry point.
//!
//! Wraps the body of `public static void main(...) { ... }` in a
//! `try { ... } catch (Exception e) { ... }` region so a fault inside it is
//! reported instead of terminating the process.

use regex::Regex;
use tracing::{debug, warn};

use super::PatchError;

/// Marker comment placed on the first line inside the guard.
pub const GUARD_MARKER: &str = "// Runtime Guard Activated";

/// Compiled entry-point locator.
#[derive(Debug, Clone)]
pub(crate) struct EntryGuard {
    entry: Regex,
}

impl EntryGuard {
    pub(crate) fn new() -> Result<Self, PatchError> {
        Ok(Self {
            entry: Regex::new(r"(?s)public\s+static\s+void\s+main\s*\(.*?\)\s*\{")?,
        })
    }

    /// Wrap the first entry block, or return the text unchanged.
    ///
    /// Unchanged when there is no entry block, when it is already guarded,
    /// or when its closing brace cannot be found.
    pub(crate) fn wrap(&self, code: &str) -> String {
        let Some(open) = self.entry.find(code) else {
            return code.to_owned();
        };
        let body_start = open.end();
        if is_guarded(&code[body_start..]) {
            debug!("entry point already guarded");
            return code.to_owned();
        }
        let Some(close) = matching_brace(code, body_start) else {
            warn!(offset = body_start, "entry block has no closing brace, not guarding");
            return code.to_owned();
        };

        let indent = line_indent(code, open.start());
        let inner = format!("{indent}    ");
        let body = code[body_start..close].trim_end_matches([' ', '\t']);

        let mut out = String::with_capacity(code.len().saturating_add(256));
        out.push_str(&code[..body_start]);
        out.push('\n');
        out.push_str(&format!("{inner}try {{\n{inner}    {GUARD_MARKER}\n"));
        match body.strip_prefix("\r\n").or_else(|| body.strip_prefix('\n')) {
            // Body already starts on its own line: keep its layout.
            Some(lines) => out.push_str(lines),
            // Code shares the line with `{`: move it under the marker.
            None => {
                let same_line = body.trim_start();
                if !same_line.is_empty() {
                    out.push_str(&format!("{inner}    {same_line}"));
                }
            }
        }
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&format!(
            "{inner}}} catch (Exception e) {{\n\
             {inner}    System.out.println(\"Runtime exception caught: \" + e);\n\
             {inner}    e.printStackTrace();\n\
             {inner}}}\n"
        ));
        out.push_str(indent);
        out.push_str(&code[close..]);
        out
    }
}

/// Leading whitespace of the line containing byte `at`.
fn line_indent(code: &str, at: usize) -> &str {
    let line_start = code[..at].rfind('\n').map_or(0, |nl| nl.saturating_add(1));
    let line = &code[line_start..];
    let text = line.trim_start_matches([' ', '\t']);
    &line[..line.len().saturating_sub(text.len())]
}

fn is_guarded(body: &str) -> bool {
    body.trim_start()
        .strip_prefix("try {")
        .is_some_and(|rest| rest.trim_start().starts_with(GUARD_MARKER))
}

/// Byte offset of the `}` closing a block whose body starts at `from`.
///
/// String and char literals and comments are skipped so braces inside them
/// do not count.
fn matching_brace(code: &str, from: usize) -> Option<usize> {
    let bytes = code.as_bytes();
    let mut depth: usize = 1;
    let mut i = from;
    while let Some(&b) = bytes.get(i) {
        match b {
            b'"' | b'\'' => i = skip_literal(bytes, i, b),
            b'/' if bytes.get(i.saturating_add(1)) == Some(&b'/') => {
                i = skip_until(bytes, i, b"\n");
            }
            b'/' if bytes.get(i.saturating_add(1)) == Some(&b'*') => {
                i = skip_until(bytes, i.saturating_add(2), b"*/");
            }
            b'{' => depth = depth.saturating_add(1),
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i = i.saturating_add(1);
    }
    None
}

/// Index of the closing quote of a literal opened at `start`.
fn skip_literal(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start.saturating_add(1);
    while let Some(&b) = bytes.get(i) {
        if b == b'\\' {
            i = i.saturating_add(2);
            continue;
        }
        if b == quote || b == b'\n' {
            return i;
        }
        i = i.saturating_add(1);
    }
    i
}

/// Index of the last byte of the first `end` at or after `from`.
fn skip_until(bytes: &[u8], from: usize, end: &[u8]) -> usize {
    let tail = bytes.get(from..).unwrap_or_default();
    match tail.windows(end.len()).position(|w| w == end) {
        Some(pos) => from
            .saturating_add(pos)
            .saturating_add(end.len())
            .saturating_sub(1),
        None => bytes.len(),
    }
}
