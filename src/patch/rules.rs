//! Code-smell detectors.
//!
//! Every detector scans the original text independently and returns
//! [`PatchOp`]s keyed by byte offsets into that text. A detector never sees
//! another detector's output.

use regex::Regex;

use super::{PatchError, PatchOp, PatchRule};

/// Annotation appended to commented-out imports.
pub const UNUSED_IMPORT_NOTE: &str = "Possibly unused";
/// Annotation appended to neutralised divisions.
pub const DIVISION_NOTE: &str = "Division by zero prevented";
/// Annotation appended to auto-initialised assignments.
pub const NULL_NOTE: &str = "Auto-initialized";

/// Compiled detector patterns.
#[derive(Debug, Clone)]
pub(crate) struct Detectors {
    import: Regex,
    division: Regex,
    null_assign: Regex,
}

impl Detectors {
    pub(crate) fn new() -> Result<Self, PatchError> {
        Ok(Self {
            // Line-leading only, so commented-out imports are not matched again.
            import: Regex::new(r"(?m)^[ \t]*(import\s+(?:static\s+)?([\w.*]+)\s*;)")?,
            division: Regex::new(r"(\w+)\s*=\s*[^;=]+?/\s*0\s*;")?,
            null_assign: Regex::new(r"(\w+)\s*=\s*null\s*;")?,
        })
    }

    /// Imports whose leaf identifier never appears after the statement.
    ///
    /// A wildcard import names no identifier and is always reported.
    pub(crate) fn unused_imports(&self, source: &str) -> Result<Vec<PatchOp>, PatchError> {
        let mut ops = Vec::new();
        for caps in self.import.captures_iter(source) {
            let (Some(stmt), Some(path)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let leaf = path.as_str().rsplit('.').next().unwrap_or_default();
            let used = if leaf.is_empty() || leaf == "*" {
                false
            } else {
                let usage = Regex::new(&format!(r"\b{}\b", regex::escape(leaf)))?;
                usage.find_at(source, stmt.end()).is_some()
            };
            if !used {
                let follows = code_follows(source, stmt.end());
                ops.push(PatchOp {
                    start: stmt.start(),
                    end: stmt.end(),
                    replacement: format!(
                        "{}  {}",
                        comment(stmt.as_str(), follows),
                        comment(UNUSED_IMPORT_NOTE, follows)
                    ),
                    rule: PatchRule::UnusedImport,
                });
            }
        }
        Ok(ops)
    }

    /// `target = expr / 0;` becomes a null sentinel assignment.
    ///
    /// The computation is discarded on purpose: the patched program cannot
    /// fault here, and it no longer computes the original value either.
    pub(crate) fn divisions_by_zero(&self, source: &str) -> Vec<PatchOp> {
        self.division
            .captures_iter(source)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let target = caps.get(1)?;
                Some(PatchOp {
                    start: target.start(),
                    end: whole.end(),
                    replacement: format!(
                        "{} = null; {}",
                        target.as_str(),
                        comment(DIVISION_NOTE, code_follows(source, whole.end()))
                    ),
                    rule: PatchRule::DivisionByZero,
                })
            })
            .collect()
    }

    /// `target = null;` becomes a default-constructed object.
    ///
    /// Sentinels written by the division rule are left alone.
    pub(crate) fn null_assignments(&self, source: &str) -> Vec<PatchOp> {
        self.null_assign
            .captures_iter(source)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let target = caps.get(1)?;
                if is_division_sentinel(rest_of_line(source, whole.end())) {
                    return None;
                }
                Some(PatchOp {
                    start: whole.start(),
                    end: whole.end(),
                    replacement: format!(
                        "{} = new Object(); {}",
                        target.as_str(),
                        comment(NULL_NOTE, code_follows(source, whole.end()))
                    ),
                    rule: PatchRule::NullAssignment,
                })
            })
            .collect()
    }
}

/// `text` as a Java comment. A line comment would swallow code that
/// follows on the same line, so that case gets a block comment.
fn comment(text: &str, code_follows: bool) -> String {
    if code_follows {
        format!("/* {text} */")
    } else {
        format!("// {text}")
    }
}

fn code_follows(source: &str, from: usize) -> bool {
    !rest_of_line(source, from).trim().is_empty()
}

fn is_division_sentinel(rest: &str) -> bool {
    let rest = rest.trim_start();
    rest.strip_prefix("//")
        .or_else(|| rest.strip_prefix("/*"))
        .is_some_and(|note| note.trim_start().starts_with(DIVISION_NOTE))
}

fn rest_of_line(source: &str, from: usize) -> &str {
    let tail = source.get(from..).unwrap_or_default();
    tail.split('\n').next().unwrap_or_default()
}
