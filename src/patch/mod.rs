//! Pattern-based source patcher.
//!
//! [`PatchEngine::analyze`] scans the original text for three code smells
//! and returns [`PatchOp`]s: byte ranges into that text plus replacement
//! strings. The original is never mutated. [`apply`] rebuilds a new string
//! from the original and the ops, in descending start order, after checking
//! that no two ops overlap. [`PatchEngine::run`] chains analysis, apply, the
//! entry-point runtime guard, and a line diff.

mod diff;
mod entry_guard;
mod rules;

use std::fmt;
use std::ops::Range;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::PatchConfig;

pub use diff::line_diff;
pub use entry_guard::GUARD_MARKER;
pub use rules::{DIVISION_NOTE, NULL_NOTE, UNUSED_IMPORT_NOTE};

use entry_guard::EntryGuard;
use rules::Detectors;

/// Which detector produced a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchRule {
    /// Import whose leaf identifier is never used afterwards.
    UnusedImport,
    /// Assignment dividing by a literal zero.
    DivisionByZero,
    /// Assignment of `null`.
    NullAssignment,
}

impl fmt::Display for PatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UnusedImport => "unused_import",
            Self::DivisionByZero => "division_by_zero",
            Self::NullAssignment => "null_assignment",
        })
    }
}

/// One replacement over the original text.
///
/// `start..end` is a half-open byte range on `char` boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchOp {
    /// First byte replaced.
    pub start: usize,
    /// One past the last byte replaced.
    pub end: usize,
    /// Text written in place of the range.
    pub replacement: String,
    /// Detector that proposed the op.
    pub rule: PatchRule,
}

impl PatchOp {
    /// The op's byte range.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Output of [`PatchEngine::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchResult {
    /// Patched and guarded text.
    pub patched_text: String,
    /// Ops that were applied, by descending start offset.
    pub applied_ops: Vec<PatchOp>,
    /// Line diff of the original against `patched_text`.
    pub diff_text: String,
}

/// Errors from analysing or applying patches.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// Two ops claim overlapping ranges.
    #[error("patch conflict: {earlier:?} overlaps {later:?}")]
    Conflict {
        /// Range of the op starting first.
        earlier: Range<usize>,
        /// Range of the op starting second.
        later: Range<usize>,
    },
    /// An op falls outside the text or splits a character.
    #[error("patch range {start}..{end} is invalid for text of {len} bytes")]
    OutOfBounds {
        /// Op start.
        start: usize,
        /// Op end.
        end: usize,
        /// Text length in bytes.
        len: usize,
    },
    /// A detector pattern failed to compile.
    #[error("invalid patch pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Apply `ops` to `source`, returning a new string.
///
/// Ops are validated, ordered by descending start, checked pairwise for
/// overlap, then spliced into a copy of the original. Two ops with the same
/// start conflict even when one is empty, since their order would be
/// ambiguous.
pub fn apply(source: &str, ops: &[PatchOp]) -> Result<String, PatchError> {
    let ordered = order_ops(source, ops)?;

    // Splice right to left: each op only touches bytes above the next one.
    let mut pieces: Vec<&str> = Vec::with_capacity(ordered.len().saturating_mul(2).saturating_add(1));
    let mut cursor = source.len();
    for op in &ordered {
        pieces.push(&source[op.end..cursor]);
        pieces.push(op.replacement.as_str());
        cursor = op.start;
    }
    pieces.push(&source[..cursor]);

    Ok(pieces.into_iter().rev().collect())
}

/// Validate `ops` against `source` and sort them by descending start.
fn order_ops<'a>(source: &str, ops: &'a [PatchOp]) -> Result<Vec<&'a PatchOp>, PatchError> {
    for op in ops {
        let valid = op.start <= op.end
            && op.end <= source.len()
            && source.is_char_boundary(op.start)
            && source.is_char_boundary(op.end);
        if !valid {
            return Err(PatchError::OutOfBounds {
                start: op.start,
                end: op.end,
                len: source.len(),
            });
        }
    }

    let mut ordered: Vec<&PatchOp> = ops.iter().collect();
    ordered.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));

    for pair in ordered.windows(2) {
        let (later, earlier) = (pair[0], pair[1]);
        if earlier.end > later.start || earlier.start == later.start {
            return Err(PatchError::Conflict {
                earlier: earlier.range(),
                later: later.range(),
            });
        }
    }
    Ok(ordered)
}

/// Detects code smells, applies patches, and guards the entry point.
///
/// Holds only compiled patterns; share it freely across threads.
#[derive(Debug, Clone)]
pub struct PatchEngine {
    config: PatchConfig,
    detectors: Detectors,
    entry_guard: EntryGuard,
}

impl PatchEngine {
    /// Build an engine with the given rule toggles.
    pub fn new(config: PatchConfig) -> Result<Self, PatchError> {
        Ok(Self {
            config,
            detectors: Detectors::new()?,
            entry_guard: EntryGuard::new()?,
        })
    }

    /// Engine with every rule and the entry guard enabled.
    pub fn with_defaults() -> Result<Self, PatchError> {
        Self::new(PatchConfig::default())
    }

    /// Detect patches over the original text, by ascending start offset.
    ///
    /// Rules run independently; their ops may collide, which [`apply`]
    /// reports as a conflict.
    pub fn analyze(&self, source: &str) -> Result<Vec<PatchOp>, PatchError> {
        let mut ops = Vec::new();
        if self.config.unused_imports {
            ops.extend(self.detectors.unused_imports(source)?);
        }
        if self.config.division_by_zero {
            ops.extend(self.detectors.divisions_by_zero(source));
        }
        if self.config.null_assignment {
            ops.extend(self.detectors.null_assignments(source));
        }
        ops.sort_by_key(|op| (op.start, op.end));
        debug!(count = ops.len(), "patch analysis complete");
        Ok(ops)
    }

    /// Analyse, apply, guard the entry point, and diff against the original.
    pub fn run(&self, source: &str) -> Result<PatchResult, PatchError> {
        let ops = self.analyze(source)?;
        let patched = apply(source, &ops)?;
        let patched_text = if self.config.guard_entry_point {
            self.entry_guard.wrap(&patched)
        } else {
            patched
        };
        let diff_text = line_diff(source, &patched_text);

        let mut applied_ops = ops;
        applied_ops.sort_by(|a, b| b.start.cmp(&a.start));
        info!(applied = applied_ops.len(), "source patched");

        Ok(PatchResult {
            patched_text,
            applied_ops,
            diff_text,
        })
    }
}
