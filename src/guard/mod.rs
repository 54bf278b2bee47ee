//! Three-stage input threat classifier.
//!
//! Free text runs through an ordered pipeline of independent checks:
//! protected-topic patterns, character entropy, then a coarse heuristic.
//! The first check that flags decides the verdict; later checks never run.
//!
//! The heuristic layer is a placeholder. It catches a keyword and a handful
//! of structural characters and is trivially bypassed; do not treat a
//! `Clear` verdict as a security guarantee.
//!
//! Classification is total: no input makes it fail, so there is no error
//! path that could turn into a flag (fail-open).

pub mod entropy;

use std::fmt;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::catalog::PatternCatalog;
use crate::config::{EchoConfig, GuardConfig};

pub use entropy::shannon_entropy;

/// Reason reported when a protected topic matches.
pub const PATTERN_REASON: &str = "security layer activated";
/// Reason reported by the entropy layer.
pub const ENTROPY_REASON: &str = "entropy overflow - possible exploit attempt";
/// Reason reported by the heuristic layer.
pub const HEURISTIC_REASON: &str = "suspicious input flagged";

/// Layer name reported by the entropy check.
pub const ENTROPY_LAYER: &str = "entropy";
/// Layer name reported by the heuristic check.
pub const HEURISTIC_LAYER: &str = "heuristic";

/// Characters the heuristic layer treats as structural punctuation.
const STRUCTURAL_PATTERN: &str = r"[{}\[\];]";

/// Outcome of classifying one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum GuardVerdict {
    /// No layer flagged the input.
    Clear,
    /// A layer flagged the input.
    Flagged {
        /// Topic name for pattern matches, otherwise the layer name.
        layer: String,
        /// Human-readable reason.
        reason: String,
    },
}

impl GuardVerdict {
    /// Whether any layer flagged the input.
    pub fn is_flagged(&self) -> bool {
        matches!(self, Self::Flagged { .. })
    }
}

impl fmt::Display for GuardVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clear => f.write_str("clear"),
            Self::Flagged { layer, reason } => write!(f, "flagged [{layer}]: {reason}"),
        }
    }
}

/// Errors building a guard.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// A heuristic pattern failed to compile.
    #[error("invalid guard pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// One layer's positive finding.
struct Flag {
    layer: String,
    reason: &'static str,
}

type Layer = fn(&ThreatGuard, &str) -> Option<Flag>;

/// Layers in evaluation order.
const LAYERS: [Layer; 3] = [
    ThreatGuard::pattern_check,
    ThreatGuard::entropy_check,
    ThreatGuard::heuristic_check,
];

/// Classifies free text against the protection catalog and heuristics.
///
/// Holds only immutable compiled state; share it freely across threads.
#[derive(Debug, Clone)]
pub struct ThreatGuard {
    catalog: PatternCatalog,
    entropy_threshold: f64,
    entropy_min_chars: usize,
    keywords: Option<Regex>,
    structural: Regex,
}

impl ThreatGuard {
    /// Build a guard over `catalog` with the given tuning.
    pub fn new(catalog: PatternCatalog, config: &GuardConfig) -> Result<Self, GuardError> {
        let keywords = if config.anomaly_keywords.is_empty() {
            None
        } else {
            let alternation = config
                .anomaly_keywords
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!("(?i){alternation}"))?)
        };
        Ok(Self {
            catalog,
            entropy_threshold: config.entropy_threshold,
            entropy_min_chars: config.entropy_min_chars,
            keywords,
            structural: Regex::new(STRUCTURAL_PATTERN)?,
        })
    }

    /// Guard over the built-in catalog with default tuning.
    pub fn with_defaults() -> Result<Self, GuardError> {
        Self::new(PatternCatalog::builtin().clone(), &GuardConfig::default())
    }

    /// Guard over the built-in plus configured topics.
    pub fn from_config(config: &EchoConfig) -> Result<Self, GuardError> {
        Self::new(
            PatternCatalog::with_extra_topics(&config.guard.topics),
            &config.guard,
        )
    }

    /// Classify `text`. Pure: never writes to the audit log.
    pub fn classify(&self, text: &str) -> GuardVerdict {
        for layer in LAYERS {
            if let Some(flag) = layer(self, text) {
                debug!(layer = %flag.layer, reason = flag.reason, "input flagged");
                return GuardVerdict::Flagged {
                    layer: flag.layer,
                    reason: flag.reason.to_owned(),
                };
            }
        }
        GuardVerdict::Clear
    }

    /// The catalog this guard checks against.
    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    fn pattern_check(&self, text: &str) -> Option<Flag> {
        let lowered = text.to_lowercase();
        self.catalog
            .topics()
            .iter()
            .find(|topic| topic.matches_lowered(&lowered))
            .map(|topic| Flag {
                layer: topic.name().to_owned(),
                reason: PATTERN_REASON,
            })
    }

    fn entropy_check(&self, text: &str) -> Option<Flag> {
        // Length gate counts chars and short-circuits once past the minimum.
        if text.chars().nth(self.entropy_min_chars).is_none() {
            return None;
        }
        (shannon_entropy(text) > self.entropy_threshold).then(|| Flag {
            layer: ENTROPY_LAYER.to_owned(),
            reason: ENTROPY_REASON,
        })
    }

    fn heuristic_check(&self, text: &str) -> Option<Flag> {
        let keyword_hit = self.keywords.as_ref().is_some_and(|re| re.is_match(text));
        (keyword_hit || self.structural.is_match(text)).then(|| Flag {
            layer: HEURISTIC_LAYER.to_owned(),
            reason: HEURISTIC_REASON,
        })
    }
}
