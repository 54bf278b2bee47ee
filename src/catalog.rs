//! Static table of protection topics and build-failure signatures.
//!
//! The built-in catalog is initialised once per process and shared
//! read-only. Configuration can produce an extended copy with extra topics
//! appended after the built-in ones; the built-in table is never mutated.

use std::sync::LazyLock;

use serde::Serialize;

use crate::config::TopicConfig;

/// A named group of trigger phrases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtectionTopic {
    name: String,
    trigger_phrases: Vec<String>,
}

impl ProtectionTopic {
    /// Create a topic. Phrases are stored lowercased for case-insensitive matching.
    pub fn new<I, S>(name: impl Into<String>, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            trigger_phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Topic name reported when one of its phrases matches.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lowercased trigger phrases, in declaration order.
    pub fn trigger_phrases(&self) -> &[String] {
        &self.trigger_phrases
    }

    /// Whether any phrase occurs in `lowered`, which must already be lowercase.
    pub fn matches_lowered(&self, lowered: &str) -> bool {
        self.trigger_phrases
            .iter()
            .any(|phrase| lowered.contains(phrase.as_str()))
    }
}

/// A header file whose absence is a known build-failure signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSignature {
    /// Header literal as it appears in compiler output.
    pub header: &'static str,
    /// Human-readable cause.
    pub reason: &'static str,
    /// Library that owns the header.
    pub library: HeaderLibrary,
}

/// Library owning a known header, used to pick install commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderLibrary {
    /// zlib compression library.
    Zlib,
    /// libffi foreign function interface.
    Libffi,
    /// OpenSSL.
    Openssl,
    /// CPython development headers.
    Python,
}

/// Known missing-header signatures, in reporting priority order.
pub const HEADER_SIGNATURES: &[HeaderSignature] = &[
    HeaderSignature {
        header: "zlib.h",
        reason: "zlib headers must be installed",
        library: HeaderLibrary::Zlib,
    },
    HeaderSignature {
        header: "ffi.h",
        reason: "libffi not found",
        library: HeaderLibrary::Libffi,
    },
    HeaderSignature {
        header: "openssl/ssl.h",
        reason: "openssl missing",
        library: HeaderLibrary::Openssl,
    },
    HeaderSignature {
        header: "Python.h",
        reason: "Python development headers missing",
        library: HeaderLibrary::Python,
    },
];

/// Protection topics and header signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternCatalog {
    topics: Vec<ProtectionTopic>,
}

static BUILTIN: LazyLock<PatternCatalog> = LazyLock::new(|| PatternCatalog {
    topics: vec![
        ProtectionTopic::new(
            "architecture",
            [
                "blueprint",
                "source code",
                "internal design",
                "how are you built",
                "reverse engineer",
                "echo architecture",
                "recreate echo",
            ],
        ),
        ProtectionTopic::new(
            "capabilities",
            ["self modify", "improve yourself", "expand abilities"],
        ),
    ],
});

impl PatternCatalog {
    /// The process-wide built-in catalog.
    pub fn builtin() -> &'static PatternCatalog {
        &BUILTIN
    }

    /// Catalog made of exactly these topics.
    pub fn from_topics(topics: Vec<ProtectionTopic>) -> Self {
        Self { topics }
    }

    /// Built-in topics followed by the configured ones.
    pub fn with_extra_topics(extra: &[TopicConfig]) -> Self {
        let mut topics = BUILTIN.topics.clone();
        topics.extend(
            extra
                .iter()
                .map(|t| ProtectionTopic::new(t.name.clone(), &t.phrases)),
        );
        Self { topics }
    }

    /// Topics in evaluation order.
    pub fn topics(&self) -> &[ProtectionTopic] {
        &self.topics
    }

    /// Known header signatures.
    pub fn header_signatures(&self) -> &'static [HeaderSignature] {
        HEADER_SIGNATURES
    }
}
