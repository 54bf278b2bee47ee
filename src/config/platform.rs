//! Host platform classification.
//!
//! Detected once at startup from the OS name and environment, then carried
//! inside [`EchoConfig`](super::EchoConfig). Nothing reads it from global state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Platform a remediation command is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Android, including Termux userlands.
    Android,
    /// Desktop or server Linux (Crostini included).
    Linux,
    /// Microsoft Windows.
    Windows,
    /// Anything else (macOS, BSDs, unknown).
    Other,
}

/// Error returned when a platform name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown platform '{0}' (expected android, linux, windows or other)")]
pub struct PlatformParseError(pub String);

impl Platform {
    /// Detect the platform of the running process.
    pub fn detect() -> Self {
        Self::detect_with(std::env::consts::OS, |key| std::env::var(key).ok())
    }

    /// Detect the platform from an OS name and an env resolver (for testing).
    ///
    /// Android wins when the OS name says so, or when both `ANDROID_ROOT`
    /// and `PREFIX` are set (Termux reports itself as Linux).
    pub fn detect_with(os: &str, env: impl Fn(&str) -> Option<String>) -> Self {
        let os = os.to_lowercase();
        if os.contains("android") || (env("ANDROID_ROOT").is_some() && env("PREFIX").is_some()) {
            return Self::Android;
        }
        if os.contains("linux") {
            return Self::Linux;
        }
        if os.contains("windows") {
            return Self::Windows;
        }
        Self::Other
    }

    /// Lowercase name, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = PlatformParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "android" | "termux" => Ok(Self::Android),
            "linux" => Ok(Self::Linux),
            "windows" => Ok(Self::Windows),
            "other" => Ok(Self::Other),
            _ => Err(PlatformParseError(s.to_owned())),
        }
    }
}
