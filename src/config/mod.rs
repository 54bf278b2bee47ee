//! Configuration loading and management.
//!
//! Loads echocore configuration from `--config`, `$ECHOCORE_CONFIG_PATH`, or
//! `<base_dir>/config.toml`. Environment variables override file values;
//! file values override defaults.
//!
//! Precedence: env vars > config file > defaults.

mod platform;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub use platform::{Platform, PlatformParseError};

/// Watermark stamped on every audit entry unless configured otherwise.
pub const DEFAULT_WATERMARK: &str = "TEAM_ALPHA_vFUTURE";

// ── Top-level config ────────────────────────────────────────────

/// Top-level echocore configuration loaded from TOML.
///
/// Built once at startup and passed by reference into each component.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EchoConfig {
    /// Host platform selection.
    pub platform: PlatformConfig,
    /// Filesystem paths.
    pub paths: PathsConfig,
    /// Threat classifier tuning.
    pub guard: GuardConfig,
    /// Source patcher rule toggles.
    pub patch: PatchConfig,
    /// Audit trail settings.
    pub audit: AuditConfig,
}

impl EchoConfig {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// An explicit `path` must exist. The implicit paths fall back to
    /// defaults when the file is missing.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Load using a custom env resolver (for testing).
    pub fn load_with(path: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match path {
            Some(explicit) => Self::load_file(explicit)
                .with_context(|| format!("failed to load config {}", explicit.display()))?,
            None => {
                let implicit = Self::config_path_with(&env)?;
                match std::fs::read_to_string(&implicit) {
                    Ok(contents) => {
                        tracing::info!(path = %implicit.display(), "loading config from file");
                        Self::from_toml(&contents)?
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        tracing::debug!("no config file found, using defaults");
                        Self::default()
                    }
                    Err(e) => {
                        return Err(anyhow::anyhow!(
                            "failed to read config file {}: {e}",
                            implicit.display()
                        ))
                    }
                }
            }
        };
        config.apply_overrides(env);
        config.validate()?;
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        tracing::info!(path = %path.display(), "loading config from file");
        Self::from_toml(&contents)
    }

    /// Resolve the implicit config path.
    ///
    /// Checks `$ECHOCORE_CONFIG_PATH` first, then `<base_dir>/config.toml`.
    fn config_path_with(env: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
        if let Some(p) = env("ECHOCORE_CONFIG_PATH") {
            return Ok(PathBuf::from(p));
        }
        let platform = Platform::detect_with(std::env::consts::OS, &env);
        Ok(default_base_dir(platform)?.join("config.toml"))
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function for testability (avoids unsafe `set_var` in tests).
    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("ECHOCORE_PLATFORM") {
            match v.parse() {
                Ok(p) => self.platform.target = Some(p),
                Err(e) => tracing::warn!(
                    var = "ECHOCORE_PLATFORM",
                    value = %v,
                    error = %e,
                    "ignoring invalid env override"
                ),
            }
        }
        if let Some(v) = env("ECHOCORE_AUDIT_LOG") {
            self.paths.audit_log = Some(v);
        }
        if let Some(v) = env("ECHOCORE_WATERMARK") {
            self.audit.watermark = v;
        }
        if let Some(v) = env("ECHOCORE_ENTROPY_THRESHOLD") {
            match v.parse() {
                Ok(n) => self.guard.entropy_threshold = n,
                Err(_) => tracing::warn!(
                    var = "ECHOCORE_ENTROPY_THRESHOLD",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
    }

    /// Parse a TOML string into config (no env overrides, no validation).
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: EchoConfig =
            toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }

    /// Validate that configuration values are within sane bounds.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.guard.entropy_threshold.is_finite() && self.guard.entropy_threshold > 0.0,
            "guard.entropy_threshold must be a positive number"
        );
        anyhow::ensure!(
            self.guard.anomaly_keywords.iter().all(|k| !k.trim().is_empty()),
            "guard.anomaly_keywords must not contain empty entries"
        );
        for topic in &self.guard.topics {
            anyhow::ensure!(
                !topic.name.trim().is_empty(),
                "guard.topics entries need a name"
            );
            anyhow::ensure!(
                !topic.phrases.is_empty() && topic.phrases.iter().all(|p| !p.trim().is_empty()),
                "guard topic '{}' needs at least one non-empty phrase",
                topic.name
            );
        }
        let mark = &self.audit.watermark;
        anyhow::ensure!(!mark.is_empty(), "audit.watermark must not be empty");
        anyhow::ensure!(
            !mark.contains('|') && !mark.contains('\n') && !mark.contains('\r'),
            "audit.watermark must not contain '|' or line breaks"
        );
        Ok(())
    }

    /// Effective platform: the configured override, else the detected one.
    pub fn platform(&self) -> Platform {
        self.platform.target.unwrap_or_else(Platform::detect)
    }

    /// Effective base directory for echocore state.
    pub fn base_dir(&self) -> Result<PathBuf> {
        match &self.paths.base_dir {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => default_base_dir(self.platform()),
        }
    }

    /// Effective audit log path (`<base_dir>/logs/audit.log` by default).
    pub fn audit_log_path(&self) -> Result<PathBuf> {
        match &self.paths.audit_log {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(self.base_dir()?.join("logs").join("audit.log")),
        }
    }
}

/// Default base directory for a platform.
///
/// Android keeps state on shared storage; everything else under
/// `~/.echocore`.
pub fn default_base_dir(platform: Platform) -> Result<PathBuf> {
    if platform == Platform::Android {
        return Ok(PathBuf::from("/storage/emulated/0/EchoAI"));
    }
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".echocore"))
}

// ── Platform config ─────────────────────────────────────────────

/// Platform selection (`[platform]`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Platform to assume instead of detecting one.
    pub target: Option<Platform>,
}

// ── Paths config ────────────────────────────────────────────────

/// Filesystem paths (`[paths]`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Base directory; platform default when unset.
    pub base_dir: Option<String>,
    /// Audit log file; `<base_dir>/logs/audit.log` when unset.
    pub audit_log: Option<String>,
}

// ── Guard config ────────────────────────────────────────────────

/// Threat classifier tuning (`[guard]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Entropy (bits/char) above which input is flagged.
    pub entropy_threshold: f64,
    /// Inputs of this many characters or fewer skip the entropy layer.
    pub entropy_min_chars: usize,
    /// Case-insensitive keywords for the heuristic layer.
    pub anomaly_keywords: Vec<String>,
    /// Extra protection topics, checked after the built-in ones.
    pub topics: Vec<TopicConfig>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            entropy_threshold: 7.5,
            entropy_min_chars: 100,
            anomaly_keywords: vec!["hack".to_owned()],
            topics: Vec::new(),
        }
    }
}

/// A configured protection topic (`[[guard.topics]]`).
#[derive(Debug, Clone, Deserialize)]
pub struct TopicConfig {
    /// Topic name reported on a match.
    pub name: String,
    /// Trigger phrases, matched case-insensitively.
    pub phrases: Vec<String>,
}

// ── Patch config ────────────────────────────────────────────────

/// Source patcher toggles (`[patch]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    /// Comment out imports whose leaf identifier is never used.
    pub unused_imports: bool,
    /// Replace `x = expr / 0;` with a null sentinel.
    pub division_by_zero: bool,
    /// Replace `x = null;` with a default-constructed object.
    pub null_assignment: bool,
    /// Wrap the program entry point in a try/catch guard during `run`.
    pub guard_entry_point: bool,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            unused_imports: true,
            division_by_zero: true,
            null_assignment: true,
            guard_entry_point: true,
        }
    }
}

// ── Audit config ────────────────────────────────────────────────

/// Audit trail settings (`[audit]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Provenance tag appended to every entry.
    pub watermark: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            watermark: DEFAULT_WATERMARK.to_owned(),
        }
    }
}
