//! Verifier configuration (`gapverify.toml`).
//!
//! Every field has a default, so an empty or missing file is a valid
//! configuration. Unknown keys are rejected to catch typos early.

use std::fmt;
use std::path::{Path, PathBuf};

use gapverify_pfgw::{DEFAULT_MARKER, Probe, default_probes};
use serde::Deserialize;

use crate::oracle::DEFAULT_THRESHOLD_BITS;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyConfig {
    #[serde(default)]
    pub oracle: OracleConfig,

    #[serde(default)]
    pub pfgw: PfgwConfig,

    #[serde(default)]
    pub validate: ValidateConfig,
}

// ---------------------------------------------------------------------------
// OracleConfig
// ---------------------------------------------------------------------------

/// How the primality oracle picks a strategy.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OracleConfig {
    /// Numbers with at least this many bits go to the external tool
    /// (default: 8000).
    #[serde(default = "default_threshold_bits")]
    pub threshold_bits: u64,

    /// Self-check the tool before trusting its first answer (default: true).
    #[serde(default = "default_true")]
    pub probe_before_use: bool,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            threshold_bits: default_threshold_bits(),
            probe_before_use: default_true(),
        }
    }
}

const fn default_threshold_bits() -> u64 {
    DEFAULT_THRESHOLD_BITS
}

const fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// PfgwConfig
// ---------------------------------------------------------------------------

/// The external PRP tool.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PfgwConfig {
    /// Program name or path (default: `"pfgw64"`).
    #[serde(default = "default_program")]
    pub program: PathBuf,

    /// Text every tool output must contain (default: `"PFGW"`).
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Per-invocation timeout. `0` disables it (default: 0).
    #[serde(default)]
    pub timeout_seconds: u64,

    /// Self-check probes. Empty means the built-in pair.
    #[serde(default)]
    pub probes: Vec<ProbeConfig>,
}

impl Default for PfgwConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            marker: default_marker(),
            timeout_seconds: 0,
            probes: Vec::new(),
        }
    }
}

impl PfgwConfig {
    /// The configured probes, or the built-in pair when none are set.
    #[must_use]
    pub fn effective_probes(&self) -> Vec<Probe> {
        if self.probes.is_empty() {
            return default_probes();
        }
        self.probes
            .iter()
            .map(|p| Probe::new(p.query.clone(), p.exit_code, p.expect.clone()))
            .collect()
    }
}

fn default_program() -> PathBuf {
    PathBuf::from("pfgw64")
}

fn default_marker() -> String {
    DEFAULT_MARKER.to_owned()
}

/// One `[[pfgw.probes]]` entry.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    pub query: String,
    pub exit_code: i32,
    pub expect: String,
}

// ---------------------------------------------------------------------------
// ValidateConfig
// ---------------------------------------------------------------------------

/// Validator defaults.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidateConfig {
    /// Worker threads for survivor resolution (default: 1).
    #[serde(default = "default_threads")]
    pub threads: usize,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
        }
    }
}

const fn default_threads() -> usize {
    1
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Error loading a configuration file.
#[derive(Debug)]
pub struct ConfigError {
    /// The path that was being loaded (if available).
    pub path: Option<PathBuf>,
    /// Human-readable message with line-level detail when possible.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "config error: {}", self.message)
        }
    }
}

impl std::error::Error for ConfigError {}

impl VerifyConfig {
    /// Load configuration from a TOML file. A missing file yields defaults.
    ///
    /// # Errors
    /// Returns `ConfigError` on I/O errors (other than not-found) or parse errors.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ConfigError` on invalid TOML, unknown fields or a zero
    /// `threshold_bits`.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start].chars().filter(|&c| c == '\n').count() + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError { path: None, message }
        })?;
        if config.oracle.threshold_bits == 0 {
            return Err(ConfigError {
                path: None,
                message: "oracle.threshold_bits must be at least 1".to_owned(),
            });
        }
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
