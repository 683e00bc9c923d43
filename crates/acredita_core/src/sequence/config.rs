//! Sequencer configuration.
//!
//! # Invariants
//! - Every field has a default, so an empty JSON object is a valid config.
//! - `max_probe_attempts == 0` is normalized to the default bound.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Prefix for subject-scoped outcome codes when callers do not pass one.
pub const DEFAULT_SUBJECT_PREFIX: &str = "RAA";
/// Probe bound for subject-scoped code generation.
pub const DEFAULT_MAX_PROBE_ATTEMPTS: u32 = 100;

/// How the probe sequencer picks its first candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Continue from the last code's trailing number, or from
    /// `record_count + 1` when the last code has none.
    #[default]
    RecordCount,
    /// Continue from the highest trailing number across all subject codes.
    MaxSequence,
}

/// Tunables for code generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SequencerConfig {
    pub subject_prefix: String,
    pub max_probe_attempts: u32,
    pub fallback: FallbackPolicy,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            subject_prefix: DEFAULT_SUBJECT_PREFIX.to_string(),
            max_probe_attempts: DEFAULT_MAX_PROBE_ATTEMPTS,
            fallback: FallbackPolicy::RecordCount,
        }
    }
}

/// Invalid sequencer configuration.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    InvalidPrefix(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid sequencer config: {err}"),
            Self::InvalidPrefix(value) => write!(
                f,
                "invalid code prefix `{value}`; expected non-blank text without whitespace"
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::InvalidPrefix(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl SequencerConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validated()
    }

    /// Validates fields and normalizes the probe bound.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        validate_prefix(self.subject_prefix.as_str())?;
        if self.max_probe_attempts == 0 {
            self.max_probe_attempts = DEFAULT_MAX_PROBE_ATTEMPTS;
        }
        Ok(self)
    }
}

/// Checks that a code prefix is usable inside generated codes.
pub fn validate_prefix(prefix: &str) -> Result<(), ConfigError> {
    if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidPrefix(prefix.to_string()));
    }
    Ok(())
}
