//! Program-level learning outcomes (RA / RAE).
//!
//! # Invariants
//! - `code` is unique within `(program_id, kind)`.
//! - General and specific outcomes number independently.

use super::catalog::RecordId;
use super::lifecycle::LifecycleState;
use serde::{Deserialize, Serialize};

/// Partition discriminator for program learning outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    /// Numbered `RA1, RA2, ...`.
    General,
    /// Numbered `RAE1, RAE2, ...`.
    Specific,
}

impl OutcomeKind {
    /// Code prefix used by the gap-filling sequencer.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::General => "RA",
            Self::Specific => "RAE",
        }
    }

    /// Stable storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Specific => "specific",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "general" => Some(Self::General),
            "specific" => Some(Self::Specific),
            _ => None,
        }
    }
}

/// Stored program learning outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningOutcome {
    pub id: RecordId,
    pub program_id: RecordId,
    #[serde(rename = "type")]
    pub kind: OutcomeKind,
    pub code: String,
    pub description: String,
    pub state: LifecycleState,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Insert shape for a learning outcome whose code is already decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLearningOutcome {
    pub program_id: RecordId,
    pub kind: OutcomeKind,
    pub code: String,
    pub description: String,
}
