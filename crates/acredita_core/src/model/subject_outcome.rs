//! Subject-level learning outcomes (RAA).
//!
//! # Invariants
//! - `code` is unique across all subject outcomes.
//! - Generated codes look like `<prefix>-<subject:03>-<seq:03>`; explicitly
//!   supplied or legacy codes may have any shape.

use super::catalog::RecordId;
use super::level::MasteryLevel;
use super::lifecycle::LifecycleState;
use serde::{Deserialize, Serialize};

/// Stored subject learning outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectOutcome {
    pub id: RecordId,
    pub subject_id: RecordId,
    pub code: String,
    pub description: String,
    pub level: MasteryLevel,
    pub state: LifecycleState,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Insert shape for a subject outcome whose code is already decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubjectOutcome {
    pub subject_id: RecordId,
    pub code: String,
    pub description: String,
    pub level: MasteryLevel,
}
