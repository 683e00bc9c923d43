//! Scope records: faculties, programs and subjects.
//!
//! These carry no sequencing behavior. Programs scope learning outcomes and
//! subjects scope subject outcomes.

use super::lifecycle::LifecycleState;
use serde::{Deserialize, Serialize};

/// Row id shared by every stored record.
pub type RecordId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faculty {
    pub id: RecordId,
    pub code: String,
    pub name: String,
    pub state: LifecycleState,
}

/// Academic program (carrera) owned by a faculty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: RecordId,
    pub faculty_id: RecordId,
    pub code: String,
    pub name: String,
    pub state: LifecycleState,
}

/// Subject (asignatura) taught within a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: RecordId,
    pub program_id: RecordId,
    pub code: String,
    pub name: String,
    pub state: LifecycleState,
}
