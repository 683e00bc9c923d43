//! Mastery level for subject outcomes.
//!
//! Stored as a small integer, exposed as a label. The conversion happens only
//! through [`LEVEL_STORAGE_TABLE`] at the repository boundary.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MasteryLevel {
    #[serde(rename = "BASICO")]
    Basic,
    #[serde(rename = "INTERMEDIO")]
    Intermediate,
    #[serde(rename = "AVANZADO")]
    Advanced,
}

/// Two-way mapping between domain levels and stored integers.
pub const LEVEL_STORAGE_TABLE: &[(MasteryLevel, i64)] = &[
    (MasteryLevel::Basic, 1),
    (MasteryLevel::Intermediate, 2),
    (MasteryLevel::Advanced, 3),
];

impl MasteryLevel {
    /// User-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Basic => "BASICO",
            Self::Intermediate => "INTERMEDIO",
            Self::Advanced => "AVANZADO",
        }
    }

    /// Parses a label, ignoring surrounding whitespace and case.
    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "BASICO" => Some(Self::Basic),
            "INTERMEDIO" => Some(Self::Intermediate),
            "AVANZADO" => Some(Self::Advanced),
            _ => None,
        }
    }

    /// Stored integer for this level.
    pub fn to_stored(self) -> i64 {
        LEVEL_STORAGE_TABLE
            .iter()
            .find(|(level, _)| *level == self)
            .map_or(0, |(_, stored)| *stored)
    }

    /// Level for a stored integer; `None` for values outside the table.
    pub fn from_stored(stored: i64) -> Option<Self> {
        LEVEL_STORAGE_TABLE
            .iter()
            .find(|(_, value)| *value == stored)
            .map(|(level, _)| *level)
    }
}
