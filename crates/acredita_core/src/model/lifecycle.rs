//! Record lifecycle state.
//!
//! One enum replaces independent "active" and "deleted" flags so that
//! contradictory combinations cannot be represented.
//!
//! # Transitions
//! - `Active <-> Inactive`
//! - `Active | Inactive -> Deleted`
//! - `Deleted -> Active` (restore)
//! - Same-state transitions are accepted as no-ops.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Visible and usable.
    #[default]
    Active,
    /// Kept for history but hidden from active use.
    Inactive,
    /// Tombstoned. Still holds its code.
    Deleted,
}

/// Rejected lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleError {
    pub from: LifecycleState,
    pub to: LifecycleState,
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid lifecycle transition from `{}` to `{}`",
            self.from.as_str(),
            self.to.as_str()
        )
    }
}

impl Error for LifecycleError {}

impl LifecycleState {
    /// Stable storage and wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Deleted => "deleted",
        }
    }

    /// Parses a storage name produced by [`LifecycleState::as_str`].
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }

    /// Returns whether moving to `to` is allowed.
    pub fn can_transition_to(self, to: Self) -> bool {
        use LifecycleState::{Active, Deleted, Inactive};
        matches!(
            (self, to),
            (Active, Active)
                | (Inactive, Inactive)
                | (Deleted, Deleted)
                | (Active, Inactive)
                | (Inactive, Active)
                | (Active, Deleted)
                | (Inactive, Deleted)
                | (Deleted, Active)
        )
    }

    /// Returns `to` when the transition is allowed.
    pub fn transition(self, to: Self) -> Result<Self, LifecycleError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(LifecycleError { from: self, to })
        }
    }

    pub fn is_deleted(self) -> bool {
        self == Self::Deleted
    }
}
