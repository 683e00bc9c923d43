//! Domain model for accreditation records.
//!
//! # Responsibility
//! - Define the records the sequencer and services reason about.
//! - Own lifecycle transition rules and stored-value mappings.
//!
//! # Invariants
//! - Every coded record carries a code unique within its partition.
//! - A record's code is assigned once at creation and never changes.
//! - Removal is a `LifecycleState::Deleted` tombstone, not a hard delete.

pub mod catalog;
pub mod level;
pub mod lifecycle;
pub mod outcome;
pub mod subject_outcome;
