//! Human-readable code sequencing for coded entities.
//!
//! # Responsibility
//! - Compute the next code for a new record from a snapshot of its partition.
//! - Keep numbering policy free of storage, logging and transport concerns.
//!
//! # Invariants
//! - Sequencers never write; callers insert and the store's unique
//!   constraint is the backstop for concurrent inserts.
//! - Store access is injected as plain values or a probe closure.
//!
//! # See also
//! - `service::outcome_service` (gap-filling call site)
//! - `service::subject_outcome_service` (probe-based call site)

pub mod config;
pub mod gap;
pub mod pattern;
pub mod probe;

pub use config::{ConfigError, FallbackPolicy, SequencerConfig};
pub use gap::{next_gap_code, next_gap_number};
pub use pattern::{prefixed_number, subject_code, trailing_number};
pub use probe::{probe_subject_code, starting_sequence, ProbeError, ProbeStart};
