//! Probe-based sequencer for subject-scoped `<prefix>-<subject>-<seq>` codes.
//!
//! # Responsibility
//! - Pick a starting sequence from the subject's most recent code.
//! - Probe candidates upward until one is free or the attempt budget runs out.
//!
//! # Invariants
//! - A missing prior record is not an error; numbering starts at 1.
//! - The probe loop is bounded by `max_attempts`.
//! - Probe lookup errors are returned unchanged, never retried.

use super::config::FallbackPolicy;
use super::pattern::{subject_code, trailing_number};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Snapshot of one subject partition used to pick the first candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProbeStart<'a> {
    /// Code of the most recently created non-deleted record, if any.
    pub last_code: Option<&'a str>,
    /// Number of non-deleted records for the subject.
    pub record_count: u64,
    /// Every code held by the subject, deleted rows included.
    ///
    /// Only read by `FallbackPolicy::MaxSequence`.
    pub subject_codes: &'a [String],
}

/// Failure of a bounded probe run.
#[derive(Debug)]
pub enum ProbeError<E> {
    /// Every candidate in the attempt window already exists.
    Exhausted {
        subject_id: i64,
        start: u32,
        attempts: u32,
    },
    /// The existence lookup itself failed.
    Lookup(E),
}

impl<E: Display> Display for ProbeError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exhausted {
                subject_id,
                start,
                attempts,
            } => write!(
                f,
                "could not generate a unique code for subject {subject_id} after {attempts} attempts starting at {start}"
            ),
            Self::Lookup(err) => write!(f, "{err}"),
        }
    }
}

impl<E: Error + 'static> Error for ProbeError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Exhausted { .. } => None,
            Self::Lookup(err) => Some(err),
        }
    }
}

/// Computes the first sequence number to probe.
///
/// With `FallbackPolicy::RecordCount` a last code ending in digits continues
/// from that number; any other last code falls back to `record_count + 1`,
/// which may land on a used number after deletions. The probe loop absorbs
/// that. `FallbackPolicy::MaxSequence` ignores the last code and continues
/// from the highest trailing number across all of the subject's codes.
pub fn starting_sequence(start: &ProbeStart<'_>, policy: FallbackPolicy) -> u32 {
    match policy {
        FallbackPolicy::RecordCount => match start.last_code {
            Some(code) => match trailing_number(code) {
                Some(last) => last.saturating_add(1),
                None => u32::try_from(start.record_count)
                    .unwrap_or(u32::MAX)
                    .saturating_add(1),
            },
            None => 1,
        },
        FallbackPolicy::MaxSequence => start
            .subject_codes
            .iter()
            .filter_map(|code| trailing_number(code))
            .max()
            .map_or(1, |max| max.saturating_add(1)),
    }
}

/// Returns the first candidate code for which `exists` reports `false`.
///
/// Candidates are `start, start + 1, ...`, at most `max_attempts` of them.
///
/// # Errors
/// - `ProbeError::Exhausted` when every candidate in the window exists.
/// - `ProbeError::Lookup` when `exists` fails.
pub fn probe_subject_code<E, F>(
    prefix: &str,
    subject_id: i64,
    start: u32,
    max_attempts: u32,
    mut exists: F,
) -> Result<String, ProbeError<E>>
where
    F: FnMut(&str) -> Result<bool, E>,
{
    let mut attempts = 0u32;
    while attempts < max_attempts {
        let Some(seq) = start.checked_add(attempts) else {
            break;
        };
        let code = subject_code(prefix, subject_id, seq);
        attempts += 1;
        if !exists(code.as_str()).map_err(ProbeError::Lookup)? {
            return Ok(code);
        }
    }

    Err(ProbeError::Exhausted {
        subject_id,
        start,
        attempts,
    })
}
