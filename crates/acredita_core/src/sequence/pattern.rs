//! Code-pattern parsing shared by both sequencers.
//!
//! Only ASCII digits count as numeric components. Digit runs that do not fit
//! in `u32` are treated as non-conforming rather than saturated.

use once_cell::sync::Lazy;
use regex::Regex;

static DIGITS_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+$").expect("valid digits regex"));
static TRAILING_DIGITS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)$").expect("valid trailing digits regex"));

/// Width used for zero-padding subject ids and sequence numbers.
pub const SUBJECT_CODE_PAD: usize = 3;

/// Extracts `n` from a code shaped exactly `<prefix><n>`.
///
/// Returns `None` for any other shape, e.g. `RAE1` under prefix `RA`,
/// `RA-1`, `RA` or `CUSTOM-CODE-ABC`.
pub fn prefixed_number(prefix: &str, code: &str) -> Option<u32> {
    let rest = code.strip_prefix(prefix)?;
    if !DIGITS_ONLY_RE.is_match(rest) {
        return None;
    }
    rest.parse().ok()
}

/// Extracts the trailing digit run of `code`, if any.
pub fn trailing_number(code: &str) -> Option<u32> {
    TRAILING_DIGITS_RE
        .captures(code)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Builds `<prefix>-<subject_id>-<seq>` with both numbers padded to 3 digits.
///
/// Values wider than the pad are rendered in full.
pub fn subject_code(prefix: &str, subject_id: i64, seq: u32) -> String {
    format!(
        "{prefix}-{subject_id:0width$}-{seq:0width$}",
        width = SUBJECT_CODE_PAD
    )
}
