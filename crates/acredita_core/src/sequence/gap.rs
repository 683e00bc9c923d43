//! Gap-filling sequencer for `<prefix><n>` codes.
//!
//! # Invariants
//! - The result is the smallest `n >= 1` not used by a conforming code.
//! - Gaps left by earlier records are reused before appending.
//! - Codes that do not match `^<prefix>[0-9]+$` neither block nor offset
//!   numbering.

use super::pattern::prefixed_number;

/// Returns the smallest positive number not taken by a conforming code.
pub fn next_gap_number<'a, I>(prefix: &str, codes: I) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    let mut taken: Vec<u32> = codes
        .into_iter()
        .filter_map(|code| prefixed_number(prefix, code))
        .filter(|value| *value > 0)
        .collect();
    taken.sort_unstable();
    taken.dedup();

    let mut candidate = 1u32;
    for value in taken {
        if value != candidate {
            break;
        }
        candidate += 1;
    }
    candidate
}

/// Returns `<prefix><n>` for the smallest free `n`.
pub fn next_gap_code<'a, I>(prefix: &str, codes: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    format!("{prefix}{}", next_gap_number(prefix, codes))
}
