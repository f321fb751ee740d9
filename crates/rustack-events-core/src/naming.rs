//! Derived resource names.
//!
//! Names the compiler invents (dashboard, alarm and statement ids derived
//! from composite keys) must fit the external system's character set and
//! length ceiling without colliding. Over-long names keep a readable prefix
//! and gain a hash suffix of the untruncated name.

use sha2::{Digest, Sha256};

/// Number of hex characters of the hash suffix.
const HASH_SUFFIX_LEN: usize = 16;

/// Replace every character outside `[A-Za-z0-9-_]` with `-`.
#[must_use]
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// First 16 hex characters of the SHA-256 of `text`.
#[must_use]
pub fn digest(text: &str) -> String {
    let mut hash = hex::encode(Sha256::digest(text.as_bytes()));
    hash.truncate(HASH_SUFFIX_LEN);
    hash
}

/// Bound `natural` to at most `max` characters.
///
/// Names that fit are returned unchanged. Longer names are truncated and
/// suffixed with `-` and the [`digest`] of the full name, so two long names
/// sharing a prefix stay distinct.
///
/// # Examples
///
/// ```
/// use rustack_events_core::naming::bounded;
///
/// assert_eq!(bounded("short", 255), "short");
///
/// let long = "x".repeat(300);
/// let name = bounded(&long, 255);
/// assert_eq!(name.chars().count(), 255);
/// assert_ne!(name, bounded(&"x".repeat(301), 255));
/// ```
#[must_use]
pub fn bounded(natural: &str, max: usize) -> String {
    if natural.chars().count() <= max {
        return natural.to_owned();
    }
    suffixed(natural, natural, max)
}

/// [`sanitize`] `natural` and bound it to `max` characters.
///
/// The hash suffix of an over-long name is taken over the unsanitized name,
/// so names differing only in replaced characters stay distinct.
#[must_use]
pub fn sanitized(natural: &str, max: usize) -> String {
    let clean = sanitize(natural);
    if clean.chars().count() <= max {
        return clean;
    }
    suffixed(&clean, natural, max)
}

fn suffixed(readable: &str, identity: &str, max: usize) -> String {
    let keep = max.saturating_sub(HASH_SUFFIX_LEN + 1);
    let prefix: String = readable.chars().take(keep).collect();
    format!("{prefix}-{}", digest(identity))
}
