//! Physical key composition and decomposition.
//!
//! A physical key is `prefix <sign> key <sign> suffix`, with either tag dropped
//! (together with its sign) when empty. Decomposition splits at the *first*
//! link sign only: the head is the prefix position and the tail keeps the rest,
//! including any link signs that belong to the logical key itself. Logical keys
//! that contain the link sign are tolerated, not rejected; a prefix filter still
//! finds them, and a suffix filter matches the end of the tail.

/// A physical key split at its first link sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyParts<'a> {
    pub head: &'a str,
    pub tail: &'a str,
}

impl KeyParts<'_> {
    /// True when the tail is the suffix, or ends with `sign + suffix`.
    pub fn tail_ends_with(&self, suffix: &str, sign: &str) -> bool {
        if self.tail == suffix {
            return true;
        }
        self.tail
            .strip_suffix(suffix)
            .is_some_and(|rest| rest.ends_with(sign))
    }
}

/// Builds the physical key for `key`.
pub fn compose(key: &str, prefix: &str, suffix: &str, sign: &str) -> String {
    match (prefix.is_empty(), suffix.is_empty()) {
        (false, false) => format!("{prefix}{sign}{key}{sign}{suffix}"),
        (false, true) => format!("{prefix}{sign}{key}"),
        (true, false) => format!("{key}{sign}{suffix}"),
        (true, true) => key.to_string(),
    }
}

/// Splits `physical` at the first `sign`. `None` when either side is empty,
/// when the key is exactly the sign, or when the sign does not occur.
pub fn decompose<'a>(physical: &'a str, sign: &str) -> Option<KeyParts<'a>> {
    if physical.is_empty() || sign.is_empty() || physical == sign {
        return None;
    }
    physical
        .split_once(sign)
        .map(|(head, tail)| KeyParts { head, tail })
}

/// How many times `sign` occurs in `s` as a split boundary.
pub fn count_occurrences(s: &str, sign: &str) -> usize {
    if s.is_empty() || sign.is_empty() {
        return 0;
    }
    s.matches(sign).count()
}

pub fn has_at_least(s: &str, sign: &str, n: usize) -> bool {
    count_occurrences(s, sign) >= n
}
