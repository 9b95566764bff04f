//! Text hygiene helpers.
//!
//! Credential strings and header values must be reduced to printable ASCII
//! before use: HTTP header construction rejects non-Latin-1 byte sequences,
//! and stored credentials occasionally pick up zero-width or control
//! characters from copy-paste. The same scrub is applied when persisting, so
//! corrupted values self-heal on the next save.

/// Reduce a string to its printable-ASCII content, trimmed of surrounding
/// whitespace.
///
/// Idempotent: applying it twice yields the same result as applying it once.
#[must_use]
pub fn printable_ascii(input: &str) -> String {
    input
        .chars()
        .filter(|c| (' '..='~').contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Check whether a string is already clean printable ASCII with no
/// surrounding whitespace.
#[must_use]
pub fn is_printable_ascii(input: &str) -> bool {
    input == printable_ascii(input)
}
