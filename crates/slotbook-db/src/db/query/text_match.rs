//! Case-insensitive name matching.
//!
//! Profile business names and schedule names are unique per owner ignoring
//! case. Lookups use `ILIKE` with an escaped pattern so user input cannot
//! inject wildcards.

/// ## Summary
/// Escapes special SQL LIKE/ILIKE pattern characters.
///
/// Escapes `%`, `_`, and `\` so they match literally.
#[must_use]
pub fn escape_like_pattern(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' | '_' | '\\' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}

/// ## Summary
/// Builds an `ILIKE` pattern matching `name` exactly, ignoring case and
/// surrounding whitespace.
#[must_use]
pub fn exact_name_pattern(name: &str) -> String {
    escape_like_pattern(name.trim())
}
