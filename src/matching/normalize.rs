use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;

/// Non-ASCII letters that survive normalization
const ACCENTED: &[char] = &['ñ', 'á', 'é', 'í', 'ó', 'ú', 'ü'];

#[inline]
fn is_label_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == ' ' || ACCENTED.contains(&c)
}

/// Normalize a free-text label (filename stem, slug or exercise name).
///
/// Lowercases, turns `_` and `-` into spaces, drops every character outside
/// `[a-z0-9ñáéíóúü ]`, then collapses runs of spaces and trims. Input is
/// NFC-composed first so a decomposed `é` is kept like a precomposed one.
pub fn normalize(label: &str) -> String {
    let lowered = label.nfc().collect::<String>().to_lowercase();

    let kept: String = lowered
        .chars()
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .filter(|c| is_label_char(*c))
        .collect();

    kept.split(' ')
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Word set of an already normalized label
#[inline]
pub fn tokens(normalized: &str) -> HashSet<&str> {
    normalized.split_whitespace().collect()
}
