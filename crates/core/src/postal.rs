//! Postal-code (CEP) detection and normalization.
//!
//! Detection is a pure function over free text: five digits, an optional
//! hyphen, three digits, word-bounded. Only the first match matters; the
//! pipeline ignores the rest of the message.

use std::sync::OnceLock;

use regex::Regex;

static CEP_PATTERN: OnceLock<Regex> = OnceLock::new();

fn cep_pattern() -> &'static Regex {
    CEP_PATTERN.get_or_init(|| {
        Regex::new(r"\b\d{5}-?\d{3}\b").expect("CEP pattern is a valid regex")
    })
}

/// First CEP-shaped substring of `text`, if any.
pub fn find_postal_code(text: &str) -> Option<&str> {
    cep_pattern().find(text).map(|m| m.as_str())
}

/// Digits-only lookup key. Every separator arrangement of the same code
/// normalizes to the same 8-digit key.
pub fn normalize_postal_code(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}
