//! Identifier helpers
//!
//! Everything in a threat model is keyed by an identifier: a lowercase,
//! underscore separated token prefixed with `@` (e.g. `@cwe_319_cleartext_transmission`).
//! Free text written in a tag is turned into an identifier on the fly, so
//! `User:Session` and `@user:@session` refer to the same component.

/// Check whether a string is already an identifier
pub fn is_identifier(text: &str) -> bool {
    text.starts_with('@')
}

/// Turn a text string into an identifier, unless it already is one
///
/// - `"this is an example"` -> `@this_is_an_example`
/// - `"a-b-c"` -> `@abc`
/// - `"/api/v0/users"` -> `@api_v0_users`
/// - `"@already_an_id"` -> `@already_an_id`
/// - `"Übertragung"` -> `@übertragung`
///
/// A text without any letters or digits yields the bare `@`, which
/// [`is_empty_identifier`] detects.
pub fn text_to_identifier(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    if is_identifier(text) {
        return text.to_string();
    }

    let mut id = String::with_capacity(text.len() + 1);
    let mut pending_sep = false;

    for ch in text.trim().to_lowercase().chars() {
        if ch.is_whitespace() || ch == '/' || ch == '_' {
            pending_sep = true;
        } else if ch.is_alphanumeric() {
            if pending_sep && !id.is_empty() {
                id.push('_');
            }
            pending_sep = false;
            id.push(ch);
        }
        // '-' and any other punctuation are dropped
    }

    format!("@{}", id)
}

/// Check whether an identifier carries nothing after the `@`
pub fn is_empty_identifier(id: &str) -> bool {
    id == "@"
}

/// Remove excessive spacing from the beginning, end and within a string
///
/// Escaped line breaks (`\` followed by a newline) count as whitespace,
/// which is how multi-line tags are written.
pub fn remove_excessive_space(text: &str) -> String {
    text.replace("\\\n", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
