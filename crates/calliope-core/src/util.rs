//! Small text and time helpers shared across the workspace.

use chrono::{SecondsFormat, Utc};

/// Current UTC time as an ISO-8601 string with second precision, e.g.
/// `2024-03-01T14:05:09Z`.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Turn a timestamp into a sortable file stem by dropping `:` and `-`.
///
/// `2024-03-01T14:05:09Z` becomes `20240301T140509Z`. Two calls within the
/// same second yield the same stem.
pub fn timestamp_stem(timestamp: &str) -> String {
    timestamp.replace([':', '-'], "")
}

/// File-name slug for a scene or template name: lowercase, spaces to dashes.
pub fn slugify(name: &str) -> String {
    name.trim().replace(' ', "-").to_lowercase()
}

/// Join items as "a, b, and c".
pub fn human_join<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [init @ .., last] => {
            let head: Vec<&str> = init.iter().map(AsRef::as_ref).collect();
            format!("{}, and {}", head.join(", "), last.as_ref())
        }
    }
}

/// Title-case a dash- or underscore-separated stem: `chapter-01` -> `Chapter 01`.
pub fn title_from_stem(stem: &str) -> String {
    stem.split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Split a comma-separated answer into trimmed, non-empty parts.
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
