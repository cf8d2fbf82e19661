use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Trims each tag, drops empties, and dedupes exact matches while keeping
/// first-occurrence order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::new();
    for tag in tags {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            normalized.push(trimmed.to_string());
        }
    }
    normalized
}

/// Splits a comma-delimited tag string, collapsing internal whitespace runs
/// to single spaces before normalization.
pub fn tags_from_string(value: &str) -> Vec<String> {
    let collapsed: Vec<String> = value
        .split(',')
        .map(|tag| WHITESPACE_RUN.replace_all(tag, " ").into_owned())
        .collect();
    normalize_tags(&collapsed)
}
