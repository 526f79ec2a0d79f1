//! Parsing generator replies and composing the primary comment.

use std::sync::LazyLock;

use regex::Regex;

use crate::entry::{truncate_chars, Category, Entry, ENGLISH, COMMENT_MAX_CHARS};

static LIST_MARKER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[\d.\-•*]+\s*").ok());

/// Map a free-text reply onto the closed category set.
///
/// Exact case-insensitive match first, then substring containment, then
/// [`Category::Other`].
#[must_use]
pub fn parse_category(reply: &str) -> Category {
    let lowered = reply.trim().to_lowercase();

    Category::ALL
        .iter()
        .copied()
        .find(|c| lowered == c.label().to_lowercase())
        .or_else(|| {
            Category::ALL
                .iter()
                .copied()
                .find(|c| lowered.contains(&c.label().to_lowercase()))
        })
        .unwrap_or(Category::Other)
}

/// Extract function tags from a newline-delimited reply.
///
/// Leading numbering and bullet characters are stripped, lines of two to six
/// words are kept, and only the first character is lower-cased.
#[must_use]
pub fn parse_function_tags(reply: &str) -> Vec<String> {
    reply
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            let cleaned = match LIST_MARKER.as_ref() {
                Some(re) => re.replace(trimmed, "").into_owned(),
                None => trimmed.to_string(),
            };
            let cleaned = cleaned.trim();
            let words = cleaned.split_whitespace().count();
            if (2..=6).contains(&words) {
                Some(lowercase_first(cleaned))
            } else {
                None
            }
        })
        .collect()
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Primary comment for `entry`: the system language's `short | expanded`
/// (short alone without an expanded half), else English, on a single line
/// and hard-capped at [`COMMENT_MAX_CHARS`].
#[must_use]
pub fn compose_primary_comment(entry: &Entry, system_language: &str) -> Option<String> {
    let pick = |language: &str| {
        let description = entry.description(language)?;
        let short = single_line(description.short_text.as_deref()?);
        let expanded = description
            .expanded_text
            .as_deref()
            .map(single_line)
            .filter(|e| !e.is_empty());
        match expanded {
            Some(expanded) => Some(format!("{short} | {expanded}")),
            None => Some(short),
        }
    };
    pick(system_language)
        .or_else(|| pick(ENGLISH))
        .map(|text| truncate_chars(&text, COMMENT_MAX_CHARS))
}

/// Collapse every whitespace run, line breaks included, to one space.
#[must_use]
pub fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
