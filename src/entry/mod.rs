//! Runtime model of a discovered application.
//!
//! An [`Entry`] lives for one session: the scanner creates it, the record
//! store fills in whatever was accumulated on earlier runs, and the
//! enrichment orchestrator mutates descriptions, categories and tags.
//!
//! # Architecture
//!
//! * [`category`]: the closed [`Category`] set and the ranked [`Source`] enum.
//! * [`language`]: target-language resolution ([`LanguagePlan`]).

pub mod category;
pub mod language;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use category::{Category, Source};
pub use language::{language_name, LanguagePlan, ENGLISH};

use crate::icons::Icon;

/// Hard upper bound, in characters, for the primary comment.
pub const COMMENT_MAX_CHARS: usize = 255;

/// Which half of a language's description pair is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptionKind {
    /// Brief, 5-10 words.
    Short,
    /// Keyword-dense, up to 255 characters.
    Expanded,
}

impl std::fmt::Display for DescriptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Short => write!(f, "short"),
            Self::Expanded => write!(f, "expanded"),
        }
    }
}

/// Generated text for one language.
///
/// The pair is only ever replaced as a whole; a language entry never has a
/// previously fetched half nulled out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedDescription {
    #[serde(alias = "language")]
    pub language_code: String,
    #[serde(default, alias = "shortDescription")]
    pub short_text: Option<String>,
    #[serde(default, alias = "expandedDescription")]
    pub expanded_text: Option<String>,
    #[serde(default = "Utc::now")]
    pub fetched_at: DateTime<Utc>,
}

impl LocalizedDescription {
    #[must_use]
    pub fn new(language: &str, short: Option<String>, expanded: Option<String>) -> Self {
        Self {
            language_code: language.to_string(),
            short_text: short,
            expanded_text: expanded,
            fetched_at: Utc::now(),
        }
    }

    /// Both halves present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.short_text.is_some() && self.expanded_text.is_some()
    }

    /// `short | expanded`, or whichever half exists.
    #[must_use]
    pub fn combined(&self) -> Option<String> {
        match (&self.short_text, &self.expanded_text) {
            (Some(short), Some(expanded)) => Some(format!("{short} | {expanded}")),
            (Some(short), None) => Some(short.clone()),
            (None, Some(expanded)) => Some(expanded.clone()),
            (None, None) => None,
        }
    }
}

/// An application discovered on this machine.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Bundle path; the stable unique identity.
    pub path: PathBuf,
    /// Display name (bundle file name without `.app`).
    pub name: String,
    pub bundle_identifier: Option<String>,
    pub source: Source,
    /// Agent/menu-bar application without a Dock presence.
    pub is_background_only: bool,
    /// Zero to three categories.
    pub categories: Vec<Category>,
    /// Short verb phrases, deduplicated case-insensitively.
    pub function_tags: Vec<String>,
    /// At most one entry per language.
    pub descriptions: Vec<LocalizedDescription>,
    /// Single-line comment mirrored to the comment sink.
    pub primary_comment: Option<String>,
    /// Comment found before this tool ever wrote one.
    pub original_comment: Option<String>,
    /// Rendered icon, never persisted.
    pub icon: Option<Arc<Icon>>,
}

impl Entry {
    #[must_use]
    pub fn new(path: PathBuf, name: impl Into<String>, source: Source) -> Self {
        Self {
            path,
            name: name.into(),
            bundle_identifier: None,
            source,
            is_background_only: false,
            categories: Vec::new(),
            function_tags: Vec::new(),
            descriptions: Vec::new(),
            primary_comment: None,
            original_comment: None,
            icon: None,
        }
    }

    /// Key used for cross-location dedup and by the search index.
    #[must_use]
    pub fn search_id(&self) -> String {
        self.bundle_identifier
            .clone()
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }

    #[must_use]
    pub fn description(&self, language: &str) -> Option<&LocalizedDescription> {
        self.descriptions
            .iter()
            .find(|d| d.language_code == language)
    }

    /// Replace the entry for `description.language_code`, keeping one per language.
    pub fn upsert_description(&mut self, description: LocalizedDescription) {
        self.descriptions
            .retain(|d| d.language_code != description.language_code);
        self.descriptions.push(description);
    }

    #[must_use]
    pub fn has_complete_description(&self, language: &str) -> bool {
        self.description(language)
            .is_some_and(LocalizedDescription::is_complete)
    }

    #[must_use]
    pub fn has_all_languages(&self, targets: &[String]) -> bool {
        targets.iter().all(|lang| self.has_complete_description(lang))
    }

    #[must_use]
    pub fn missing_languages(&self, targets: &[String]) -> Vec<String> {
        targets
            .iter()
            .filter(|lang| !self.has_complete_description(lang))
            .cloned()
            .collect()
    }

    /// `(needs_short, needs_expanded)` for one language.
    #[must_use]
    pub fn missing_kinds(&self, language: &str) -> (bool, bool) {
        match self.description(language) {
            Some(d) => (d.short_text.is_none(), d.expanded_text.is_none()),
            None => (true, true),
        }
    }

    /// A non-empty comment or any language entry counts.
    #[must_use]
    pub fn has_description(&self) -> bool {
        self.primary_comment.as_deref().is_some_and(|c| !c.is_empty())
            || !self.descriptions.is_empty()
    }

    /// System language first, then English, then the raw comment.
    #[must_use]
    pub fn display_description(&self, system_language: &str) -> Option<String> {
        self.description(system_language)
            .or_else(|| self.description(ENGLISH))
            .and_then(LocalizedDescription::combined)
            .or_else(|| self.primary_comment.clone())
    }

    /// Comment plus every description half, joined for text search.
    #[must_use]
    pub fn all_descriptions_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(comment) = self.primary_comment.as_deref().filter(|c| !c.is_empty()) {
            parts.push(comment);
        }
        for desc in &self.descriptions {
            parts.extend(desc.short_text.as_deref());
            parts.extend(desc.expanded_text.as_deref());
        }
        parts.join(" ")
    }

    /// Merge tags, skipping case-insensitive duplicates. Returns how many were added.
    pub fn add_function_tags<I, S>(&mut self, tags: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        merge_function_tags(&mut self.function_tags, tags)
    }
}

/// Append `incoming` to `existing`, skipping case-insensitive duplicates.
pub fn merge_function_tags<I, S>(existing: &mut Vec<String>, incoming: I) -> usize
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut added = 0;
    for tag in incoming {
        let tag = tag.into();
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            continue;
        }
        let lowered = trimmed.to_lowercase();
        if existing.iter().any(|t| t.to_lowercase() == lowered) {
            continue;
        }
        existing.push(trimmed.to_string());
        added += 1;
    }
    added
}

/// Cut `text` to at most `max` characters (not bytes).
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
