//! Per-item enrichment.
//!
//! Each item walks `FetchShort(lang) → FetchExpanded(lang)` for every target
//! language in order, then syncs the primary comment and the search index,
//! then `Categorize` and `TagFunctions` when those are still empty. Every
//! external failure is absorbed into the [`ItemOutcome`]; nothing here
//! returns an error.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::generator::DescriptionGenerator;
use super::parse::{compose_primary_comment, parse_category, parse_function_tags};
use crate::entry::{DescriptionKind, Entry, LanguagePlan, LocalizedDescription};
use crate::sinks::{CommentSink, IndexDocument, SearchIndexSink};
use crate::store::{RecordStore, StoreResult};

/// Default pause between batch items.
pub const DEFAULT_INTER_ITEM_DELAY: Duration = Duration::from_millis(500);

/// One step of the per-item state machine, for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichStep {
    FetchShort(String),
    FetchExpanded(String),
    Categorize,
    TagFunctions,
    Done,
}

impl std::fmt::Display for EnrichStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FetchShort(lang) => write!(f, "fetch short ({lang})"),
            Self::FetchExpanded(lang) => write!(f, "fetch expanded ({lang})"),
            Self::Categorize => write!(f, "categorize"),
            Self::TagFunctions => write!(f, "tag functions"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// What happened to the primary comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentOutcome {
    /// No description text to compose a comment from.
    #[default]
    NoText,
    /// The composed comment already matched.
    Unchanged,
    Written,
    /// The sink rejected the write; descriptions stay durable.
    Failed,
}

/// Batch-level classification of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Updated,
    Skipped,
    Failed,
}

/// Result of enriching one item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    /// Fields newly obtained from the generator.
    pub fetched: usize,
    /// Generator calls that failed.
    pub failed_fields: usize,
    /// Store writes that failed.
    pub store_errors: usize,
    pub comment: CommentOutcome,
    pub categorized: bool,
    pub tags_added: usize,
    /// The generator was unavailable and nothing was attempted.
    pub unavailable: bool,
}

impl ItemOutcome {
    #[must_use]
    pub fn status(&self) -> ItemStatus {
        if self.failed_fields > 0
            || self.store_errors > 0
            || self.comment == CommentOutcome::Failed
        {
            ItemStatus::Failed
        } else if self.fetched > 0 || self.comment == CommentOutcome::Written {
            ItemStatus::Updated
        } else {
            ItemStatus::Skipped
        }
    }
}

/// Drives enrichment of entries against the generator and the sinks.
pub struct Orchestrator {
    store: Arc<RecordStore>,
    generator: Arc<dyn DescriptionGenerator>,
    comments: Arc<dyn CommentSink>,
    index: Arc<dyn SearchIndexSink>,
    languages: LanguagePlan,
    inter_item_delay: Duration,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        store: Arc<RecordStore>,
        generator: Arc<dyn DescriptionGenerator>,
        comments: Arc<dyn CommentSink>,
        index: Arc<dyn SearchIndexSink>,
        languages: LanguagePlan,
    ) -> Self {
        Self {
            store,
            generator,
            comments,
            index,
            languages,
            inter_item_delay: DEFAULT_INTER_ITEM_DELAY,
        }
    }

    #[must_use]
    pub fn with_inter_item_delay(mut self, delay: Duration) -> Self {
        self.inter_item_delay = delay;
        self
    }

    #[must_use]
    pub fn inter_item_delay(&self) -> Duration {
        self.inter_item_delay
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.generator.is_available()
    }

    #[must_use]
    pub fn languages(&self) -> &LanguagePlan {
        &self.languages
    }

    #[must_use]
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Fill every missing field of `entry` and write the results back.
    pub fn enrich(&self, entry: &mut Entry) -> ItemOutcome {
        let mut outcome = ItemOutcome::default();
        if !self.generator.is_available() {
            outcome.unavailable = true;
            return outcome;
        }

        self.ensure_record(entry, &mut outcome);

        for language in self.languages.targets() {
            self.fetch_language(entry, language, &mut outcome);
        }

        self.sync_comment(entry, &mut outcome);
        self.push_to_index(entry);

        if entry.categories.is_empty() {
            self.categorize(entry, &mut outcome);
        }
        if entry.function_tags.is_empty() {
            self.tag_functions(entry, &mut outcome);
        }

        log::debug!("{}: {} ({:?})", entry.name, EnrichStep::Done, outcome.status());
        outcome
    }

    /// Create the record before any mutation, so the pre-existing comment is
    /// what gets captured as the original.
    fn ensure_record(&self, entry: &mut Entry, outcome: &mut ItemOutcome) {
        if self.store.record(&entry.path).is_some() {
            return;
        }
        if entry.original_comment.is_none() {
            entry.original_comment.clone_from(&entry.primary_comment);
        }
        if let Err(e) = self.store.save(std::slice::from_ref(&*entry)) {
            log::warn!("Failed to create record for {}: {}", entry.path.display(), e);
            outcome.store_errors += 1;
        }
    }

    fn fetch_language(&self, entry: &mut Entry, language: &str, outcome: &mut ItemOutcome) {
        let (need_short, need_expanded) = entry.missing_kinds(language);
        if !need_short && !need_expanded {
            return;
        }

        let existing = entry.description(language);
        let mut short = existing.and_then(|d| d.short_text.clone());
        let mut expanded = existing.and_then(|d| d.expanded_text.clone());
        let mut fetched_any = false;

        if need_short {
            log::debug!("{}: {}", entry.name, EnrichStep::FetchShort(language.to_string()));
            if let Some(text) = self.fetch(entry, DescriptionKind::Short, language, outcome) {
                short = Some(text);
                fetched_any = true;
            }
        }
        if need_expanded {
            log::debug!("{}: {}", entry.name, EnrichStep::FetchExpanded(language.to_string()));
            if let Some(text) = self.fetch(entry, DescriptionKind::Expanded, language, outcome) {
                expanded = Some(text);
                fetched_any = true;
            }
        }

        if !fetched_any {
            return;
        }

        let persisted = self.store.update_description(
            &entry.path,
            language,
            short.as_deref(),
            expanded.as_deref(),
        );
        entry.upsert_description(LocalizedDescription::new(language, short, expanded));
        self.check_persisted(entry, persisted, outcome);
    }

    fn fetch(
        &self,
        entry: &Entry,
        kind: DescriptionKind,
        language: &str,
        outcome: &mut ItemOutcome,
    ) -> Option<String> {
        match self.generator.generate(
            &entry.name,
            entry.bundle_identifier.as_deref(),
            kind,
            language,
        ) {
            Ok(text) => {
                outcome.fetched += 1;
                Some(text)
            }
            Err(e) => {
                log::warn!("{} {} description ({}) failed: {}", entry.name, kind, language, e);
                outcome.failed_fields += 1;
                None
            }
        }
    }

    fn sync_comment(&self, entry: &mut Entry, outcome: &mut ItemOutcome) {
        let Some(comment) = compose_primary_comment(entry, self.languages.system()) else {
            outcome.comment = CommentOutcome::NoText;
            return;
        };
        if entry.primary_comment.as_deref() == Some(comment.as_str()) {
            outcome.comment = CommentOutcome::Unchanged;
            return;
        }

        if self.comments.set(&entry.path, &comment) {
            let persisted = self.store.update_comment(&entry.path, &comment);
            entry.primary_comment = Some(comment);
            self.check_persisted(entry, persisted, outcome);
            outcome.comment = CommentOutcome::Written;
        } else {
            log::warn!("Failed to write comment for {}", entry.path.display());
            outcome.comment = CommentOutcome::Failed;
        }
    }

    fn push_to_index(&self, entry: &Entry) {
        let document = IndexDocument::from_entry(entry, self.languages.system());
        if let Err(e) = self.index.upsert(&document) {
            log::warn!("Search index update for {} failed: {}", document.id, e);
        }
    }

    fn categorize(&self, entry: &mut Entry, outcome: &mut ItemOutcome) {
        log::debug!("{}: {}", entry.name, EnrichStep::Categorize);
        match self
            .generator
            .categorize(&entry.name, entry.bundle_identifier.as_deref())
        {
            Ok(reply) => {
                let category = parse_category(&reply);
                entry.categories = vec![category];
                outcome.fetched += 1;
                outcome.categorized = true;
                let persisted = self.store.update_categories(&entry.path, &entry.categories);
                self.check_persisted(entry, persisted, outcome);
            }
            Err(e) => {
                log::warn!("Categorizing {} failed: {}", entry.name, e);
                outcome.failed_fields += 1;
            }
        }
    }

    fn tag_functions(&self, entry: &mut Entry, outcome: &mut ItemOutcome) {
        log::debug!("{}: {}", entry.name, EnrichStep::TagFunctions);
        let reply = self.generator.list_functions(
            &entry.name,
            entry.bundle_identifier.as_deref(),
            self.languages.system(),
        );
        match reply {
            Ok(reply) => {
                let tags = parse_function_tags(&reply);
                if tags.is_empty() {
                    log::debug!("No usable function tags in reply for {}", entry.name);
                    return;
                }
                outcome.fetched += 1;
                outcome.tags_added = entry.add_function_tags(tags.iter().cloned());
                let persisted = self.store.add_functions(&entry.path, &tags);
                self.check_persisted(entry, persisted, outcome);
            }
            Err(e) => {
                log::warn!("Listing functions of {} failed: {}", entry.name, e);
                outcome.failed_fields += 1;
            }
        }
    }

    /// Count store failures; recreate the record if it vanished mid-item.
    fn check_persisted(&self, entry: &Entry, result: StoreResult<bool>, outcome: &mut ItemOutcome) {
        match result {
            Ok(true) => {}
            Ok(false) => {
                log::debug!("Record for {} missing, saving entry", entry.path.display());
                if let Err(e) = self.store.save(std::slice::from_ref(entry)) {
                    log::warn!("Failed to save {}: {}", entry.path.display(), e);
                    outcome.store_errors += 1;
                }
            }
            Err(e) => {
                log::warn!("Failed to persist {}: {}", entry.path.display(), e);
                outcome.store_errors += 1;
            }
        }
    }

    /// Re-read the comment sink for `path`.
    #[must_use]
    pub fn read_comment(&self, path: &Path) -> Option<String> {
        self.comments.get(path)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("store", &self.store.path())
            .field("languages", &self.languages)
            .field("inter_item_delay", &self.inter_item_delay)
            .finish_non_exhaustive()
    }
}
