//! The session's entry list and the queries run against it.
//!
//! An [`Inventory`] owns the sorted entries of one scan, with stored
//! records merged in so that descriptions, categories and tags survive
//! between sessions. Listings and searches borrow from it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::entry::Entry;
use crate::scanner::sort_entries;
use crate::sinks::CommentSink;
use crate::store::Record;

/// Which entries a listing shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryFilter {
    #[default]
    All,
    WithDescription,
    WithoutDescription,
}

impl EntryFilter {
    #[must_use]
    pub fn matches(self, entry: &Entry) -> bool {
        match self {
            Self::All => true,
            Self::WithDescription => entry.has_description(),
            Self::WithoutDescription => !entry.has_description(),
        }
    }
}

/// Description coverage across the inventory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InventoryStats {
    pub total: usize,
    pub with_description: usize,
    pub without_description: usize,
}

impl InventoryStats {
    /// Share of entries with a description, in `0.0..=1.0`.
    #[must_use]
    pub fn coverage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.with_description as f64 / self.total as f64
    }
}

/// Sorted entries plus the system language used for display.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    entries: Vec<Entry>,
    system_language: String,
}

impl Inventory {
    #[must_use]
    pub fn new(mut entries: Vec<Entry>, system_language: impl Into<String>) -> Self {
        sort_entries(&mut entries);
        Self {
            entries,
            system_language: system_language.into(),
        }
    }

    /// Rebuild an inventory from stored records without scanning.
    #[must_use]
    pub fn from_records(records: &[Record], system_language: impl Into<String>) -> Self {
        Self::new(
            records.iter().map(Record::to_entry).collect(),
            system_language,
        )
    }

    /// Fill scanned entries with what the store accumulated for their paths.
    ///
    /// Returns how many entries had a stored record.
    pub fn merge_records(&mut self, records: &[Record]) -> usize {
        let by_path: HashMap<&Path, &Record> =
            records.iter().map(|r| (r.path.as_path(), r)).collect();
        let mut merged = 0;
        for entry in &mut self.entries {
            if let Some(record) = by_path.get(entry.path.as_path()) {
                record.apply_to(entry);
                merged += 1;
            }
        }
        log::debug!(
            "Merged {} stored records into {} entries",
            merged,
            self.entries.len()
        );
        merged
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn entries_mut(&mut self) -> &mut [Entry] {
        &mut self.entries
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    #[must_use]
    pub fn system_language(&self) -> &str {
        &self.system_language
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.entries.iter().map(|e| e.path.clone()).collect()
    }

    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&Entry> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.path == path)
    }

    #[must_use]
    pub fn filter(&self, filter: EntryFilter) -> Vec<&Entry> {
        self.entries.iter().filter(|e| filter.matches(e)).collect()
    }

    /// Case-insensitive match over name, comment, bundle id, descriptions
    /// and function tags. An empty query matches everything.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Entry> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.entries.iter().collect();
        }
        self.entries
            .iter()
            .filter(|e| search_haystack(e).contains(&needle))
            .collect()
    }

    #[must_use]
    pub fn statistics(&self) -> InventoryStats {
        let with_description = self.entries.iter().filter(|e| e.has_description()).count();
        InventoryStats {
            total: self.entries.len(),
            with_description,
            without_description: self.entries.len() - with_description,
        }
    }

    /// Re-read the comment for `path` from `sink` into its entry.
    ///
    /// Returns the new comment, or `None` when the path is not in the
    /// inventory or the sink has no comment for it.
    pub fn refresh_comment(&mut self, path: &Path, sink: &dyn CommentSink) -> Option<String> {
        let entry = self.get_mut(path)?;
        let comment = sink.get(path).filter(|c| !c.is_empty());
        entry.primary_comment = comment.clone();
        comment
    }
}

fn search_haystack(entry: &Entry) -> String {
    let mut text = entry.name.to_lowercase();
    if let Some(id) = &entry.bundle_identifier {
        text.push('\n');
        text.push_str(&id.to_lowercase());
    }
    text.push('\n');
    text.push_str(&entry.all_descriptions_text().to_lowercase());
    for tag in &entry.function_tags {
        text.push('\n');
        text.push_str(&tag.to_lowercase());
    }
    text
}
