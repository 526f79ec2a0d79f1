//! Persisted record schema.
//!
//! The store file is one JSON document. Current files are wrapped in a
//! versioned envelope; version 1 files were a bare array of records and are
//! still read. Every optional field decodes as absent when missing, `null`,
//! or holding a label this build does not know.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::entry::{Category, Entry, LocalizedDescription, Source};

/// Current version of the store document.
pub const STORE_VERSION: u32 = 2;

/// Accumulated metadata for one application, keyed by path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub path: PathBuf,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_identifier: Option<String>,
    #[serde(default, alias = "finderComment", skip_serializing_if = "Option::is_none")]
    pub primary_comment: Option<String>,
    #[serde(
        default,
        alias = "originalFinderComment",
        skip_serializing_if = "Option::is_none"
    )]
    pub original_comment: Option<String>,
    #[serde(default = "Utc::now", alias = "lastScanned")]
    pub last_synced: DateTime<Utc>,
    #[serde(default, alias = "isMenuBarApp", deserialize_with = "null_as_default")]
    pub is_background_only: bool,
    #[serde(
        default,
        deserialize_with = "lenient_source",
        skip_serializing_if = "Option::is_none"
    )]
    pub source: Option<Source>,
    #[serde(default, deserialize_with = "lenient_categories")]
    pub categories: Vec<Category>,
    #[serde(default, alias = "functions", deserialize_with = "null_as_default")]
    pub function_tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_descriptions")]
    pub descriptions: Vec<LocalizedDescription>,
}

impl Record {
    /// Fresh record for a path the store has never seen.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            bundle_identifier: None,
            primary_comment: None,
            original_comment: None,
            last_synced: Utc::now(),
            is_background_only: false,
            source: None,
            categories: Vec::new(),
            function_tags: Vec::new(),
            descriptions: Vec::new(),
        }
    }

    /// Build the record to persist for `entry`, merged against what was stored.
    ///
    /// * `original_comment` is captured when the record is first created and
    ///   inherited verbatim afterwards.
    /// * Empty categories, tags or descriptions on the entry inherit the
    ///   stored values.
    #[must_use]
    pub fn merged(entry: &Entry, existing: Option<&Record>) -> Self {
        let original_comment = match existing {
            Some(record) => record.original_comment.clone(),
            None => entry.primary_comment.clone(),
        };

        let categories = inherit_if_empty(&entry.categories, existing.map(|r| &r.categories));
        let function_tags =
            inherit_if_empty(&entry.function_tags, existing.map(|r| &r.function_tags));
        let descriptions =
            inherit_if_empty(&entry.descriptions, existing.map(|r| &r.descriptions));

        Self {
            path: entry.path.clone(),
            name: entry.name.clone(),
            bundle_identifier: entry.bundle_identifier.clone(),
            primary_comment: entry.primary_comment.clone(),
            original_comment,
            last_synced: Utc::now(),
            is_background_only: entry.is_background_only,
            source: Some(entry.source),
            categories,
            function_tags,
            descriptions,
        }
    }

    /// Rebuild an entry from stored data alone, for queries that do not rescan.
    ///
    /// Records written before sources were persisted count as `/Applications`.
    #[must_use]
    pub fn to_entry(&self) -> Entry {
        let mut entry = Entry::new(
            self.path.clone(),
            self.name.clone(),
            self.source.unwrap_or(Source::Applications),
        );
        entry.bundle_identifier = self.bundle_identifier.clone();
        entry.is_background_only = self.is_background_only;
        self.apply_to(&mut entry);
        entry
    }

    /// Fill the gaps of a freshly scanned entry with accumulated data.
    pub fn apply_to(&self, entry: &mut Entry) {
        if entry.descriptions.is_empty() {
            entry.descriptions = self.descriptions.clone();
        }
        if entry.categories.is_empty() {
            entry.categories = self.categories.clone();
        }
        if entry.function_tags.is_empty() {
            entry.function_tags = self.function_tags.clone();
        }
        if entry.original_comment.is_none() {
            entry.original_comment = self.original_comment.clone();
        }
        if entry.primary_comment.is_none() {
            entry.primary_comment = self.primary_comment.clone();
        }
    }

    #[must_use]
    pub fn description(&self, language: &str) -> Option<&LocalizedDescription> {
        self.descriptions
            .iter()
            .find(|d| d.language_code == language)
    }

    /// Replace exactly the entry for `language` (remove, then append).
    pub fn replace_description(&mut self, description: LocalizedDescription) {
        self.descriptions
            .retain(|d| d.language_code != description.language_code);
        self.descriptions.push(description);
    }

    /// All short/expanded texts; the comment when nothing was generated yet.
    #[must_use]
    pub fn all_descriptions_text(&self) -> String {
        if self.descriptions.is_empty() {
            return self.primary_comment.clone().unwrap_or_default();
        }
        self.descriptions
            .iter()
            .flat_map(|d| [d.short_text.as_deref(), d.expanded_text.as_deref()])
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[must_use]
    pub fn is_for(&self, path: &Path) -> bool {
        self.path == path
    }
}

fn inherit_if_empty<T: Clone>(incoming: &[T], stored: Option<&Vec<T>>) -> Vec<T> {
    match stored {
        Some(stored) if incoming.is_empty() => stored.clone(),
        _ => incoming.to_vec(),
    }
}

/// Versioned envelope written by this build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreDocument {
    pub version: u32,
    #[serde(default)]
    pub records: Vec<Record>,
}

impl StoreDocument {
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            version: STORE_VERSION,
            records,
        }
    }
}

/// Any document shape the store can read.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum StoreFile {
    Versioned(StoreDocument),
    Legacy(Vec<Record>),
}

impl StoreFile {
    pub(crate) fn into_records(self) -> Vec<Record> {
        match self {
            Self::Versioned(doc) => {
                if doc.version > STORE_VERSION {
                    log::warn!(
                        "Store document version {} is newer than {}; reading known fields only",
                        doc.version,
                        STORE_VERSION
                    );
                }
                doc.records
            }
            Self::Legacy(records) => {
                log::debug!("Read legacy store document ({} records)", records.len());
                records
            }
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_source<'de, D>(deserializer: D) -> Result<Option<Source>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(Source::from_label))
}

fn lenient_categories<'de, D>(deserializer: D) -> Result<Vec<Category>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .iter()
        .filter_map(serde_json::Value::as_str)
        .filter_map(Category::from_label)
        .collect())
}

fn lenient_descriptions<'de, D>(deserializer: D) -> Result<Vec<LocalizedDescription>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect())
}
