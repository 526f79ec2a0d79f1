//! Search index documents and sinks.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::entry::Entry;

/// Domain all application documents are filed under.
pub const APPS_DOMAIN: &str = "appsync.apps";

#[derive(thiserror::Error, Debug)]
pub enum SearchIndexError {
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode search index: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One searchable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDocument {
    /// `bundleIdentifier ?? path`.
    pub id: String,
    pub domain: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<PathBuf>,
}

impl IndexDocument {
    /// Document for `entry`, describing it in `system_language` when possible.
    #[must_use]
    pub fn from_entry(entry: &Entry, system_language: &str) -> Self {
        let mut keywords = vec![entry.name.clone()];
        keywords.extend(entry.bundle_identifier.iter().cloned());
        keywords.extend(entry.categories.iter().map(|c| c.label().to_string()));
        keywords.extend(entry.function_tags.iter().cloned());

        Self {
            id: entry.search_id(),
            domain: APPS_DOMAIN.to_string(),
            display_name: entry.name.clone(),
            description: entry
                .display_description(system_language)
                .unwrap_or_default(),
            keywords,
            thumbnail: None,
        }
    }
}

/// Capability over the OS content search indexer.
pub trait SearchIndexSink: Send + Sync {
    fn upsert(&self, document: &IndexDocument) -> Result<(), SearchIndexError>;
    fn delete(&self, id: &str) -> Result<(), SearchIndexError>;
    fn delete_all(&self, domain: &str) -> Result<(), SearchIndexError>;
}

/// Index persisted as one JSON file of documents keyed by id.
#[derive(Debug)]
pub struct FileSearchIndex {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSearchIndex {
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored document; an unreadable file reads as empty.
    #[must_use]
    pub fn documents(&self) -> BTreeMap<String, IndexDocument> {
        match fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring undecodable search index {}: {}", self.path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                log::warn!("Failed to read search index {}: {}", self.path.display(), e);
                BTreeMap::new()
            }
        }
    }

    fn modify<F>(&self, apply: F) -> Result<(), SearchIndexError>
    where
        F: FnOnce(&mut BTreeMap<String, IndexDocument>),
    {
        let _guard = self.guard();
        let mut documents = self.documents();
        apply(&mut documents);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io(parent))?;
        }
        let json = serde_json::to_string_pretty(&documents)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io(&tmp))?;
        fs::rename(&tmp, &self.path).map_err(io(&self.path))?;
        Ok(())
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn io(path: &Path) -> impl FnOnce(std::io::Error) -> SearchIndexError {
    let path = path.to_path_buf();
    move |source| SearchIndexError::Io { path, source }
}

impl SearchIndexSink for FileSearchIndex {
    fn upsert(&self, document: &IndexDocument) -> Result<(), SearchIndexError> {
        self.modify(|docs| {
            docs.insert(document.id.clone(), document.clone());
        })
    }

    fn delete(&self, id: &str) -> Result<(), SearchIndexError> {
        self.modify(|docs| {
            docs.remove(id);
        })
    }

    fn delete_all(&self, domain: &str) -> Result<(), SearchIndexError> {
        self.modify(|docs| docs.retain(|_, d| d.domain != domain))
    }
}

/// In-process index for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySearchIndex {
    documents: Mutex<BTreeMap<String, IndexDocument>>,
}

impl MemorySearchIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<IndexDocument> {
        self.lock().get(id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, IndexDocument>> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SearchIndexSink for MemorySearchIndex {
    fn upsert(&self, document: &IndexDocument) -> Result<(), SearchIndexError> {
        self.lock().insert(document.id.clone(), document.clone());
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), SearchIndexError> {
        self.lock().remove(id);
        Ok(())
    }

    fn delete_all(&self, domain: &str) -> Result<(), SearchIndexError> {
        self.lock().retain(|_, d| d.domain != domain);
        Ok(())
    }
}
