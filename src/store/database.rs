//! JSON-file record store with merge-on-save semantics.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use directories::ProjectDirs;

use super::record::{Record, StoreDocument, StoreFile};
use crate::entry::{merge_function_tags, Category, Entry, LocalizedDescription};

/// Errors raised while writing the store.
///
/// Reads never fail: a missing or undecodable file is an empty store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The store file or its directory could not be written.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Records could not be serialized.
    #[error("Failed to serialize store: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result alias for store mutations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable, path-keyed record store.
///
/// Every mutation runs load → mutate → write while holding one internal
/// lock, so concurrent callers sharing a `RecordStore` are serialized and
/// cannot lose each other's writes. Two `RecordStore` values pointing at the
/// same file do not coordinate; hold one and share it by reference.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl RecordStore {
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Platform data directory location, e.g. `~/Library/Application Support/.../records.json`.
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "appsync", "appsync")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(dirs.data_dir().join("records.json"))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record. Missing file or decode failure yields an empty list.
    #[must_use]
    pub fn load(&self) -> Vec<Record> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                log::warn!("Failed to read store {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<StoreFile>(&content) {
            Ok(file) => file.into_records(),
            Err(e) => {
                log::warn!(
                    "Failed to decode store {}, treating as empty: {}",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Merge a scanned entry set into the store.
    ///
    /// For each entry the stored record (by path) is consulted: the original
    /// comment is inherited, and empty categories, tags or descriptions
    /// inherit the stored values. Records for paths absent from `entries`
    /// are kept untouched.
    pub fn save(&self, entries: &[Entry]) -> StoreResult<()> {
        self.mutate(|records| {
            let mut index: HashMap<PathBuf, usize> = records
                .iter()
                .enumerate()
                .map(|(i, r)| (r.path.clone(), i))
                .collect();

            for entry in entries {
                match index.get(&entry.path) {
                    Some(&i) => {
                        let merged = Record::merged(entry, Some(&records[i]));
                        records[i] = merged;
                    }
                    None => {
                        index.insert(entry.path.clone(), records.len());
                        records.push(Record::merged(entry, None));
                    }
                }
            }
            log::debug!("Saved {} entries ({} records total)", entries.len(), records.len());
        })
    }

    /// Set the primary comment of one record. `false` when the path is unknown.
    pub fn update_comment(&self, path: &Path, comment: &str) -> StoreResult<bool> {
        self.update_record(path, |record| {
            record.primary_comment = Some(comment.to_string());
        })
    }

    /// Replace the categories of one record.
    pub fn update_categories(&self, path: &Path, categories: &[Category]) -> StoreResult<bool> {
        self.update_record(path, |record| {
            record.categories = categories.to_vec();
        })
    }

    /// Merge function tags into one record, skipping case-insensitive duplicates.
    pub fn add_functions(&self, path: &Path, tags: &[String]) -> StoreResult<bool> {
        self.update_record(path, |record| {
            merge_function_tags(&mut record.function_tags, tags.iter().cloned());
        })
    }

    /// Replace the description pair for `language`, leaving exactly one entry for it.
    pub fn update_description(
        &self,
        path: &Path,
        language: &str,
        short: Option<&str>,
        expanded: Option<&str>,
    ) -> StoreResult<bool> {
        self.update_record(path, |record| {
            record.replace_description(LocalizedDescription::new(
                language,
                short.map(str::to_string),
                expanded.map(str::to_string),
            ));
        })
    }

    #[must_use]
    pub fn record(&self, path: &Path) -> Option<Record> {
        self.load().into_iter().find(|r| r.is_for(path))
    }

    #[must_use]
    pub fn stored_comment(&self, path: &Path) -> Option<String> {
        self.record(path).and_then(|r| r.primary_comment)
    }

    /// Target languages without any stored entry for `path`.
    #[must_use]
    pub fn missing_languages(&self, path: &Path, targets: &[String]) -> Vec<String> {
        let Some(record) = self.record(path) else {
            return targets.to_vec();
        };
        targets
            .iter()
            .filter(|lang| record.description(lang).is_none())
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn all_descriptions_text(&self, path: &Path) -> String {
        self.record(path)
            .map(|r| r.all_descriptions_text())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_cached_data(&self) -> bool {
        self.path.exists()
    }

    /// Remove records whose path is not in `live`. Returns how many were dropped.
    pub fn prune(&self, live: &[PathBuf]) -> StoreResult<usize> {
        let live: HashSet<&PathBuf> = live.iter().collect();
        self.mutate(|records| {
            let before = records.len();
            records.retain(|r| live.contains(&r.path));
            before - records.len()
        })
    }

    /// Delete the store file.
    pub fn clear(&self) -> StoreResult<()> {
        let _guard = self.lock();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn update_record<F>(&self, path: &Path, apply: F) -> StoreResult<bool>
    where
        F: FnOnce(&mut Record),
    {
        self.mutate(|records| match records.iter_mut().find(|r| r.is_for(path)) {
            Some(record) => {
                apply(record);
                record.last_synced = Utc::now();
                true
            }
            None => {
                log::debug!("No stored record for {}", path.display());
                false
            }
        })
    }

    /// Single-writer read-modify-write cycle.
    fn mutate<F, R>(&self, apply: F) -> StoreResult<R>
    where
        F: FnOnce(&mut Vec<Record>) -> R,
    {
        let _guard = self.lock();
        let mut records = self.load();
        let result = apply(&mut records);
        self.write_records(records)?;
        Ok(result)
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Write to a sibling temp file, then rename over the store.
    fn write_records(&self, records: Vec<Record>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }

        let json = serde_json::to_string_pretty(&StoreDocument::new(records))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut file = fs::File::create(&tmp).map_err(io_error(&tmp))?;
        file.write_all(json.as_bytes()).map_err(io_error(&tmp))?;
        file.sync_all().map_err(io_error(&tmp))?;
        drop(file);
        fs::rename(&tmp, &self.path).map_err(io_error(&self.path))?;
        Ok(())
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError {
    let path = path.to_path_buf();
    move |source| StoreError::Io { path, source }
}
