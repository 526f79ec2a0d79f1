//! Scanner module for application bundle discovery.
//!
//! This module provides functionality for:
//! - Enumerating bundles below the five supported install roots
//! - Reading each bundle's manifest (identifier, background-only flag)
//! - Prefetching the existing per-file comment
//! - Deduplicating across roots by source priority
//! - Unicode name normalization
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: fixed-depth bundle enumeration below one root
//! - [`manifest`]: the [`ManifestReader`] capability and its plist adapter
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use appsync::scanner::{default_locations, PlistManifestReader, Scanner};
//! use appsync::sinks::MemoryCommentSink;
//!
//! let home = std::env::var("HOME").unwrap_or_default();
//! let scanner = Scanner::new(
//!     default_locations(home.as_ref()),
//!     Arc::new(PlistManifestReader::new()),
//!     Arc::new(MemoryCommentSink::new()),
//! );
//! for entry in scanner.scan_fast() {
//!     println!("{} ({})", entry.name, entry.source);
//! }
//! ```

pub mod manifest;
pub mod walker;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rayon::prelude::*;
use unicode_normalization::UnicodeNormalization;

pub use manifest::{parse_plist_xml, Manifest, ManifestError, ManifestReader, PlistManifestReader};
pub use walker::{BundleWalker, BUNDLE_SUFFIX};

use crate::entry::{Entry, Source};
use crate::icons::IconCache;
use crate::sinks::CommentSink;

/// One install root and the source it represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanLocation {
    pub root: PathBuf,
    pub source: Source,
}

impl ScanLocation {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, source: Source) -> Self {
        Self {
            root: root.into(),
            source,
        }
    }
}

/// The five standard install roots, in scan order.
#[must_use]
pub fn default_locations(home: &Path) -> Vec<ScanLocation> {
    vec![
        ScanLocation::new("/Applications", Source::Applications),
        ScanLocation::new(home.join("Applications"), Source::UserApplications),
        ScanLocation::new("/System/Applications", Source::System),
        ScanLocation::new("/opt/homebrew/Caskroom", Source::Homebrew),
        ScanLocation::new(
            home.join("Library/Application Support/Setapp/Setapp/Applications"),
            Source::Setapp,
        ),
    ]
}

/// Errors that can occur during directory scanning.
///
/// The scanner logs and skips these; a scan itself never fails.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The path disappeared while scanning.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Bundle scanner over a configured set of roots.
pub struct Scanner {
    locations: Vec<ScanLocation>,
    manifests: Arc<dyn ManifestReader>,
    comments: Arc<dyn CommentSink>,
    icons: Option<Arc<IconCache>>,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Scanner {
    #[must_use]
    pub fn new(
        locations: Vec<ScanLocation>,
        manifests: Arc<dyn ManifestReader>,
        comments: Arc<dyn CommentSink>,
    ) -> Self {
        Self {
            locations,
            manifests,
            comments,
            icons: None,
            shutdown_flag: None,
        }
    }

    /// Materialize icons through `cache` during [`scan`](Self::scan).
    #[must_use]
    pub fn with_icon_cache(mut self, cache: Arc<IconCache>) -> Self {
        self.icons = Some(cache);
        self
    }

    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    #[must_use]
    pub fn locations(&self) -> &[ScanLocation] {
        &self.locations
    }

    /// Full scan: deduplicated, sorted entries with icons resolved.
    #[must_use]
    pub fn scan(&self) -> Vec<Entry> {
        let mut entries = self.scan_fast();
        if let Some(cache) = &self.icons {
            let paths: Vec<PathBuf> = entries.iter().map(|e| e.path.clone()).collect();
            cache.preload_all(&paths);
            for entry in &mut entries {
                entry.icon = Some(cache.icon(&entry.path));
            }
        }
        entries
    }

    /// Scan without icons; they resolve lazily through the icon cache later.
    #[must_use]
    pub fn scan_fast(&self) -> Vec<Entry> {
        let mut entries = Vec::new();
        for location in &self.locations {
            entries.extend(self.scan_location(location));
        }
        let found = entries.len();
        let mut entries = dedup_entries(entries);
        sort_entries(&mut entries);
        log::info!(
            "Scanned {} bundles across {} roots ({} after dedup)",
            found,
            self.locations.len(),
            entries.len()
        );
        entries
    }

    /// Entries below one root, in enumeration order.
    #[must_use]
    pub fn scan_location(&self, location: &ScanLocation) -> Vec<Entry> {
        let mut walker = BundleWalker::new(&location.root, location.source.bundle_depth());
        if let Some(flag) = &self.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        let bundles: Vec<PathBuf> = walker
            .walk()
            .filter_map(|result| match result {
                Ok(path) => Some(path),
                Err(e) => {
                    log::debug!("Skipping during scan: {}", e);
                    None
                }
            })
            .collect();

        log::debug!(
            "{} bundles in {} ({})",
            bundles.len(),
            location.root.display(),
            location.source
        );

        bundles
            .into_par_iter()
            .map(|path| self.build_entry(path, location.source))
            .collect()
    }

    /// Entry for a single bundle path, outside any walk.
    ///
    /// The source is taken from the configured root containing `path`, or
    /// `/Applications` when none does. Returns `None` unless `path` is an
    /// existing `.app` directory.
    #[must_use]
    pub fn entry_for(&self, path: &Path) -> Option<Entry> {
        let is_bundle = path.is_dir()
            && path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().ends_with(BUNDLE_SUFFIX));
        if !is_bundle {
            return None;
        }
        let source = self
            .locations
            .iter()
            .filter(|l| path.starts_with(&l.root))
            .map(|l| l.source)
            .max_by_key(|s| s.priority())
            .unwrap_or(Source::Applications);
        let mut entry = self.build_entry(path.to_path_buf(), source);
        if let Some(cache) = &self.icons {
            entry.icon = Some(cache.load_icon(path));
        }
        Some(entry)
    }

    fn build_entry(&self, path: PathBuf, source: Source) -> Entry {
        let name = display_name(&path);
        let manifest = self.manifests.read(&path);
        let comment = self.comments.get(&path);

        let mut entry = Entry::new(path, name, source);
        entry.bundle_identifier = manifest.bundle_identifier;
        entry.is_background_only = manifest.is_background_only;
        entry.primary_comment = comment;
        entry
    }
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("locations", &self.locations)
            .field("icons", &self.icons.is_some())
            .finish_non_exhaustive()
    }
}

/// Bundle file name without `.app`, NFC-normalized.
#[must_use]
pub fn display_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name
        .strip_suffix(BUNDLE_SUFFIX)
        .unwrap_or(&file_name);
    stem.nfc().collect()
}

/// Keep one entry per `bundleIdentifier ?? path`.
///
/// The entry from the higher-priority source wins; between equal priorities
/// the lexicographically smaller path wins, so the result does not depend on
/// input order.
#[must_use]
pub fn dedup_entries(entries: Vec<Entry>) -> Vec<Entry> {
    let mut seen: HashMap<String, Entry> = HashMap::with_capacity(entries.len());
    for entry in entries {
        let key = entry.search_id();
        match seen.get(&key) {
            Some(existing) if !outranks(&entry, existing) => {
                log::trace!(
                    "Dropping duplicate {} in favour of {}",
                    entry.path.display(),
                    existing.path.display()
                );
            }
            _ => {
                seen.insert(key, entry);
            }
        }
    }
    seen.into_values().collect()
}

fn outranks(candidate: &Entry, existing: &Entry) -> bool {
    let (a, b) = (candidate.source.priority(), existing.source.priority());
    a > b || (a == b && candidate.path < existing.path)
}

/// Sort case-insensitively by name, then by path.
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by_cached_key(|e| (e.name.to_lowercase(), e.path.clone()));
}
