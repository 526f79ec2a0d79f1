//! Bundle discovery below one scan root.
//!
//! # Overview
//!
//! Application bundles sit at a fixed depth below each root: directly inside
//! `/Applications`, or two levels further down in a Homebrew Caskroom
//! (`{cask}/{version}/X.app`). [`BundleWalker`] enumerates exactly that depth
//! with [`walkdir`] and never descends into a bundle.
//!
//! # Example
//!
//! ```no_run
//! use appsync::scanner::BundleWalker;
//! use std::path::Path;
//!
//! let walker = BundleWalker::new(Path::new("/Applications"), 1);
//! for bundle in walker.walk().filter_map(Result::ok) {
//!     println!("{}", bundle.display());
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::{DirEntry, WalkDir};

use super::ScanError;

/// File name suffix of an application bundle.
pub const BUNDLE_SUFFIX: &str = ".app";

/// Walker yielding bundle directories at a fixed depth below a root.
#[derive(Debug)]
pub struct BundleWalker {
    root: PathBuf,
    /// Depth at which bundles are expected (1 = direct children).
    depth: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl BundleWalker {
    #[must_use]
    pub fn new(root: &Path, depth: usize) -> Self {
        Self {
            root: root.to_path_buf(),
            depth: depth.max(1),
            shutdown_flag: None,
        }
    }

    /// Stop yielding once the flag is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Bundle paths in file-name order. Unreadable directories are yielded as
    /// errors and skipped; a missing root yields nothing.
    pub fn walk(&self) -> impl Iterator<Item = Result<PathBuf, ScanError>> + '_ {
        let depth = self.depth;
        let present = self.root.is_dir();
        if !present {
            log::debug!("Scan root not present: {}", self.root.display());
        }

        WalkDir::new(&self.root)
            .min_depth(depth)
            .max_depth(depth)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| e.depth() == 0 || e.depth() == depth || !is_bundle_name(e))
            .take_while(move |_| present && !self.is_shutdown_requested())
            .filter_map(move |result| match result {
                Ok(entry) => {
                    if is_bundle_name(&entry) && entry.path().is_dir() {
                        Some(Ok(entry.into_path()))
                    } else {
                        None
                    }
                }
                Err(e) => Some(Err(self.convert_error(e))),
            })
    }

    fn convert_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        let kind = error.io_error().map(std::io::Error::kind);
        match kind {
            Some(std::io::ErrorKind::PermissionDenied) => {
                log::warn!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path)
            }
            Some(std::io::ErrorKind::NotFound) => {
                log::debug!("Vanished during scan: {}", path.display());
                ScanError::NotFound(path)
            }
            _ => {
                log::warn!("Walker error for {}: {}", path.display(), error);
                ScanError::Io {
                    path,
                    source: std::io::Error::other(error.to_string()),
                }
            }
        }
    }
}

fn is_bundle_name(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|n| n.len() > BUNDLE_SUFFIX.len() && n.ends_with(BUNDLE_SUFFIX))
}
