//! Per-file comment storage.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::entry::{truncate_chars, COMMENT_MAX_CHARS};

/// Read/write access to the short annotation the OS keeps per file.
pub trait CommentSink: Send + Sync {
    /// Current comment, `None` when empty or unreadable.
    fn get(&self, path: &Path) -> Option<String>;

    /// Replace the comment. `false` when the write failed.
    fn set(&self, path: &Path, comment: &str) -> bool;
}

const OSASCRIPT: &str = "/usr/bin/osascript";

/// Finder comments, driven through `osascript`.
#[derive(Debug, Clone, Default)]
pub struct FinderComments;

impl FinderComments {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn run(script: &str, capture: bool) -> Option<String> {
        let output = Command::new(OSASCRIPT)
            .arg("-e")
            .arg(script)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .stdout(if capture { Stdio::piped() } else { Stdio::null() })
            .output();

        match output {
            Ok(out) if out.status.success() => {
                Some(String::from_utf8_lossy(&out.stdout).trim().to_string())
            }
            Ok(out) => {
                log::debug!("osascript exited with {}", out.status);
                None
            }
            Err(e) => {
                log::debug!("Failed to run {}: {}", OSASCRIPT, e);
                None
            }
        }
    }
}

/// Escape a value for use inside an AppleScript string literal.
#[must_use]
pub fn escape_applescript(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

impl CommentSink for FinderComments {
    fn get(&self, path: &Path) -> Option<String> {
        let script = format!(
            "tell application \"Finder\"\n  set theFile to POSIX file \"{}\" as alias\n  return comment of theFile\nend tell",
            escape_applescript(&path.to_string_lossy())
        );
        Self::run(&script, true).filter(|c| !c.is_empty())
    }

    fn set(&self, path: &Path, comment: &str) -> bool {
        let comment = truncate_chars(comment, COMMENT_MAX_CHARS);
        let script = format!(
            "tell application \"Finder\"\n  set theFile to POSIX file \"{}\" as alias\n  set comment of theFile to \"{}\"\nend tell",
            escape_applescript(&path.to_string_lossy()),
            escape_applescript(&comment)
        );
        Self::run(&script, false).is_some()
    }
}

/// In-process comment map, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryCommentSink {
    comments: Mutex<HashMap<PathBuf, String>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryCommentSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed comments, e.g. to simulate pre-existing user notes.
    #[must_use]
    pub fn with_comments<I, P, S>(comments: I) -> Self
    where
        I: IntoIterator<Item = (P, S)>,
        P: Into<PathBuf>,
        S: Into<String>,
    {
        let sink = Self::new();
        {
            let mut map = sink.comments.lock().unwrap_or_else(PoisonError::into_inner);
            for (path, comment) in comments {
                map.insert(path.into(), comment.into());
            }
        }
        sink
    }

    /// Make every subsequent `set` fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Successful writes so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl CommentSink for MemoryCommentSink {
    fn get(&self, path: &Path) -> Option<String> {
        self.comments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .filter(|c| !c.is_empty())
            .cloned()
    }

    fn set(&self, path: &Path, comment: &str) -> bool {
        if self.fail_writes.load(Ordering::SeqCst) {
            return false;
        }
        self.comments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_path_buf(), truncate_chars(comment, COMMENT_MAX_CHARS));
        self.writes.fetch_add(1, Ordering::SeqCst);
        true
    }
}
