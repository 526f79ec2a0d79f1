//! JSON output formatter for inventory listings and batch results.
//!
//! Provides machine-readable JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "entries": [
//!     {
//!       "name": "Safari",
//!       "path": "/Applications/Safari.app",
//!       "bundle_identifier": "com.apple.Safari",
//!       "source": "Applications",
//!       "is_background_only": false,
//!       "categories": ["Productivity"],
//!       "function_tags": ["browse websites"],
//!       "description": "Web browser | ...",
//!       "comment": "Web browser",
//!       "descriptions": [
//!         { "language": "en", "short": "Web browser", "expanded": "..." }
//!       ]
//!     }
//!   ],
//!   "summary": {
//!     "total": 1,
//!     "with_description": 1,
//!     "without_description": 0,
//!     "exit_code": 0,
//!     "exit_code_name": "AS000"
//!   }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::enrich::BatchStatus;
use crate::entry::Entry;
use crate::error::ExitCode;
use crate::inventory::InventoryStats;

/// One localized description in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDescription {
    pub language: String,
    pub short: Option<String>,
    pub expanded: Option<String>,
}

/// A single inventory entry in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonEntry {
    pub name: String,
    pub path: String,
    pub bundle_identifier: Option<String>,
    pub source: String,
    pub is_background_only: bool,
    pub categories: Vec<String>,
    pub function_tags: Vec<String>,
    /// Preferred description for the system language
    pub description: Option<String>,
    pub comment: Option<String>,
    pub descriptions: Vec<JsonDescription>,
}

impl JsonEntry {
    #[must_use]
    pub fn from_entry(entry: &Entry, system_language: &str) -> Self {
        Self {
            name: entry.name.clone(),
            path: entry.path.to_string_lossy().into_owned(),
            bundle_identifier: entry.bundle_identifier.clone(),
            source: entry.source.label().to_string(),
            is_background_only: entry.is_background_only,
            categories: entry
                .categories
                .iter()
                .map(|c| c.label().to_string())
                .collect(),
            function_tags: entry.function_tags.clone(),
            description: entry.display_description(system_language),
            comment: entry.primary_comment.clone(),
            descriptions: entry
                .descriptions
                .iter()
                .map(|d| JsonDescription {
                    language: d.language_code.clone(),
                    short: d.short_text.clone(),
                    expanded: d.expanded_text.clone(),
                })
                .collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    pub total: usize,
    pub with_description: usize,
    pub without_description: usize,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "AS000")
    pub exit_code_name: String,
}

impl JsonSummary {
    #[must_use]
    pub fn new(stats: &InventoryStats, exit_code: ExitCode) -> Self {
        Self {
            total: stats.total,
            with_description: stats.with_description,
            without_description: stats.without_description,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON listing.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    pub entries: Vec<JsonEntry>,
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build a listing; the summary covers `stats`, which may describe a
    /// larger set than the listed `entries`.
    #[must_use]
    pub fn new(
        entries: &[&Entry],
        stats: &InventoryStats,
        system_language: &str,
        exit_code: ExitCode,
    ) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|e| JsonEntry::from_entry(e, system_language))
                .collect(),
            summary: JsonSummary::new(stats, exit_code),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the listing followed by a newline.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        write_json(writer, self)
    }
}

/// Batch result in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonBatchOutput {
    pub status: BatchStatus,
    pub exit_code: i32,
    pub exit_code_name: String,
}

impl JsonBatchOutput {
    #[must_use]
    pub fn new(status: BatchStatus, exit_code: ExitCode) -> Self {
        Self {
            status,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        write_json(writer, self)
    }
}

/// Pretty-print any serializable value followed by a newline.
pub fn write_json<W: Write, T: Serialize + ?Sized>(
    writer: &mut W,
    value: &T,
) -> Result<(), JsonOutputError> {
    let json = serde_json::to_string_pretty(value)?;
    writer.write_all(json.as_bytes())?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Errors that can occur during JSON output generation.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
