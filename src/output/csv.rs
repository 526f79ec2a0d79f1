//! CSV output formatter for inventory listings.
//!
//! One row is generated for each entry. List-valued fields are joined with
//! `"; "` so every row has the same column count.
//!
//! # Columns
//!
//! - `name`: Display name
//! - `path`: Bundle path
//! - `bundle_identifier`: Empty when the manifest had none
//! - `source`: Install location label
//! - `background_only`: `true` for menu-bar/agent applications
//! - `categories`, `function_tags`
//! - `description`: Preferred description for the system language
//! - `comment`: Current primary comment
//! - `languages`: Languages with a stored description

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::entry::Entry;

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    name: &'a str,
    path: String,
    bundle_identifier: &'a str,
    source: &'static str,
    background_only: bool,
    categories: String,
    function_tags: String,
    description: String,
    comment: &'a str,
    languages: String,
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    entries: &'a [&'a Entry],
    system_language: &'a str,
}

impl<'a> CsvOutput<'a> {
    #[must_use]
    pub fn new(entries: &'a [&'a Entry], system_language: &'a str) -> Self {
        Self {
            entries,
            system_language,
        }
    }

    /// Write the CSV output to the given writer.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        for entry in self.entries {
            let row = CsvRow {
                name: &entry.name,
                path: entry.path.to_string_lossy().into_owned(),
                bundle_identifier: entry.bundle_identifier.as_deref().unwrap_or_default(),
                source: entry.source.label(),
                background_only: entry.is_background_only,
                categories: entry
                    .categories
                    .iter()
                    .map(|c| c.label())
                    .collect::<Vec<_>>()
                    .join("; "),
                function_tags: entry.function_tags.join("; "),
                description: entry
                    .display_description(self.system_language)
                    .unwrap_or_default(),
                comment: entry.primary_comment.as_deref().unwrap_or_default(),
                languages: entry
                    .descriptions
                    .iter()
                    .map(|d| d.language_code.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
            };
            csv_writer.serialize(row)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
