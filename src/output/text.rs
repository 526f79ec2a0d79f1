//! Human-readable, colored text output.
//!
//! Colors come from `yansi`; call [`set_color_enabled`] once at startup to
//! turn them off for `--no-color` or when stdout is not a terminal.

use std::io::{self, Write};

use yansi::Paint;

use crate::enrich::BatchStatus;
use crate::entry::Entry;
use crate::inventory::InventoryStats;

/// Globally enable or disable ANSI colors.
pub fn set_color_enabled(enabled: bool) {
    if enabled {
        yansi::enable();
    } else {
        yansi::disable();
    }
}

/// Entry listing in text form.
pub struct TextOutput<'a> {
    entries: &'a [&'a Entry],
    system_language: &'a str,
}

impl<'a> TextOutput<'a> {
    #[must_use]
    pub fn new(entries: &'a [&'a Entry], system_language: &'a str) -> Self {
        Self {
            entries,
            system_language,
        }
    }

    /// One block per entry: name, source and id, then description and tags.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for entry in self.entries {
            write!(writer, "{}", entry.name.as_str().bold())?;
            write!(writer, "  {}", entry.source.label().dim())?;
            if let Some(id) = &entry.bundle_identifier {
                write!(writer, "  {}", id.as_str().dim())?;
            }
            if entry.is_background_only {
                write!(writer, "  {}", "menu bar".cyan())?;
            }
            writeln!(writer)?;

            match entry.display_description(self.system_language) {
                Some(text) => writeln!(writer, "  {text}")?,
                None => writeln!(writer, "  {}", "no description".yellow())?,
            }
            if !entry.categories.is_empty() {
                let labels: Vec<&str> = entry.categories.iter().map(|c| c.label()).collect();
                writeln!(writer, "  {} {}", "categories:".dim(), labels.join(", "))?;
            }
            if !entry.function_tags.is_empty() {
                writeln!(
                    writer,
                    "  {} {}",
                    "does:".dim(),
                    entry.function_tags.join(", ")
                )?;
            }
        }
        Ok(())
    }
}

/// `3 apps, 2 described, 1 missing a description`.
pub fn write_stats<W: Write>(writer: &mut W, stats: &InventoryStats) -> io::Result<()> {
    writeln!(
        writer,
        "{} apps, {} described, {} missing a description ({:.0}% coverage)",
        stats.total.bold(),
        stats.with_description.green(),
        stats.without_description.yellow(),
        stats.coverage() * 100.0
    )
}

/// Final batch status line, colored by outcome.
pub fn write_batch_status<W: Write>(writer: &mut W, status: &BatchStatus) -> io::Result<()> {
    let line = status.to_string();
    match status {
        BatchStatus::Completed(summary) if summary.failed == 0 => {
            writeln!(writer, "{}", line.green())
        }
        BatchStatus::Completed(_) => writeln!(writer, "{}", line.yellow()),
        BatchStatus::Stopped(_) => writeln!(writer, "{}", line.red()),
        BatchStatus::Idle | BatchStatus::Running { .. } => writeln!(writer, "{line}"),
    }
}

/// `label: value` line with a dimmed label.
pub fn write_field<W: Write>(writer: &mut W, label: &str, value: &str) -> io::Result<()> {
    writeln!(writer, "{} {}", format!("{label}:").dim(), value)
}
