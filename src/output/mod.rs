//! Output formatters for inventory listings and batch results.
//!
//! This module provides different output formats:
//! - Colored text for terminals
//! - JSON for automation and scripting
//! - CSV for spreadsheet import
//!
//! # Example
//!
//! ```no_run
//! use appsync::inventory::Inventory;
//! use appsync::output::json::JsonOutput;
//! use appsync::error::ExitCode;
//!
//! let inventory = Inventory::new(Vec::new(), "en");
//! let entries: Vec<_> = inventory.entries().iter().collect();
//! let output = JsonOutput::new(&entries, &inventory.statistics(), "en", ExitCode::Success);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod csv;
pub mod json;
pub mod text;

// Re-export main types
pub use csv::CsvOutput;
pub use json::{write_json, JsonBatchOutput, JsonOutput};
pub use text::{set_color_enabled, TextOutput};
