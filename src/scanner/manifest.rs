//! Bundle manifest (`Contents/Info.plist`) reading.
//!
//! Both the XML and the binary property-list forms are read with the `plist`
//! crate, and only keys of the top-level dictionary count. Missing or
//! undecodable files produce an empty [`Manifest`]; a manifest problem never
//! stops a scan.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use plist::{Dictionary, Value};

/// The fields the scanner needs from a bundle manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub bundle_identifier: Option<String>,
    /// `LSUIElement`: agent application without a Dock icon.
    pub is_background_only: bool,
}

/// Errors reading a manifest. Absorbed by [`PlistManifestReader::read`].
#[derive(thiserror::Error, Debug)]
pub enum ManifestError {
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid property list {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: plist::Error,
    },

    #[error("Property list root is not a dictionary: {0}")]
    NotADictionary(PathBuf),
}

/// Capability that reads identity fields from a bundle.
pub trait ManifestReader: Send + Sync {
    fn read(&self, bundle: &Path) -> Manifest;
}

/// Reads `Contents/Info.plist`, XML or binary.
#[derive(Debug, Clone, Default)]
pub struct PlistManifestReader;

impl PlistManifestReader {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse the manifest of `bundle`, surfacing why it could not be read.
    pub fn try_read(&self, bundle: &Path) -> Result<Manifest, ManifestError> {
        let path = bundle.join("Contents").join("Info.plist");
        let bytes = fs::read(&path).map_err(|source| ManifestError::Io {
            path: path.clone(),
            source,
        })?;
        let value = Value::from_reader(Cursor::new(bytes)).map_err(|source| ManifestError::Decode {
            path: path.clone(),
            source,
        })?;
        let dict = value
            .as_dictionary()
            .ok_or_else(|| ManifestError::NotADictionary(path.clone()))?;
        Ok(manifest_from_dict(dict))
    }
}

impl ManifestReader for PlistManifestReader {
    fn read(&self, bundle: &Path) -> Manifest {
        self.try_read(bundle).unwrap_or_else(|e| {
            log::debug!("Empty manifest for {}: {}", bundle.display(), e);
            Manifest::default()
        })
    }
}

/// Extract identity fields from XML plist text; undecodable text yields an
/// empty manifest.
#[must_use]
pub fn parse_plist_xml(text: &str) -> Manifest {
    match Value::from_reader_xml(text.as_bytes()) {
        Ok(value) => value
            .as_dictionary()
            .map(manifest_from_dict)
            .unwrap_or_default(),
        Err(e) => {
            log::trace!("Undecodable plist text: {}", e);
            Manifest::default()
        }
    }
}

fn manifest_from_dict(dict: &Dictionary) -> Manifest {
    let bundle_identifier = dict
        .get("CFBundleIdentifier")
        .and_then(Value::as_string)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    // Seen in the wild as a boolean, a "1"/"true" string, or the integer 1.
    let is_background_only = match dict.get("LSUIElement") {
        Some(Value::Boolean(flag)) => *flag,
        Some(Value::String(s)) => {
            let s = s.trim();
            s == "1" || s.eq_ignore_ascii_case("true")
        }
        Some(Value::Integer(i)) => i.as_signed() == Some(1),
        _ => false,
    };

    Manifest {
        bundle_identifier,
        is_background_only,
    }
}
