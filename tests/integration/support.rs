//! Fixtures and in-memory fakes shared by the integration tests.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use appsync::enrich::{DescriptionGenerator, GeneratorError};
use appsync::entry::DescriptionKind;
use appsync::icons::{Icon, IconError, IconRenderer};
use appsync::signal::StopSignal;
use image::RgbaImage;

/// Create `root/rel` as a bundle with an XML manifest.
pub fn make_bundle(root: &Path, rel: &str, bundle_id: Option<&str>, background: bool) -> PathBuf {
    let bundle = root.join(rel);
    let contents = bundle.join("Contents");
    fs::create_dir_all(&contents).unwrap();

    let mut plist = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<plist version=\"1.0\">\n<dict>\n",
    );
    if let Some(id) = bundle_id {
        plist.push_str(&format!(
            "  <key>CFBundleIdentifier</key>\n  <string>{id}</string>\n"
        ));
    }
    if background {
        plist.push_str("  <key>LSUIElement</key>\n  <true/>\n");
    }
    plist.push_str("</dict>\n</plist>\n");
    fs::write(contents.join("Info.plist"), plist).unwrap();
    bundle
}

/// Generator fake with scripted replies and failures.
#[derive(Default)]
pub struct ScriptedGenerator {
    pub unavailable: bool,
    /// Every request for these app names fails.
    pub failing_names: HashSet<String>,
    pub fail_expanded: bool,
    /// Request a stop while enriching this app.
    pub stop_during: Option<(String, StopSignal)>,
    pub calls: AtomicUsize,
    pub names_seen: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Distinct app names in the order they were first requested.
    pub fn names(&self) -> Vec<String> {
        self.names_seen.lock().unwrap().clone()
    }

    fn record(&self, name: &str) -> Result<(), GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        {
            let mut names = self.names_seen.lock().unwrap();
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        if let Some((stop_name, stop)) = &self.stop_during {
            if stop_name == name {
                stop.request_stop();
            }
        }
        if self.unavailable {
            return Err(GeneratorError::Unavailable);
        }
        if self.failing_names.contains(name) {
            return Err(GeneratorError::EmptyReply);
        }
        Ok(())
    }
}

impl DescriptionGenerator for ScriptedGenerator {
    fn is_available(&self) -> bool {
        !self.unavailable
    }

    fn generate(
        &self,
        name: &str,
        _bundle_id: Option<&str>,
        kind: DescriptionKind,
        language: &str,
    ) -> Result<String, GeneratorError> {
        self.record(name)?;
        if self.fail_expanded && kind == DescriptionKind::Expanded {
            return Err(GeneratorError::TimedOut(Duration::from_secs(1)));
        }
        Ok(format!("{name} {kind} ({language})"))
    }

    fn categorize(&self, name: &str, _bundle_id: Option<&str>) -> Result<String, GeneratorError> {
        self.record(name)?;
        Ok("Category: Development".into())
    }

    fn list_functions(
        &self,
        name: &str,
        _bundle_id: Option<&str>,
        _language: &str,
    ) -> Result<String, GeneratorError> {
        self.record(name)?;
        Ok("1. Edit source code\n- Run unit tests\nx\n• Debug running programs".into())
    }
}

/// Renderer fake that counts calls and tracks peak concurrency.
pub struct CountingRenderer {
    pub edge: u32,
    pub delay: Duration,
    pub fail: bool,
    pub renders: AtomicUsize,
    active: AtomicUsize,
    pub peak: AtomicUsize,
}

impl CountingRenderer {
    pub fn new(edge: u32, delay: Duration) -> Self {
        Self {
            edge,
            delay,
            fail: false,
            renders: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(8, Duration::ZERO)
        }
    }

    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl IconRenderer for CountingRenderer {
    fn render(&self, path: &Path) -> Result<Icon, IconError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.fail {
            return Err(IconError::NotFound(path.to_path_buf()));
        }
        Ok(Icon::new(RgbaImage::new(self.edge, self.edge)))
    }
}
