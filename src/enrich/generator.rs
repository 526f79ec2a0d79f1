//! Description generator capability and its command-line adapter.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use super::prompt;
use crate::entry::DescriptionKind;

/// Binary name searched for on `PATH`.
pub const GENERATOR_BINARY: &str = "claude";

/// Default bound on a single generator call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// How long to wait for pipe output once the process group has been killed.
const DRAIN_GRACE: Duration = Duration::from_millis(200);

/// Errors from a single generator call. Each affects one field only.
#[derive(thiserror::Error, Debug)]
pub enum GeneratorError {
    /// No generator binary was found at startup.
    #[error("Generator is not available")]
    Unavailable,

    #[error("Failed to start {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Generator exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("Generator timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Generator returned an empty reply")]
    EmptyReply,
}

/// External text generation.
///
/// Callers check [`is_available`](Self::is_available) first; every request on
/// an unavailable generator returns [`GeneratorError::Unavailable`].
pub trait DescriptionGenerator: Send + Sync {
    fn is_available(&self) -> bool;

    fn generate(
        &self,
        name: &str,
        bundle_id: Option<&str>,
        kind: DescriptionKind,
        language: &str,
    ) -> Result<String, GeneratorError>;

    /// Free-text reply naming one category.
    fn categorize(&self, name: &str, bundle_id: Option<&str>) -> Result<String, GeneratorError>;

    /// Newline-delimited list of verb phrases.
    fn list_functions(
        &self,
        name: &str,
        bundle_id: Option<&str>,
        language: &str,
    ) -> Result<String, GeneratorError>;
}

/// Runs `<binary> -p <prompt>` and reads the trimmed stdout.
#[derive(Debug, Clone)]
pub struct CliGenerator {
    binary: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl CliGenerator {
    /// Use an explicit binary (or none). `timeout: None` waits forever.
    #[must_use]
    pub fn new(binary: Option<PathBuf>, timeout: Option<Duration>) -> Self {
        Self { binary, timeout }
    }

    /// Probe `extra_paths`, the standard install locations and `PATH` once.
    #[must_use]
    pub fn discover(extra_paths: &[PathBuf], timeout: Option<Duration>) -> Self {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        let binary = locate_binary(extra_paths, home.as_deref(), std::env::var_os("PATH"));
        match &binary {
            Some(path) => log::info!("Using generator at {}", path.display()),
            None => log::warn!("Generator binary '{}' not found", GENERATOR_BINARY),
        }
        Self::new(binary, timeout)
    }

    #[must_use]
    pub fn binary(&self) -> Option<&Path> {
        self.binary.as_deref()
    }

    fn run(&self, what: &str, prompt: &str) -> Result<String, GeneratorError> {
        let binary = self.binary.as_ref().ok_or(GeneratorError::Unavailable)?;
        let started = Instant::now();
        let result = self.run_binary(binary, prompt);
        let duration_ms = started.elapsed().as_millis();

        match &result {
            Ok(reply) => log::debug!(
                "Generator {} ok: duration_ms={} chars={}",
                what,
                duration_ms,
                reply.chars().count()
            ),
            Err(e) => log::warn!("Generator {} failed: duration_ms={} error={}", what, duration_ms, e),
        }
        result
    }

    fn run_binary(&self, binary: &Path, prompt: &str) -> Result<String, GeneratorError> {
        let mut command = Command::new(binary);
        command
            .arg("-p")
            .arg(prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Own group, so a timeout also reaches wrapper-spawned children.
            command.process_group(0);
        }
        let mut child = command.spawn().map_err(|source| GeneratorError::Spawn {
            path: binary.to_path_buf(),
            source,
        })?;

        let deadline = self.timeout.map(|t| Instant::now() + t);
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        // The drain threads are detached on timeout; killing the group
        // closes the pipes and lets them finish on their own.
        let Some(status) = wait_until(&mut child, deadline) else {
            return Err(GeneratorError::TimedOut(self.timeout.unwrap_or_default()));
        };
        let stdout = collect(&stdout, &child, deadline);
        let stderr = collect(&stderr, &child, deadline);

        if !status.success() {
            return Err(GeneratorError::Failed {
                status,
                stderr: stderr.trim().to_string(),
            });
        }

        let reply = stdout.trim();
        if reply.is_empty() {
            Err(GeneratorError::EmptyReply)
        } else {
            Ok(reply.to_string())
        }
    }
}

impl DescriptionGenerator for CliGenerator {
    fn is_available(&self) -> bool {
        self.binary.is_some()
    }

    fn generate(
        &self,
        name: &str,
        bundle_id: Option<&str>,
        kind: DescriptionKind,
        language: &str,
    ) -> Result<String, GeneratorError> {
        let prompt = prompt::description_prompt(name, bundle_id, kind, language);
        self.run(&format!("{kind}/{language} for {name}"), &prompt)
    }

    fn categorize(&self, name: &str, bundle_id: Option<&str>) -> Result<String, GeneratorError> {
        self.run(
            &format!("category for {name}"),
            &prompt::category_prompt(name, bundle_id),
        )
    }

    fn list_functions(
        &self,
        name: &str,
        bundle_id: Option<&str>,
        language: &str,
    ) -> Result<String, GeneratorError> {
        self.run(
            &format!("functions/{language} for {name}"),
            &prompt::functions_prompt(name, bundle_id, language),
        )
    }
}

/// Read a child pipe to the end on a helper thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

/// Pipe output, bounded by `deadline`.
///
/// A grandchild that inherited the pipe can keep it open after the direct
/// child exited; past the deadline the group is killed and the reader gets a
/// short grace period to hand over what it has.
fn collect(rx: &Receiver<String>, child: &Child, deadline: Option<Instant>) -> String {
    let Some(deadline) = deadline else {
        return rx.recv().unwrap_or_default();
    };
    let remaining = deadline.saturating_duration_since(Instant::now());
    match rx.recv_timeout(remaining) {
        Ok(text) => text,
        Err(_) => {
            log::debug!("Generator output still open after exit, killing group {}", child.id());
            kill_group(child.id());
            rx.recv_timeout(DRAIN_GRACE).unwrap_or_default()
        }
    }
}

/// `None` when the deadline passed; the group is killed and the child reaped.
fn wait_until(child: &mut Child, deadline: Option<Instant>) -> Option<ExitStatus> {
    let Some(deadline) = deadline else {
        return child.wait().ok();
    };
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) if Instant::now() >= deadline => {
                kill_group(child.id());
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                log::warn!("Failed to poll generator process: {}", e);
                kill_group(child.id());
                let _ = child.kill();
                return child.wait().ok();
            }
        }
    }
}

/// SIGKILL every process in the group led by `pid`.
#[cfg(unix)]
fn kill_group(pid: u32) {
    let group = format!("-{pid}");
    let result = Command::new("kill")
        .args(["-s", "KILL", "--", &group])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    if let Err(e) = result {
        log::debug!("Failed to kill process group {}: {}", pid, e);
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: u32) {}

/// Well-known install locations, checked in order before `PATH`.
#[must_use]
pub fn standard_locations(home: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("/usr/local/bin").join(GENERATOR_BINARY),
        PathBuf::from("/opt/homebrew/bin").join(GENERATOR_BINARY),
    ];
    if let Some(home) = home {
        paths.push(home.join(".local/bin").join(GENERATOR_BINARY));
        paths.push(home.join("bin").join(GENERATOR_BINARY));
        paths.push(home.join(".claude/local").join(GENERATOR_BINARY));
    }
    paths
}

/// First existing file among `extra`, the standard locations and `PATH`.
#[must_use]
pub fn locate_binary(
    extra: &[PathBuf],
    home: Option<&Path>,
    path_var: Option<std::ffi::OsString>,
) -> Option<PathBuf> {
    let from_path = path_var
        .map(|p| {
            std::env::split_paths(&p)
                .map(|dir| dir.join(GENERATOR_BINARY))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    extra
        .iter()
        .cloned()
        .chain(standard_locations(home))
        .chain(from_path)
        .find(|candidate| candidate.is_file())
}
