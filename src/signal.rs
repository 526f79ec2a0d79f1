//! Signal handling for cooperative batch cancellation.
//!
//! This module provides centralized Ctrl+C handling for the appsync CLI.
//! A [`StopSignal`] wraps an `AtomicBool` that can be shared across threads;
//! the batch driver polls it once per item boundary, so the item being
//! enriched always finishes its current step before the batch stops.
//!
//! # Usage
//!
//! ```rust,no_run
//! use appsync::signal::install_handler;
//!
//! let stop = install_handler().expect("Failed to install signal handler");
//!
//! // Pass `stop` to the batch driver; check it between units of work.
//! if stop.is_stop_requested() {
//!     println!("Stopping after the current item...");
//! }
//! ```
//!
//! # Exit Codes
//!
//! When a signal is received:
//! - The stop flag is set to `true`
//! - A message is printed to stderr
//! - The CLI exits with code 130 (128 + SIGINT) once the batch has stopped

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code for SIGINT (Ctrl+C) interruption.
/// This follows Unix convention: 128 + signal number (SIGINT = 2).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared cancellation token.
///
/// Clones share one flag. Setting it never aborts work in progress; code
/// that honours it checks [`is_stop_requested`](Self::is_stop_requested) at
/// its own safe points.
#[derive(Debug, Clone)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
}

impl StopSignal {
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The underlying flag, for components such as the scanner's walker.
    #[must_use]
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag so the signal can be reused for another batch.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_SIGNAL: OnceLock<StopSignal> = OnceLock::new();

/// Install a Ctrl+C handler that requests a stop.
///
/// Safe to call more than once in a process (e.g. from parallel tests): later
/// calls reset and return the signal installed first. If another hook already
/// owns Ctrl+C, an unhooked signal is returned that still works for manual
/// [`StopSignal::request_stop`] calls.
pub fn install_handler() -> Result<StopSignal, SignalError> {
    if let Some(signal) = GLOBAL_SIGNAL.get() {
        signal.reset();
        return Ok(signal.clone());
    }

    let signal = StopSignal::new();
    let flag = signal.flag();

    match ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(
            std::io::stderr(),
            "\nInterrupted. Finishing the current item..."
        );
        let _ = std::io::stderr().flush();
        log::info!("Stop signal received");
    }) {
        Ok(()) => {
            let _ = GLOBAL_SIGNAL.set(signal.clone());
            Ok(signal)
        }
        Err(e) => {
            if let Some(existing) = GLOBAL_SIGNAL.get() {
                existing.reset();
                return Ok(existing.clone());
            }
            log::debug!("Ctrl+C handler already registered ({e}), using unhooked signal");
            let fallback = StopSignal::new();
            let _ = GLOBAL_SIGNAL.set(fallback.clone());
            Ok(fallback)
        }
    }
}
