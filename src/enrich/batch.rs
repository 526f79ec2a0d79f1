//! Sequential batch enrichment with cooperative cancellation.

use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::orchestrator::{ItemStatus, Orchestrator};
use crate::entry::Entry;
use crate::progress::{ProgressCallback, PHASE_ENRICH};
use crate::signal::StopSignal;

/// Granularity at which the inter-item pause notices a stop request.
const STOP_POLL: Duration = Duration::from_millis(50);

/// Which entries a batch visits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchSelection {
    All,
    /// Entries lacking a complete description in some target language.
    #[default]
    MissingDescriptions,
}

/// Counters reported when a batch ends.
///
/// Every selected item lands in exactly one counter, so the four counters sum
/// to `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub updated: usize,
    /// Processed items that needed no fetch and no comment write.
    pub unchanged: usize,
    /// Items never processed: stopped early, generator missing or bad index.
    pub skipped: usize,
    pub failed: usize,
}

/// Batch state machine: `Idle → Running → Completed | Stopped`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BatchStatus {
    #[default]
    Idle,
    Running {
        current: usize,
        total: usize,
        name: String,
    },
    Completed(BatchSummary),
    Stopped(BatchSummary),
}

impl BatchStatus {
    #[must_use]
    pub fn summary(&self) -> Option<BatchSummary> {
        match self {
            Self::Completed(s) | Self::Stopped(s) => Some(*s),
            Self::Idle | Self::Running { .. } => None,
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Running {
                current,
                total,
                name,
            } => write!(f, "Updating {name} ({current}/{total})"),
            Self::Completed(s) => write!(
                f,
                "Completed: {} updated, {} unchanged, {} skipped, {} failed",
                s.updated, s.unchanged, s.skipped, s.failed
            ),
            Self::Stopped(s) => write!(
                f,
                "Stopped: {} updated, {} unchanged, {} skipped, {} failed",
                s.updated, s.unchanged, s.skipped, s.failed
            ),
        }
    }
}

/// Runs an [`Orchestrator`] over many entries, one at a time.
///
/// The current [`BatchStatus`] can be read from another thread while a batch
/// runs.
#[derive(Debug)]
pub struct BatchRunner<'a> {
    orchestrator: &'a Orchestrator,
    status: Mutex<BatchStatus>,
}

impl<'a> BatchRunner<'a> {
    #[must_use]
    pub fn new(orchestrator: &'a Orchestrator) -> Self {
        Self {
            orchestrator,
            status: Mutex::new(BatchStatus::Idle),
        }
    }

    #[must_use]
    pub fn status(&self) -> BatchStatus {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_status(&self, status: BatchStatus) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }

    /// Indices of the entries `selection` picks, in list order.
    #[must_use]
    pub fn select(&self, entries: &[Entry], selection: BatchSelection) -> Vec<usize> {
        let targets = self.orchestrator.languages().targets();
        entries
            .iter()
            .enumerate()
            .filter(|(_, e)| match selection {
                BatchSelection::All => true,
                BatchSelection::MissingDescriptions => !e.has_all_languages(targets),
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Enrich the selected entries strictly sequentially.
    ///
    /// `stop` is checked before each item; once set, the items not yet started
    /// are counted as skipped and the batch ends as [`BatchStatus::Stopped`].
    /// Items that were processed but needed no work count as unchanged.
    pub fn run(
        &self,
        entries: &mut [Entry],
        selection: BatchSelection,
        stop: &StopSignal,
        progress: Option<&dyn ProgressCallback>,
    ) -> BatchStatus {
        let selected = self.select(entries, selection);
        self.run_indices(entries, &selected, stop, progress)
    }

    /// Like [`run`](Self::run) over an explicit index list.
    pub fn run_indices(
        &self,
        entries: &mut [Entry],
        indices: &[usize],
        stop: &StopSignal,
        progress: Option<&dyn ProgressCallback>,
    ) -> BatchStatus {
        let total = indices.len();
        let mut summary = BatchSummary {
            total,
            ..BatchSummary::default()
        };

        if !self.orchestrator.is_available() {
            log::warn!("Generator unavailable; skipping batch of {}", total);
            summary.skipped = total;
            let status = BatchStatus::Completed(summary);
            self.set_status(status.clone());
            return status;
        }

        log::info!("Enriching {} entries", total);
        if let Some(p) = progress {
            p.on_phase_start(PHASE_ENRICH, total);
        }
        let started = Instant::now();
        let mut stopped = false;

        for (position, &index) in indices.iter().enumerate() {
            if stop.is_stop_requested() {
                summary.skipped += total - position;
                stopped = true;
                log::info!("Stop requested; {} entries left unprocessed", total - position);
                break;
            }
            let Some(entry) = entries.get_mut(index) else {
                summary.skipped += 1;
                continue;
            };

            let current = position + 1;
            self.set_status(BatchStatus::Running {
                current,
                total,
                name: entry.name.clone(),
            });
            if let Some(p) = progress {
                p.on_progress(current, &entry.name);
            }

            match self.orchestrator.enrich(entry).status() {
                ItemStatus::Updated => summary.updated += 1,
                ItemStatus::Skipped => summary.unchanged += 1,
                ItemStatus::Failed => summary.failed += 1,
            }

            if current < total {
                self.pause(stop);
            }
        }

        let status = if stopped {
            BatchStatus::Stopped(summary)
        } else {
            BatchStatus::Completed(summary)
        };
        log::info!("{} in {:.1}s", status, started.elapsed().as_secs_f64());
        if let Some(p) = progress {
            p.on_message(&status.to_string());
            p.on_phase_end(PHASE_ENRICH);
        }
        self.set_status(status.clone());
        status
    }

    /// Inter-item delay, cut short by a stop request.
    fn pause(&self, stop: &StopSignal) {
        let deadline = Instant::now() + self.orchestrator.inter_item_delay();
        while !stop.is_stop_requested() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(STOP_POLL.min(deadline - now));
        }
    }
}
