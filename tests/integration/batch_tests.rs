use super::support::ScriptedGenerator;
use appsync::enrich::{BatchRunner, BatchSelection, BatchStatus, BatchSummary, Orchestrator};
use appsync::entry::{Entry, LanguagePlan, LocalizedDescription, Source};
use appsync::progress::ProgressCallback;
use appsync::signal::StopSignal;
use appsync::sinks::{MemoryCommentSink, MemorySearchIndex};
use appsync::store::RecordStore;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

fn entries(names: &[&str]) -> Vec<Entry> {
    names
        .iter()
        .map(|name| {
            Entry::new(
                PathBuf::from(format!("/Applications/{name}.app")),
                *name,
                Source::Applications,
            )
        })
        .collect()
}

fn orchestrator(dir: &Path, generator: Arc<ScriptedGenerator>) -> Orchestrator {
    Orchestrator::new(
        Arc::new(RecordStore::open(dir.join("records.json"))),
        generator,
        Arc::new(MemoryCommentSink::new()),
        Arc::new(MemorySearchIndex::new()),
        LanguagePlan::new("en"),
    )
    .with_inter_item_delay(Duration::ZERO)
}

#[derive(Default)]
struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        self.events.lock().unwrap().push(format!("start {phase} {total}"));
    }

    fn on_progress(&self, current: usize, item: &str) {
        self.events.lock().unwrap().push(format!("{current} {item}"));
    }

    fn on_phase_end(&self, phase: &str) {
        self.events.lock().unwrap().push(format!("end {phase}"));
    }
}

#[test]
fn test_batch_processes_items_in_order() {
    let dir = tempdir().unwrap();
    let generator = Arc::new(ScriptedGenerator::new());
    let orch = orchestrator(dir.path(), generator.clone());
    let runner = BatchRunner::new(&orch);
    let mut list = entries(&["A", "B", "C"]);
    let progress = RecordingProgress::default();

    let status = runner.run(
        &mut list,
        BatchSelection::All,
        &StopSignal::new(),
        Some(&progress as &dyn ProgressCallback),
    );

    assert_eq!(
        status,
        BatchStatus::Completed(BatchSummary {
            total: 3,
            updated: 3,
            unchanged: 0,
            skipped: 0,
            failed: 0,
        })
    );
    assert_eq!(runner.status(), status);
    assert_eq!(generator.names(), ["A", "B", "C"]);
    assert!(list.iter().all(|e| e.primary_comment.is_some()));

    let events = progress.events.lock().unwrap();
    assert!(events.contains(&"1 A".to_string()));
    assert!(events.contains(&"3 C".to_string()));
    assert!(events.last().unwrap().starts_with("end"));
}

#[test]
fn test_stop_during_item_finishes_it_and_skips_the_rest() {
    let dir = tempdir().unwrap();
    let stop = StopSignal::new();
    let generator = Arc::new(ScriptedGenerator {
        stop_during: Some(("B".to_string(), stop.clone())),
        ..ScriptedGenerator::new()
    });
    let orch = orchestrator(dir.path(), generator.clone());
    let runner = BatchRunner::new(&orch);
    let mut list = entries(&["A", "B", "C", "D"]);

    let status = runner.run(&mut list, BatchSelection::All, &stop, None);

    assert_eq!(
        status,
        BatchStatus::Stopped(BatchSummary {
            total: 4,
            updated: 2,
            unchanged: 0,
            skipped: 2,
            failed: 0,
        })
    );
    assert_eq!(generator.names(), ["A", "B"]);
    // The interrupted item was completed, not left half written.
    assert!(list[1].has_all_languages(&["en".to_string()]));
    assert!(list[2].descriptions.is_empty());
}

#[test]
fn test_stop_counts_unchanged_items_apart_from_unprocessed() {
    let dir = tempdir().unwrap();
    let stop = StopSignal::new();
    let generator = Arc::new(ScriptedGenerator {
        stop_during: Some(("B".to_string(), stop.clone())),
        ..ScriptedGenerator::new()
    });
    let orch = orchestrator(dir.path(), generator.clone());
    let runner = BatchRunner::new(&orch);
    let mut list = entries(&["A", "B", "C", "D"]);

    // A is already complete, so the real batch finds nothing to do for it.
    runner.run_indices(&mut list, &[0], &StopSignal::new(), None);
    let status = runner.run(&mut list, BatchSelection::All, &stop, None);

    let summary = status.summary().unwrap();
    assert!(matches!(status, BatchStatus::Stopped(_)));
    assert_eq!(summary.unchanged, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.skipped, 2);
    assert_eq!(
        summary.updated + summary.unchanged + summary.skipped + summary.failed,
        summary.total
    );
    assert_eq!(status.to_string(), "Stopped: 1 updated, 1 unchanged, 2 skipped, 0 failed");
}

#[test]
fn test_unavailable_generator_skips_everything() {
    let dir = tempdir().unwrap();
    let generator = Arc::new(ScriptedGenerator {
        unavailable: true,
        ..ScriptedGenerator::new()
    });
    let orch = orchestrator(dir.path(), generator.clone());
    let runner = BatchRunner::new(&orch);
    let mut list = entries(&["A", "B"]);

    let status = runner.run(&mut list, BatchSelection::All, &StopSignal::new(), None);
    assert_eq!(
        status,
        BatchStatus::Completed(BatchSummary {
            total: 2,
            updated: 0,
            unchanged: 0,
            skipped: 2,
            failed: 0,
        })
    );
    assert_eq!(generator.call_count(), 0);
}

#[test]
fn test_failures_are_counted_and_batch_continues() {
    let dir = tempdir().unwrap();
    let generator = Arc::new(ScriptedGenerator {
        failing_names: ["B".to_string()].into_iter().collect(),
        ..ScriptedGenerator::new()
    });
    let orch = orchestrator(dir.path(), generator.clone());
    let runner = BatchRunner::new(&orch);
    let mut list = entries(&["A", "B", "C"]);

    let summary = runner
        .run(&mut list, BatchSelection::All, &StopSignal::new(), None)
        .summary()
        .unwrap();
    assert_eq!(summary.updated, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(generator.names(), ["A", "B", "C"]);
}

#[test]
fn test_selection_skips_complete_entries() {
    let dir = tempdir().unwrap();
    let generator = Arc::new(ScriptedGenerator::new());
    let orch = orchestrator(dir.path(), generator.clone());
    let runner = BatchRunner::new(&orch);
    let mut list = entries(&["Done", "Todo"]);
    list[0].upsert_description(LocalizedDescription::new(
        "en",
        Some("Short".into()),
        Some("Long".into()),
    ));

    assert_eq!(runner.select(&list, BatchSelection::MissingDescriptions), vec![1]);
    assert_eq!(runner.select(&list, BatchSelection::All), vec![0, 1]);

    let status = runner.run(
        &mut list,
        BatchSelection::MissingDescriptions,
        &StopSignal::new(),
        None,
    );
    assert_eq!(status.summary().unwrap().total, 1);
    assert_eq!(generator.names(), ["Todo"]);
}

#[test]
fn test_stop_before_start_processes_nothing() {
    let dir = tempdir().unwrap();
    let generator = Arc::new(ScriptedGenerator::new());
    let orch = orchestrator(dir.path(), generator.clone());
    let runner = BatchRunner::new(&orch);
    let mut list = entries(&["A", "B"]);
    let stop = StopSignal::new();
    stop.request_stop();

    let status = runner.run_indices(&mut list, &[0, 1], &stop, None);
    assert!(matches!(status, BatchStatus::Stopped(s) if s.skipped == 2));
    assert_eq!(generator.call_count(), 0);
}
