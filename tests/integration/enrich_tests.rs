use super::support::ScriptedGenerator;
use appsync::enrich::{CommentOutcome, ItemStatus, Orchestrator};
use appsync::entry::{Category, Entry, LanguagePlan, Source};
use appsync::sinks::{
    CommentSink, FileSearchIndex, IndexDocument, MemoryCommentSink, MemorySearchIndex,
    SearchIndexSink, APPS_DOMAIN,
};
use appsync::store::RecordStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

struct Harness {
    _dir: TempDir,
    store: Arc<RecordStore>,
    generator: Arc<ScriptedGenerator>,
    comments: Arc<MemoryCommentSink>,
    index: Arc<MemorySearchIndex>,
    orchestrator: Orchestrator,
}

fn harness(generator: ScriptedGenerator, comments: MemoryCommentSink, language: &str) -> Harness {
    let dir = tempdir().unwrap();
    let store = Arc::new(RecordStore::open(dir.path().join("records.json")));
    let generator = Arc::new(generator);
    let comments = Arc::new(comments);
    let index = Arc::new(MemorySearchIndex::new());
    let orchestrator = Orchestrator::new(
        Arc::clone(&store),
        generator.clone(),
        comments.clone(),
        index.clone(),
        LanguagePlan::new(language),
    )
    .with_inter_item_delay(Duration::ZERO);
    Harness {
        _dir: dir,
        store,
        generator,
        comments,
        index,
        orchestrator,
    }
}

fn notes() -> Entry {
    let mut entry = Entry::new(PathBuf::from("/Applications/Notes.app"), "Notes", Source::Applications);
    entry.bundle_identifier = Some("com.example.notes".into());
    entry
}

#[test]
fn test_enrich_fills_every_field() {
    let h = harness(ScriptedGenerator::new(), MemoryCommentSink::new(), "fi");
    let mut entry = notes();

    let outcome = h.orchestrator.enrich(&mut entry);
    assert_eq!(outcome.status(), ItemStatus::Updated);
    assert_eq!(outcome.fetched, 6);
    assert_eq!(outcome.failed_fields, 0);
    assert_eq!(outcome.comment, CommentOutcome::Written);
    assert!(outcome.categorized);
    assert_eq!(outcome.tags_added, 3);
    assert_eq!(h.generator.call_count(), 6);

    let expected_comment = "Notes short (fi) | Notes expanded (fi)";
    assert_eq!(entry.primary_comment.as_deref(), Some(expected_comment));
    assert_eq!(h.comments.get(&entry.path).as_deref(), Some(expected_comment));
    assert_eq!(entry.categories, vec![Category::Development]);
    assert_eq!(
        entry.function_tags,
        vec!["edit source code", "run unit tests", "debug running programs"]
    );

    let record = h.store.record(&entry.path).unwrap();
    assert_eq!(record.descriptions.len(), 2);
    assert_eq!(
        record.description("en").unwrap().short_text.as_deref(),
        Some("Notes short (en)")
    );
    assert_eq!(record.primary_comment.as_deref(), Some(expected_comment));
    assert_eq!(record.categories, vec![Category::Development]);
    assert_eq!(record.function_tags.len(), 3);
}

#[test]
fn test_second_pass_is_a_no_op() {
    let h = harness(ScriptedGenerator::new(), MemoryCommentSink::new(), "en");
    let mut entry = notes();
    h.orchestrator.enrich(&mut entry);
    let calls = h.generator.call_count();
    let writes = h.comments.write_count();

    let outcome = h.orchestrator.enrich(&mut entry);
    assert_eq!(outcome.status(), ItemStatus::Skipped);
    assert_eq!(outcome.comment, CommentOutcome::Unchanged);
    assert_eq!(h.generator.call_count(), calls);
    assert_eq!(h.comments.write_count(), writes);
}

#[test]
fn test_failed_expanded_half_keeps_short_half() {
    let generator = ScriptedGenerator {
        fail_expanded: true,
        ..ScriptedGenerator::new()
    };
    let h = harness(generator, MemoryCommentSink::new(), "en");
    let mut entry = notes();

    let outcome = h.orchestrator.enrich(&mut entry);
    assert_eq!(outcome.status(), ItemStatus::Failed);
    assert_eq!(outcome.failed_fields, 1);

    let record = h.store.record(&entry.path).unwrap();
    let en = record.description("en").unwrap();
    assert_eq!(en.short_text.as_deref(), Some("Notes short (en)"));
    assert!(en.expanded_text.is_none());
    // Short alone still makes a comment.
    assert_eq!(entry.primary_comment.as_deref(), Some("Notes short (en)"));

    // A later pass fetches only the missing half.
    let retry = Orchestrator::new(
        Arc::clone(&h.store),
        Arc::new(ScriptedGenerator::new()),
        h.comments.clone(),
        h.index.clone(),
        LanguagePlan::new("en"),
    );
    let outcome = retry.enrich(&mut entry);
    assert_eq!(outcome.fetched, 1);
    let en = h.store.record(&entry.path).unwrap().description("en").cloned().unwrap();
    assert_eq!(en.short_text.as_deref(), Some("Notes short (en)"));
    assert_eq!(en.expanded_text.as_deref(), Some("Notes expanded (en)"));
}

#[test]
fn test_comment_write_failure_keeps_descriptions() {
    let comments = MemoryCommentSink::new();
    comments.set_fail_writes(true);
    let h = harness(ScriptedGenerator::new(), comments, "en");
    let mut entry = notes();

    let outcome = h.orchestrator.enrich(&mut entry);
    assert_eq!(outcome.comment, CommentOutcome::Failed);
    assert_eq!(outcome.status(), ItemStatus::Failed);
    assert!(entry.primary_comment.is_none());

    let record = h.store.record(&entry.path).unwrap();
    assert!(record.description("en").unwrap().is_complete());
    assert!(record.primary_comment.is_none());
}

#[test]
fn test_original_comment_is_captured_once() {
    let path = PathBuf::from("/Applications/Notes.app");
    let comments = MemoryCommentSink::with_comments([(path.clone(), "Groceries and lists")]);
    let h = harness(ScriptedGenerator::new(), comments, "en");
    let mut entry = notes();
    entry.primary_comment = Some("Groceries and lists".into());

    h.orchestrator.enrich(&mut entry);

    let record = h.store.record(&path).unwrap();
    assert_eq!(record.original_comment.as_deref(), Some("Groceries and lists"));
    assert_eq!(
        record.primary_comment.as_deref(),
        Some("Notes short (en) | Notes expanded (en)")
    );
    assert_eq!(h.store.stored_comment(&path), record.primary_comment);
}

#[test]
fn test_search_index_receives_document() {
    let h = harness(ScriptedGenerator::new(), MemoryCommentSink::new(), "en");
    let mut entry = notes();
    h.orchestrator.enrich(&mut entry);

    let document = h.index.get("com.example.notes").unwrap();
    assert_eq!(document.domain, APPS_DOMAIN);
    assert_eq!(document.display_name, "Notes");
    assert!(document.description.contains("Notes short (en)"));
    assert!(document.keywords.iter().any(|k| k == "Notes"));
}

#[test]
fn test_generator_failure_for_one_app_is_contained() {
    let generator = ScriptedGenerator {
        failing_names: ["Broken".to_string()].into_iter().collect(),
        ..ScriptedGenerator::new()
    };
    let h = harness(generator, MemoryCommentSink::new(), "en");
    let mut broken = Entry::new(PathBuf::from("/Applications/Broken.app"), "Broken", Source::Applications);

    let outcome = h.orchestrator.enrich(&mut broken);
    assert_eq!(outcome.status(), ItemStatus::Failed);
    assert_eq!(outcome.fetched, 0);
    assert_eq!(outcome.comment, CommentOutcome::NoText);
    // The record exists even though nothing was generated.
    assert!(h.store.record(&broken.path).is_some());

    let mut ok = notes();
    assert_eq!(h.orchestrator.enrich(&mut ok).status(), ItemStatus::Updated);
}

#[test]
fn test_unavailable_generator_touches_nothing() {
    let generator = ScriptedGenerator {
        unavailable: true,
        ..ScriptedGenerator::new()
    };
    let h = harness(generator, MemoryCommentSink::new(), "en");
    let mut entry = notes();

    let outcome = h.orchestrator.enrich(&mut entry);
    assert!(outcome.unavailable);
    assert_eq!(outcome.status(), ItemStatus::Skipped);
    assert_eq!(h.generator.call_count(), 0);
    assert!(h.store.load().is_empty());
    assert!(h.index.is_empty());
}

#[test]
fn test_file_search_index_round_trip() {
    let dir = tempdir().unwrap();
    let index = FileSearchIndex::open(dir.path().join("index/search-index.json"));

    let mut entry = notes();
    entry.categories = vec![Category::Productivity];
    let document = IndexDocument::from_entry(&entry, "en");
    index.upsert(&document).unwrap();

    let mut other = IndexDocument::from_entry(
        &Entry::new(PathBuf::from("/Applications/Maps.app"), "Maps", Source::Applications),
        "en",
    );
    index.upsert(&other).unwrap();
    other.domain = "other.domain".into();
    other.id = "foreign".into();
    index.upsert(&other).unwrap();

    let reopened = FileSearchIndex::open(index.path());
    let docs = reopened.documents();
    assert_eq!(docs.len(), 3);
    assert!(docs["com.example.notes"]
        .keywords
        .iter()
        .any(|k| k == Category::Productivity.label()));

    reopened.delete("com.example.notes").unwrap();
    assert_eq!(reopened.documents().len(), 2);

    reopened.delete_all(APPS_DOMAIN).unwrap();
    let left = reopened.documents();
    assert_eq!(left.len(), 1);
    assert!(left.contains_key("foreign"));
}
