use appsync::entry::{Category, Entry, LocalizedDescription, Source};
use appsync::store::RecordStore;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

fn entry(name: &str) -> Entry {
    Entry::new(
        PathBuf::from(format!("/Applications/{name}.app")),
        name,
        Source::Applications,
    )
}

#[test]
fn test_save_and_reload_keeps_accumulated_fields() {
    let dir = tempdir().unwrap();
    let store = RecordStore::open(dir.path().join("records.json"));

    let mut e = entry("Editor");
    e.bundle_identifier = Some("com.example.editor".into());
    e.primary_comment = Some("My notes".into());
    e.categories = vec![Category::Development];
    e.function_tags = vec!["edit text".into()];
    e.upsert_description(LocalizedDescription::new(
        "en",
        Some("Text editor".into()),
        Some("Edit, search and refactor code".into()),
    ));
    store.save(std::slice::from_ref(&e)).unwrap();

    // A rescan produces a bare entry; stored data must survive it.
    let mut rescanned = entry("Editor");
    rescanned.primary_comment = Some("Text editor | Edit, search and refactor code".into());
    store.save(std::slice::from_ref(&rescanned)).unwrap();

    let record = store.record(&e.path).unwrap();
    assert_eq!(record.original_comment.as_deref(), Some("My notes"));
    assert_eq!(
        record.primary_comment.as_deref(),
        Some("Text editor | Edit, search and refactor code")
    );
    assert_eq!(record.categories, vec![Category::Development]);
    assert_eq!(record.function_tags, vec!["edit text".to_string()]);
    assert_eq!(record.descriptions.len(), 1);
    assert!(store.missing_languages(&e.path, &["en".into()]).is_empty());
}

#[test]
fn test_rescans_never_delete_records() {
    let dir = tempdir().unwrap();
    let store = RecordStore::open(dir.path().join("records.json"));

    store.save(&[entry("A"), entry("B")]).unwrap();
    store.save(&[entry("A")]).unwrap();
    assert_eq!(store.load().len(), 2);

    let removed = store.prune(&[PathBuf::from("/Applications/A.app")]).unwrap();
    assert_eq!(removed, 1);
    let remaining = store.load();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "A");
}

#[test]
fn test_update_description_keeps_one_per_language() {
    let dir = tempdir().unwrap();
    let store = RecordStore::open(dir.path().join("records.json"));
    let e = entry("Maps");
    store.save(std::slice::from_ref(&e)).unwrap();

    assert!(store
        .update_description(&e.path, "fi", Some("Kartat"), None)
        .unwrap());
    assert!(store
        .update_description(&e.path, "fi", Some("Kartat"), Some("Reitit ja kartat"))
        .unwrap());
    assert!(store
        .update_description(&e.path, "en", Some("Maps"), Some("Routes and maps"))
        .unwrap());

    let record = store.record(&e.path).unwrap();
    assert_eq!(record.descriptions.len(), 2);
    let fi = record.description("fi").unwrap();
    assert_eq!(fi.expanded_text.as_deref(), Some("Reitit ja kartat"));
    assert!(store
        .all_descriptions_text(&e.path)
        .contains("Routes and maps"));
}

#[test]
fn test_updates_on_unknown_paths_report_false() {
    let dir = tempdir().unwrap();
    let store = RecordStore::open(dir.path().join("records.json"));
    let ghost = Path::new("/Applications/Ghost.app");

    assert!(!store.update_comment(ghost, "x").unwrap());
    assert!(!store
        .update_categories(ghost, &[Category::Games])
        .unwrap());
    assert!(!store.add_functions(ghost, &["play games".into()]).unwrap());
    assert!(store.load().is_empty());
}

#[test]
fn test_add_functions_merges_case_insensitively() {
    let dir = tempdir().unwrap();
    let store = RecordStore::open(dir.path().join("records.json"));
    let e = entry("Paint");
    store.save(std::slice::from_ref(&e)).unwrap();

    store
        .add_functions(&e.path, &["Draw shapes".into(), "fill areas".into()])
        .unwrap();
    store
        .add_functions(&e.path, &["draw shapes".into(), "export images".into()])
        .unwrap();

    let tags = store.record(&e.path).unwrap().function_tags;
    assert_eq!(tags, vec!["Draw shapes", "fill areas", "export images"]);
}

#[test]
fn test_concurrent_updates_are_not_lost() {
    let dir = tempdir().unwrap();
    let store = Arc::new(RecordStore::open(dir.path().join("records.json")));
    let e = entry("Shared");
    store.save(std::slice::from_ref(&e)).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            let path = e.path.clone();
            thread::spawn(move || {
                store
                    .add_functions(&path, &[format!("task number {i}")])
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let tags = store.record(&e.path).unwrap().function_tags;
    assert_eq!(tags.len(), 8);
}

#[test]
fn test_legacy_document_is_read() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("records.json");
    fs::write(
        &path,
        r#"[
          {
            "path": "/Applications/Old.app",
            "name": "Old",
            "finderComment": "Current",
            "originalFinderComment": "Before sync",
            "isMenuBarApp": true,
            "functions": ["sync files"],
            "categories": ["Utilities", "Not A Category"],
            "source": "Somewhere Else",
            "descriptions": [
              { "language": "fi", "shortDescription": "Vanha", "expandedDescription": null }
            ]
          }
        ]"#,
    )
    .unwrap();

    let store = RecordStore::open(&path);
    assert!(store.has_cached_data());
    let record = store.record(Path::new("/Applications/Old.app")).unwrap();
    assert_eq!(record.primary_comment.as_deref(), Some("Current"));
    assert_eq!(store.stored_comment(&record.path).as_deref(), Some("Current"));
    assert_eq!(record.original_comment.as_deref(), Some("Before sync"));
    assert!(record.is_background_only);
    assert_eq!(record.function_tags, vec!["sync files".to_string()]);
    assert_eq!(record.categories, vec![Category::Utilities]);
    assert_eq!(record.source, None);
    assert_eq!(
        store.missing_languages(&record.path, &["fi".into(), "en".into()]),
        vec!["en".to_string()]
    );

    // The next write upgrades the document to the versioned envelope.
    store.update_comment(&record.path, "New").unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.trim_start().starts_with('{'));
    assert!(text.contains("\"version\": 2"));
}

#[test]
fn test_clear_then_reuse() {
    let dir = tempdir().unwrap();
    let store = RecordStore::open(dir.path().join("nested/records.json"));
    store.save(&[entry("A")]).unwrap();
    assert!(store.has_cached_data());

    store.clear().unwrap();
    assert!(!store.has_cached_data());
    assert!(store.load().is_empty());

    store.save(&[entry("B")]).unwrap();
    assert_eq!(store.load().len(), 1);
}
