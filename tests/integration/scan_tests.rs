use super::support::{make_bundle, CountingRenderer};
use appsync::entry::Source;
use appsync::icons::{IconCache, IconCacheLimits};
use appsync::scanner::{PlistManifestReader, ScanLocation, Scanner};
use appsync::sinks::MemoryCommentSink;
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn scanner(locations: Vec<ScanLocation>, comments: MemoryCommentSink) -> Scanner {
    Scanner::new(
        locations,
        Arc::new(PlistManifestReader::new()),
        Arc::new(comments),
    )
}

#[test]
fn test_scan_empty_and_missing_roots() {
    let dir = tempdir().unwrap();
    let empty = dir.path().join("Applications");
    fs::create_dir_all(&empty).unwrap();

    let scanner = scanner(
        vec![
            ScanLocation::new(&empty, Source::Applications),
            ScanLocation::new(dir.path().join("does-not-exist"), Source::UserApplications),
        ],
        MemoryCommentSink::new(),
    );
    assert!(scanner.scan_fast().is_empty());
}

#[test]
fn test_scan_reads_manifest_and_comment() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("Applications");
    let notes = make_bundle(&root, "Notes.app", Some("com.example.notes"), false);
    make_bundle(&root, "Menu Helper.app", Some("com.example.helper"), true);
    make_bundle(&root, "Bare.app", None, false);
    fs::create_dir_all(root.join("Documents")).unwrap();
    fs::write(root.join("readme.txt"), "not a bundle").unwrap();

    let comments = MemoryCommentSink::with_comments([(&notes, "Shopping lists")]);
    let entries = scanner(vec![ScanLocation::new(&root, Source::Applications)], comments)
        .scan_fast();

    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["Bare", "Menu Helper", "Notes"]);

    let helper = &entries[1];
    assert!(helper.is_background_only);
    assert_eq!(helper.bundle_identifier.as_deref(), Some("com.example.helper"));

    let notes = &entries[2];
    assert_eq!(notes.primary_comment.as_deref(), Some("Shopping lists"));
    assert_eq!(notes.source, Source::Applications);
    assert!(entries[0].bundle_identifier.is_none());
}

#[test]
fn test_nested_bundles_are_not_listed() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("Applications");
    let outer = make_bundle(&root, "Suite.app", Some("com.example.suite"), false);
    make_bundle(&outer, "Contents/Helpers/Inner.app", Some("com.example.inner"), true);

    let entries =
        scanner(vec![ScanLocation::new(&root, Source::Applications)], MemoryCommentSink::new())
            .scan_fast();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Suite");
}

#[test]
fn test_cross_location_dedup_prefers_higher_priority() {
    let dir = tempdir().unwrap();
    let system = dir.path().join("Applications");
    let user = dir.path().join("UserApplications");
    let cask = dir.path().join("Caskroom");

    make_bundle(&user, "Editor.app", Some("com.example.editor"), false);
    make_bundle(&system, "Editor.app", Some("com.example.editor"), false);
    make_bundle(&cask, "editor/1.2.0/Editor.app", Some("com.example.editor"), false);
    make_bundle(&cask, "viewer/3.0/Viewer.app", Some("com.example.viewer"), false);

    let locations = vec![
        ScanLocation::new(&cask, Source::Homebrew),
        ScanLocation::new(&user, Source::UserApplications),
        ScanLocation::new(&system, Source::Applications),
    ];
    let entries = scanner(locations.clone(), MemoryCommentSink::new()).scan_fast();

    assert_eq!(entries.len(), 2);
    let editor = entries.iter().find(|e| e.name == "Editor").unwrap();
    assert_eq!(editor.source, Source::Applications);
    assert!(editor.path.starts_with(&system));

    let viewer = entries.iter().find(|e| e.name == "Viewer").unwrap();
    assert_eq!(viewer.source, Source::Homebrew);

    // Root order does not change the outcome.
    let mut reversed = locations;
    reversed.reverse();
    let again = scanner(reversed, MemoryCommentSink::new()).scan_fast();
    let paths: Vec<_> = entries.iter().map(|e| e.path.clone()).collect();
    let again_paths: Vec<_> = again.iter().map(|e| e.path.clone()).collect();
    assert_eq!(paths, again_paths);
}

#[test]
fn test_bundles_without_identifier_dedup_by_path() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    make_bundle(&a, "Tool.app", None, false);
    make_bundle(&b, "Tool.app", None, false);

    let entries = scanner(
        vec![
            ScanLocation::new(&a, Source::Applications),
            ScanLocation::new(&b, Source::UserApplications),
        ],
        MemoryCommentSink::new(),
    )
    .scan_fast();
    assert_eq!(entries.len(), 2);
}

#[test]
fn test_shutdown_flag_stops_walk() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("Applications");
    make_bundle(&root, "A.app", None, false);

    let flag = Arc::new(AtomicBool::new(true));
    let entries = scanner(vec![ScanLocation::new(&root, Source::Applications)], MemoryCommentSink::new())
        .with_shutdown_flag(flag)
        .scan_fast();
    assert!(entries.is_empty());
}

#[test]
fn test_full_scan_attaches_icons() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("Applications");
    for name in ["A.app", "B.app", "C.app"] {
        make_bundle(&root, name, None, false);
    }

    let renderer = Arc::new(CountingRenderer::new(16, Duration::ZERO));
    let cache = Arc::new(IconCache::new(renderer.clone(), IconCacheLimits::default()));
    let scanner = scanner(vec![ScanLocation::new(&root, Source::Applications)], MemoryCommentSink::new())
        .with_icon_cache(Arc::clone(&cache));

    let entries = scanner.scan();
    assert_eq!(entries.len(), 3);
    for entry in &entries {
        let icon = entry.icon.as_ref().unwrap();
        assert_eq!(icon.width(), 16);
        assert!(cache.has_cached_icon(&entry.path));
    }
    assert_eq!(renderer.render_count(), 3);

    // A second scan is served from the cache.
    let _ = scanner.scan();
    assert_eq!(renderer.render_count(), 3);

    // Fast scans never touch icons.
    assert!(scanner.scan_fast().iter().all(|e| e.icon.is_none()));
    assert!(!cache.has_cached_icon(Path::new("/elsewhere/X.app")));
}
