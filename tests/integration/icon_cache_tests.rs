use super::support::CountingRenderer;
use appsync::icons::{IconCache, IconCacheLimits, PLACEHOLDER_EDGE};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn limits(max_items: usize, max_bytes: usize, max_concurrent_loads: usize) -> IconCacheLimits {
    IconCacheLimits {
        max_items,
        max_bytes,
        max_concurrent_loads,
    }
}

fn paths(n: usize) -> Vec<PathBuf> {
    (0..n)
        .map(|i| PathBuf::from(format!("/Applications/App{i}.app")))
        .collect()
}

#[test]
fn test_concurrent_loads_of_one_path_render_once() {
    let renderer = Arc::new(CountingRenderer::new(16, Duration::from_millis(50)));
    let cache = Arc::new(IconCache::new(renderer.clone(), IconCacheLimits::default()));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache.load_icon(Path::new("/Applications/Same.app"))
            })
        })
        .collect();
    let icons: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(renderer.render_count(), 1);
    assert!(icons.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(cache.stats().in_flight, 0);
}

#[test]
fn test_icon_never_renders() {
    let renderer = Arc::new(CountingRenderer::new(16, Duration::ZERO));
    let cache = IconCache::new(renderer.clone(), IconCacheLimits::default());
    let path = Path::new("/Applications/Lazy.app");

    let icon = cache.icon(path);
    assert_eq!(icon.width(), PLACEHOLDER_EDGE);
    assert!(Arc::ptr_eq(&icon, &cache.placeholder()));
    assert_eq!(renderer.render_count(), 0);
    assert!(!cache.has_cached_icon(path));

    cache.load_icon(path);
    assert_eq!(cache.icon(path).width(), 16);
}

#[test]
fn test_item_limit_evicts_least_recently_used() {
    let renderer = Arc::new(CountingRenderer::new(4, Duration::ZERO));
    let cache = IconCache::new(renderer.clone(), limits(3, usize::MAX, 2));
    let all = paths(4);

    cache.load_icon(&all[0]);
    cache.load_icon(&all[1]);
    cache.load_icon(&all[2]);
    // Touch the oldest so the second becomes least recently used.
    cache.load_icon(&all[0]);
    cache.load_icon(&all[3]);

    assert_eq!(cache.stats().items, 3);
    assert!(cache.has_cached_icon(&all[0]));
    assert!(!cache.has_cached_icon(&all[1]));
    assert!(cache.has_cached_icon(&all[3]));
}

#[test]
fn test_byte_limit_is_respected() {
    // Each 8x8 RGBA icon costs 256 bytes.
    let renderer = Arc::new(CountingRenderer::new(8, Duration::ZERO));
    let cache = IconCache::new(renderer.clone(), limits(100, 600, 2));

    for path in paths(5) {
        cache.load_icon(&path);
        assert!(cache.stats().bytes <= 600);
    }
    let stats = cache.stats();
    assert_eq!(stats.items, 2);
    assert_eq!(stats.bytes, 512);
}

#[test]
fn test_failed_render_is_not_retried() {
    let renderer = Arc::new(CountingRenderer::failing());
    let cache = IconCache::new(renderer.clone(), IconCacheLimits::default());
    let path = Path::new("/Applications/Broken.app");

    let first = cache.load_icon(path);
    let second = cache.load_icon(path);
    assert_eq!(first.width(), PLACEHOLDER_EDGE);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(renderer.render_count(), 1);
}

#[test]
fn test_preload_respects_concurrency_cap() {
    let renderer = Arc::new(CountingRenderer::new(4, Duration::from_millis(20)));
    let cache = IconCache::new(renderer.clone(), limits(100, usize::MAX, 2));
    let all = paths(10);

    assert_eq!(cache.preload_all(&all), 10);
    assert!(renderer.peak_concurrency() <= 2);
    assert_eq!(renderer.render_count(), 10);

    // Already cached: nothing left to do.
    assert_eq!(cache.preload_all(&all), 0);
    assert_eq!(renderer.render_count(), 10);
}

#[test]
fn test_spawn_preload_runs_in_background() {
    let renderer = Arc::new(CountingRenderer::new(4, Duration::from_millis(5)));
    let cache = Arc::new(IconCache::new(renderer.clone(), limits(100, usize::MAX, 4)));
    let all = paths(6);

    let handle = cache.spawn_preload(all.clone());
    assert_eq!(handle.join().unwrap(), 6);
    assert!(all.iter().all(|p| cache.has_cached_icon(p)));
}

#[test]
fn test_clear_forces_rerender() {
    let renderer = Arc::new(CountingRenderer::new(4, Duration::ZERO));
    let cache = IconCache::new(renderer.clone(), IconCacheLimits::default());
    let path = Path::new("/Applications/Again.app");

    cache.load_icon(path);
    cache.clear();
    let stats = cache.stats();
    assert_eq!(stats.items, 0);
    assert_eq!(stats.bytes, 0);

    cache.load_icon(path);
    assert_eq!(renderer.render_count(), 2);
}
