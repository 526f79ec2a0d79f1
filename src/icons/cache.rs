//! Bounded, shared icon cache with in-flight load deduplication.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use lru::LruCache;
use rayon::prelude::*;
use serde::Serialize;

use super::renderer::{Icon, IconRenderer};

/// Edge length of the generated placeholder.
pub const PLACEHOLDER_EDGE: u32 = 32;

/// Capacity and parallelism bounds for [`IconCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconCacheLimits {
    /// Maximum number of cached icons.
    pub max_items: usize,
    /// Maximum summed [`Icon::byte_cost`] of cached icons.
    pub max_bytes: usize,
    /// Worker count used by [`IconCache::preload_all`].
    pub max_concurrent_loads: usize,
}

impl Default for IconCacheLimits {
    fn default() -> Self {
        Self {
            max_items: 200,
            max_bytes: 100 * 1024 * 1024,
            max_concurrent_loads: 20,
        }
    }
}

/// Point-in-time view of the cache, for logging and `stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IconCacheStats {
    pub items: usize,
    pub bytes: usize,
    pub in_flight: usize,
    /// Calls made to the renderer since construction.
    pub renders: usize,
}

struct CacheState {
    entries: LruCache<PathBuf, Arc<Icon>>,
    total_bytes: usize,
    in_flight: HashSet<PathBuf>,
    /// Bumped by `clear()` so loads started before it do not repopulate.
    generation: u64,
}

/// Icon cache keyed by bundle path.
///
/// Holds at most `max_items` icons and `max_bytes` of pixel data, evicting
/// least recently used entries past either bound. At most one render per path
/// runs at a time: a second [`load_icon`](Self::load_icon) for an in-flight
/// path blocks until the first finishes and shares its result.
///
/// Construct one and share it (`Arc<IconCache>`); there is no global instance.
pub struct IconCache {
    renderer: Arc<dyn IconRenderer>,
    limits: IconCacheLimits,
    placeholder: Arc<Icon>,
    state: Mutex<CacheState>,
    loaded: Condvar,
    renders: AtomicUsize,
}

impl IconCache {
    #[must_use]
    pub fn new(renderer: Arc<dyn IconRenderer>, limits: IconCacheLimits) -> Self {
        Self {
            renderer,
            limits,
            placeholder: Arc::new(Icon::placeholder(PLACEHOLDER_EDGE)),
            state: Mutex::new(CacheState {
                entries: LruCache::unbounded(),
                total_bytes: 0,
                in_flight: HashSet::new(),
                generation: 0,
            }),
            loaded: Condvar::new(),
            renders: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn limits(&self) -> IconCacheLimits {
        self.limits
    }

    #[must_use]
    pub fn placeholder(&self) -> Arc<Icon> {
        Arc::clone(&self.placeholder)
    }

    /// Cached icon, or the placeholder. Never renders.
    #[must_use]
    pub fn icon(&self, path: &Path) -> Arc<Icon> {
        self.lock()
            .entries
            .get(path)
            .map_or_else(|| self.placeholder(), Arc::clone)
    }

    #[must_use]
    pub fn has_cached_icon(&self, path: &Path) -> bool {
        self.lock().entries.contains(path)
    }

    /// Cached icon, rendering it first if needed.
    ///
    /// If another thread is already rendering `path`, waits for that render
    /// instead of starting a second one. A failed render yields the
    /// placeholder, which is cached for the path until the next
    /// [`clear`](Self::clear).
    pub fn load_icon(&self, path: &Path) -> Arc<Icon> {
        let mut state = self.lock();
        loop {
            if let Some(icon) = state.entries.get(path) {
                return Arc::clone(icon);
            }
            if !state.in_flight.contains(path) {
                break;
            }
            state = self
                .loaded
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        state.in_flight.insert(path.to_path_buf());
        let guard = InFlight {
            cache: self,
            path,
            generation: state.generation,
        };
        drop(state);

        self.renders.fetch_add(1, Ordering::Relaxed);
        let icon = match self.renderer.render(path) {
            Ok(icon) => Arc::new(icon),
            Err(e) => {
                log::debug!("Using placeholder for {}: {}", path.display(), e);
                self.placeholder()
            }
        };

        let mut state = self.lock();
        if state.generation == guard.generation {
            self.insert(&mut state, path.to_path_buf(), Arc::clone(&icon));
        }
        drop(state);
        drop(guard);
        icon
    }

    /// Load every uncached path on a pool of `max_concurrent_loads` workers.
    ///
    /// Returns how many icons were loaded.
    pub fn preload_all(&self, paths: &[PathBuf]) -> usize {
        let pending: Vec<&PathBuf> = paths.iter().filter(|p| !self.has_cached_icon(p)).collect();
        if pending.is_empty() {
            return 0;
        }

        let workers = self.limits.max_concurrent_loads.max(1);
        log::debug!("Preloading {} icons on {} workers", pending.len(), workers);

        match rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("icon-preload-{i}"))
            .build()
        {
            Ok(pool) => pool.install(|| {
                pending
                    .par_iter()
                    .map(|path| self.load_icon(path))
                    .count()
            }),
            Err(e) => {
                log::warn!("Failed to build icon pool, loading sequentially: {}", e);
                pending.iter().map(|path| self.load_icon(path)).count()
            }
        }
    }

    /// Run [`preload_all`](Self::preload_all) on a detached background thread.
    pub fn spawn_preload(self: &Arc<Self>, paths: Vec<PathBuf>) -> JoinHandle<usize> {
        let cache = Arc::clone(self);
        std::thread::spawn(move || cache.preload_all(&paths))
    }

    /// Drop every cached icon and in-flight marker.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.total_bytes = 0;
        state.in_flight.clear();
        state.generation = state.generation.wrapping_add(1);
        drop(state);
        self.loaded.notify_all();
    }

    #[must_use]
    pub fn stats(&self) -> IconCacheStats {
        let state = self.lock();
        IconCacheStats {
            items: state.entries.len(),
            bytes: state.total_bytes,
            in_flight: state.in_flight.len(),
            renders: self.renders.load(Ordering::Relaxed),
        }
    }

    fn insert(&self, state: &mut CacheState, path: PathBuf, icon: Arc<Icon>) {
        let cost = icon.byte_cost();
        if let Some(previous) = state.entries.put(path, icon) {
            state.total_bytes -= previous.byte_cost();
        }
        state.total_bytes += cost;

        while state.entries.len() > self.limits.max_items
            || state.total_bytes > self.limits.max_bytes
        {
            match state.entries.pop_lru() {
                Some((evicted, icon)) => {
                    state.total_bytes -= icon.byte_cost();
                    log::trace!("Evicted icon for {}", evicted.display());
                }
                None => break,
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for IconCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconCache")
            .field("limits", &self.limits)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// Clears the in-flight marker and wakes waiters, even if the renderer panics.
struct InFlight<'a> {
    cache: &'a IconCache,
    path: &'a Path,
    generation: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.cache.lock();
        if state.generation == self.generation {
            state.in_flight.remove(self.path);
        }
        drop(state);
        self.cache.loaded.notify_all();
    }
}
