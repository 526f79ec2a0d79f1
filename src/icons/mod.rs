//! Icon resolution and caching.
//!
//! # Architecture
//!
//! * [`renderer`]: the [`Icon`] image type, the [`IconRenderer`] capability
//!   and the bundle-reading [`BundleIconRenderer`].
//! * [`cache`]: the shared [`IconCache`] with LRU eviction by count and
//!   bytes, in-flight deduplication and pooled preloading.

pub mod cache;
pub mod renderer;

pub use cache::{IconCache, IconCacheLimits, IconCacheStats, PLACEHOLDER_EDGE};
pub use renderer::{BundleIconRenderer, Icon, IconError, IconRenderer, ICON_EDGE};
