//! 特性探测：只检查、不调用宿主 API 表面。
//!
//! Feature probe: does a nested host surface exist?
//!
//! Probing walks the host namespace one segment at a time and never invokes
//! anything. Every kind of absence (missing global, missing key, non-table
//! intermediate, non-callable leaf) is reported as `false`.
//!
//! Positive results may be cached in a bounded LRU. Negative results are never
//! cached, so a surface the host materialises later is picked up by the next
//! check. [`FeatureProbe::reprobe`] bypasses the cache entirely.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

pub use crate::host::SurfacePath;
use crate::host::{Host, Surface, SurfaceKind};

/// Default number of positive probe results kept.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

pub struct FeatureProbe {
    host: Arc<dyn Host>,
    cache: Option<Mutex<LruCache<SurfacePath, SurfaceKind>>>,
}

impl FeatureProbe {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self::with_cache_capacity(host, DEFAULT_CACHE_CAPACITY)
    }

    /// A capacity of zero disables caching.
    pub fn with_cache_capacity(host: Arc<dyn Host>, capacity: usize) -> Self {
        let cache = NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap)));
        Self { host, cache }
    }

    pub fn uncached(host: Arc<dyn Host>) -> Self {
        Self::with_cache_capacity(host, 0)
    }

    /// Whether every intermediate segment exists and the last one is callable.
    pub fn has(&self, path: impl Into<SurfacePath>) -> bool {
        let path = path.into();
        if self.cached(&path) == Some(SurfaceKind::Function) {
            return true;
        }
        self.probe(&path) == Some(SurfaceKind::Function)
    }

    /// Whether the surface exists at all, callable or not.
    pub fn exists(&self, path: impl Into<SurfacePath>) -> bool {
        let path = path.into();
        if self.cached(&path).is_some() {
            return true;
        }
        self.probe(&path).is_some()
    }

    /// Like [`has`](Self::has), but ignores and refreshes the cache.
    pub fn reprobe(&self, path: impl Into<SurfacePath>) -> bool {
        let path = path.into();
        self.forget(&path);
        self.probe(&path) == Some(SurfaceKind::Function)
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            if let Ok(mut cache) = cache.lock() {
                cache.clear();
            }
        }
    }

    pub fn cached_entries(&self) -> usize {
        self.cache
            .as_ref()
            .and_then(|c| c.lock().ok().map(|c| c.len()))
            .unwrap_or(0)
    }

    /// Walk the namespace without invoking anything.
    fn walk(&self, path: &SurfacePath) -> Option<Surface> {
        if !path.is_well_formed() {
            return None;
        }
        let (first, rest) = path.segments().split_first()?;
        let mut current = self.host.global(first)?;
        for segment in rest {
            let next = current.child(segment)?.clone();
            current = next;
        }
        Some(current)
    }

    fn probe(&self, path: &SurfacePath) -> Option<SurfaceKind> {
        let kind = self.walk(path).map(|s| s.kind());
        match kind {
            Some(kind) => {
                self.remember(path, kind);
                tracing::trace!(%path, ?kind, "surface present");
            }
            None => tracing::trace!(%path, "surface absent"),
        }
        kind
    }

    fn cached(&self, path: &SurfacePath) -> Option<SurfaceKind> {
        let cache = self.cache.as_ref()?;
        let mut cache = cache.lock().ok()?;
        cache.get(path).copied()
    }

    fn remember(&self, path: &SurfacePath, kind: SurfaceKind) {
        if let Some(cache) = &self.cache {
            if let Ok(mut cache) = cache.lock() {
                cache.put(path.clone(), kind);
            }
        }
    }

    fn forget(&self, path: &SurfacePath) {
        if let Some(cache) = &self.cache {
            if let Ok(mut cache) = cache.lock() {
                cache.pop(path);
            }
        }
    }
}

impl std::fmt::Debug for FeatureProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureProbe")
            .field("cached_entries", &self.cached_entries())
            .finish()
    }
}
