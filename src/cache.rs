//! Process-wide memoization of version calculations

use crate::engine::VersionResult;
use crate::error::Result;
use dashmap::DashMap;
use git2::Oid;
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Everything a calculation result depends on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub commit: Oid,
    pub branch: String,
    /// Fingerprint of the effective configuration
    pub fingerprint: String,
}

/// Memoizes calculation results per key
///
/// Concurrent requests for one key compute at most once: the first caller
/// initialises the slot while later callers wait for it. Failed computations
/// are not stored.
#[derive(Debug, Default)]
pub struct ComputationCache {
    entries: DashMap<CacheKey, Arc<OnceCell<Arc<VersionResult>>>>,
    computations: AtomicUsize,
}

impl ComputationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached result for `key` or compute and store it
    pub fn get_or_compute<F>(&self, key: CacheKey, compute: F) -> Result<Arc<VersionResult>>
    where
        F: FnOnce() -> Result<VersionResult>,
    {
        // Clone the slot out so the shard lock is released before computing;
        // computations recurse into the cache for other keys.
        let slot = self.entries.entry(key).or_default().value().clone();
        slot.get_or_try_init(|| {
            self.computations.fetch_add(1, Ordering::Relaxed);
            compute().map(Arc::new)
        })
        .cloned()
    }

    /// Number of computations actually run
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
