//! Named mutual-exclusion scopes

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Scope serializing inventory refreshes and the package-mutating operations
/// that trigger them.
pub const REFRESH_SCOPE: &str = "inventory refresh";

/// Registry of named mutual-exclusion scopes with fail-fast acquisition.
///
/// A second attempt while a scope is held fails immediately instead of
/// queueing silently, so reentrant refreshes surface as errors rather than
/// pile-ups.
#[derive(Debug, Default)]
pub struct ScopedLocks {
    scopes: DashMap<&'static str, Arc<Mutex<()>>>,
}

impl ScopedLocks {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire `scope` without waiting; `None` when it is already held.
    /// The scope is released when the returned guard drops.
    #[must_use]
    pub fn try_acquire(&self, scope: &'static str) -> Option<OwnedMutexGuard<()>> {
        let mutex = self.scopes.entry(scope).or_default().clone();
        mutex.try_lock_owned().ok()
    }
}
