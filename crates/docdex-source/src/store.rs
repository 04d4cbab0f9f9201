//! Persistent doc store contract and in-memory implementation

use crate::error::SourceError;
use async_trait::async_trait;
use docdex_symbol::SymbolLocation;
use moka::future::Cache;
use std::sync::Arc;
use tracing::debug;

/// Persistent markdown store, consulted before the parse cache and written
/// through after every successful parse.
///
/// Namespaced separately from the in-memory parse state: a full inventory
/// refresh wipes the parse cache but leaves this store intact.
#[async_trait]
pub trait DocStore: Send + Sync {
    /// Stored markdown for a symbol, if any.
    async fn get(&self, location: &SymbolLocation) -> Result<Option<String>, SourceError>;

    /// Store markdown for a symbol.
    async fn set(&self, location: &SymbolLocation, markdown: &str) -> Result<(), SourceError>;

    /// Evict every entry belonging to `package`. Returns whether anything
    /// was evicted.
    async fn delete_package(&self, package: &str) -> Result<bool, SourceError>;
}

/// Moka-backed [`DocStore`] for tests and single-process deployments.
///
/// Entries expire by LRU once `max_capacity` is reached; per-package eviction
/// scans the key space, which is fine at documentation-index sizes.
#[derive(Debug, Clone)]
pub struct MemoryDocStore {
    inner: Cache<SymbolLocation, Arc<str>>,
}

impl MemoryDocStore {
    /// Create a store bounded to `max_capacity` entries.
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    /// Approximate number of stored entries.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl Default for MemoryDocStore {
    /// Store with default capacity (100,000 entries).
    fn default() -> Self {
        Self::new(100_000)
    }
}

#[async_trait]
impl DocStore for MemoryDocStore {
    async fn get(&self, location: &SymbolLocation) -> Result<Option<String>, SourceError> {
        Ok(self.inner.get(location).await.map(|md| md.to_string()))
    }

    async fn set(&self, location: &SymbolLocation, markdown: &str) -> Result<(), SourceError> {
        self.inner.insert(location.clone(), markdown.into()).await;
        Ok(())
    }

    async fn delete_package(&self, package: &str) -> Result<bool, SourceError> {
        // Flush the write buffer so the scan sees every recent insert.
        self.inner.run_pending_tasks().await;
        let mut evicted = false;
        for (key, _) in self.inner.iter() {
            if key.package() == package {
                self.inner.invalidate(key.as_ref()).await;
                evicted = true;
            }
        }
        if evicted {
            debug!(package, "evicted stored docs");
        }
        Ok(evicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc as StdArc;

    fn location(package: &str, path: &str) -> SymbolLocation {
        SymbolLocation::new(
            package.into(),
            "class".into(),
            format!("https://{package}.example/").into(),
            path.into(),
            "anchor",
        )
    }

    #[tokio::test]
    async fn set_and_get_round_trip() {
        let store = MemoryDocStore::new(16);
        let loc = location("aiohttp", "client.html");

        store.set(&loc, "Client session docs.").await.unwrap();
        assert_eq!(
            store.get(&loc).await.unwrap().as_deref(),
            Some("Client session docs.")
        );
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let store = MemoryDocStore::new(16);
        assert!(store.get(&location("aiohttp", "client.html")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_package_evicts_only_that_package() {
        let store = MemoryDocStore::new(16);
        let a = location("aiohttp", "client.html");
        let b = location("yarl", "api.html");
        store.set(&a, "a").await.unwrap();
        store.set(&b, "b").await.unwrap();

        assert!(store.delete_package("aiohttp").await.unwrap());
        assert!(store.get(&a).await.unwrap().is_none());
        assert_eq!(store.get(&b).await.unwrap().as_deref(), Some("b"));

        assert!(!store.delete_package("aiohttp").await.unwrap());
    }

    #[tokio::test]
    async fn store_is_shareable() {
        let store = StdArc::new(MemoryDocStore::default());
        let loc = location("aiohttp", "client.html");
        let writer = StdArc::clone(&store);
        tokio::spawn(async move {
            writer.set(&location("aiohttp", "client.html"), "docs").await.unwrap();
        })
        .await
        .unwrap();
        assert!(store.get(&loc).await.unwrap().is_some());
    }
}
