//! Testing utilities for the docdex workspace
//!
//! Deterministic in-memory collaborators with invocation counters, plus
//! optional gates (zero-permit semaphores) so tests can hold a fetch or an
//! extraction open while they assert on in-flight state.

#![allow(missing_docs)]

use async_trait::async_trait;
use docdex_source::{
    DocStore, InventorySource, MarkdownExtractor, PackageRegistry, PackageSpec, PageSource,
    SourceError,
};
use docdex_symbol::{Inventory, SymbolLocation};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Build a [`SymbolLocation`] without threading `Arc<str>` handles by hand.
pub fn location(
    package: &str,
    kind: &str,
    base_url: &str,
    relative_path: &str,
    anchor: &str,
) -> SymbolLocation {
    SymbolLocation::new(
        package.into(),
        kind.into(),
        base_url.into(),
        relative_path.into(),
        anchor,
    )
}

/// In-memory [`InventorySource`] with per-URL failure injection.
#[derive(Default)]
pub struct FakeInventories {
    inventories: Mutex<HashMap<String, Inventory>>,
    remaining_failures: Mutex<HashMap<String, usize>>,
    attempts: Mutex<HashMap<String, usize>>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeInventories {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_inventory(self, url: &str, inventory: Inventory) -> Self {
        self.inventories.lock().insert(url.to_owned(), inventory);
        self
    }

    /// Make the next `count` fetches of `url` fail before succeeding.
    pub fn fail_times(&self, url: &str, count: usize) {
        self.remaining_failures.lock().insert(url.to_owned(), count);
    }

    /// Hold fetches until [`release`](Self::release) hands out permits.
    #[must_use]
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub fn release(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    /// How many times `url` has been fetched (attempts, not successes).
    pub fn fetch_attempts(&self, url: &str) -> usize {
        self.attempts.lock().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl InventorySource for FakeInventories {
    async fn fetch_inventory(&self, url: &str) -> Result<Inventory, SourceError> {
        *self.attempts.lock().entry(url.to_owned()).or_insert(0) += 1;
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("inventory gate closed").forget();
        }
        {
            let mut failures = self.remaining_failures.lock();
            if let Some(remaining) = failures.get_mut(url) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(SourceError::InventoryFetch {
                        url: url.to_owned(),
                        reason: "injected failure".to_owned(),
                    });
                }
            }
        }
        self.inventories.lock().get(url).cloned().ok_or_else(|| {
            SourceError::InventoryFetch {
                url: url.to_owned(),
                reason: "no such inventory".to_owned(),
            }
        })
    }
}

/// In-memory [`PageSource`] counting fetch attempts per URL.
#[derive(Default)]
pub struct FakePages {
    pages: Mutex<HashMap<String, String>>,
    attempts: Mutex<HashMap<String, usize>>,
    gate: Option<Arc<Semaphore>>,
}

impl FakePages {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page(self, url: &str, content: &str) -> Self {
        self.add_page(url, content);
        self
    }

    /// Register (or replace) a page after construction.
    pub fn add_page(&self, url: &str, content: &str) {
        self.pages.lock().insert(url.to_owned(), content.to_owned());
    }

    /// Hold fetches until [`release`](Self::release) hands out permits.
    #[must_use]
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub fn release(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    /// How many times `url` has been fetched (attempts, not successes).
    pub fn fetch_attempts(&self, url: &str) -> usize {
        self.attempts.lock().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl PageSource for FakePages {
    async fn fetch_page(&self, url: &str) -> Result<String, SourceError> {
        *self.attempts.lock().entry(url.to_owned()).or_insert(0) += 1;
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("page gate closed").forget();
        }
        self.pages.lock().get(url).cloned().ok_or_else(|| SourceError::PageFetch {
            url: url.to_owned(),
            reason: "no such page".to_owned(),
        })
    }
}

/// [`MarkdownExtractor`] producing deterministic markdown and counting
/// invocations per symbol.
#[derive(Default)]
pub struct CountingExtractor {
    calls: Mutex<HashMap<SymbolLocation, usize>>,
    failing: Mutex<HashSet<SymbolLocation>>,
    gate: Option<Arc<Semaphore>>,
}

impl CountingExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make extraction fail for `location`.
    pub fn fail_for(&self, location: &SymbolLocation) {
        self.failing.lock().insert(location.clone());
    }

    /// Hold extractions until [`release`](Self::release) hands out permits.
    #[must_use]
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub fn release(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    pub fn calls(&self, location: &SymbolLocation) -> usize {
        self.calls.lock().get(location).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }
}

#[async_trait]
impl MarkdownExtractor for CountingExtractor {
    async fn extract(&self, _page: &str, location: &SymbolLocation) -> Result<String, SourceError> {
        *self.calls.lock().entry(location.clone()).or_insert(0) += 1;
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("extractor gate closed").forget();
        }
        if self.failing.lock().contains(location) {
            return Err(SourceError::Extraction {
                symbol: location.anchored_url(),
                reason: "injected failure".to_owned(),
            });
        }
        Ok(format!("docs for `{}`", location.anchored_url()))
    }
}

/// In-memory [`PackageRegistry`].
#[derive(Default)]
pub struct MemoryRegistry {
    specs: Mutex<Vec<PackageSpec>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_package(self, spec: PackageSpec) -> Self {
        self.specs.lock().push(spec);
        self
    }
}

#[async_trait]
impl PackageRegistry for MemoryRegistry {
    async fn list_packages(&self) -> Result<Vec<PackageSpec>, SourceError> {
        Ok(self.specs.lock().clone())
    }

    async fn add_package(&self, spec: PackageSpec) -> Result<(), SourceError> {
        let mut specs = self.specs.lock();
        specs.retain(|existing| existing.name != spec.name);
        specs.push(spec);
        Ok(())
    }

    async fn remove_package(&self, name: &str) -> Result<(), SourceError> {
        self.specs.lock().retain(|existing| existing.name != name);
        Ok(())
    }
}

/// [`DocStore`] wrapper counting reads and writes, delegating to any inner
/// store (usually [`docdex_source::MemoryDocStore`]).
pub struct CountingStore<S> {
    inner: S,
    reads: Mutex<usize>,
    writes: Mutex<usize>,
}

impl<S> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            reads: Mutex::new(0),
            writes: Mutex::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        *self.reads.lock()
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock()
    }
}

#[async_trait]
impl<S: DocStore> DocStore for CountingStore<S> {
    async fn get(&self, location: &SymbolLocation) -> Result<Option<String>, SourceError> {
        *self.reads.lock() += 1;
        self.inner.get(location).await
    }

    async fn set(&self, location: &SymbolLocation, markdown: &str) -> Result<(), SourceError> {
        *self.writes.lock() += 1;
        self.inner.set(location, markdown).await
    }

    async fn delete_package(&self, package: &str) -> Result<bool, SourceError> {
        self.inner.delete_package(package).await
    }
}
