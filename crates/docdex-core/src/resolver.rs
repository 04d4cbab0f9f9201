//! Refresh coordinator and lookup front door

use crate::config::ResolverConfig;
use crate::error::ResolverError;
use crate::gate::ReadGate;
use crate::lock::{ScopedLocks, REFRESH_SCOPE};
use crate::schedule::RetryScheduler;
use chrono::{DateTime, Utc};
use dashmap::DashSet;
use docdex_cache::PageCache;
use docdex_source::{
    DocStore, InventorySource, MarkdownExtractor, PackageRegistry, PackageSpec, PageSource,
};
use docdex_symbol::{SymbolLocation, SymbolTable};
use futures::future::{join_all, BoxFuture};
use metrics::counter;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// A resolved symbol: markdown plus the names it is also known under.
#[derive(Debug, Clone)]
pub struct SymbolDoc {
    /// Name the symbol was looked up by.
    pub name: String,
    /// Link to the symbol itself (page URL plus anchor).
    pub url: String,
    /// Rendered markdown.
    pub markdown: String,
    /// Alternate names created for this symbol by collision handling.
    pub alternates: Vec<String>,
    /// Where the documentation lives.
    pub location: SymbolLocation,
}

/// Three-valued lookup result: found, or definitively absent.
///
/// Transient trouble (page unreachable, extraction failed, refresh racing)
/// surfaces as [`ResolverError`] instead, so the presentation layer can tell
/// "not found" from "temporarily unavailable".
#[derive(Debug, Clone)]
pub enum DocLookup {
    /// The symbol resolved to documentation.
    Found(SymbolDoc),
    /// The symbol is in no configured inventory.
    NotFound,
}

impl DocLookup {
    /// Whether the lookup found the symbol.
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// The resolved doc, if found.
    #[must_use]
    pub fn doc(&self) -> Option<&SymbolDoc> {
        match self {
            Self::Found(doc) => Some(doc),
            Self::NotFound => None,
        }
    }
}

/// What [`DocResolver::install_package`] did about the new package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Inventory fetched and merged immediately.
    Refreshed,
    /// Inventory unreachable; a retry is scheduled with backoff.
    FetchRescheduled,
}

/// Summary of a full inventory rebuild.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    /// Packages present now but not before the refresh.
    pub added: Vec<String>,
    /// Packages present before but not after.
    pub removed: Vec<String>,
    /// Packages whose inventory fetch failed and was rescheduled.
    pub failed: Vec<String>,
    /// When the rebuild finished.
    pub finished_at: DateTime<Utc>,
}

struct ResolverInner {
    config: ResolverConfig,
    table: SymbolTable,
    base_urls: RwLock<BTreeMap<String, String>>,
    cache: PageCache,
    store: Arc<dyn DocStore>,
    inventories: Arc<dyn InventorySource>,
    registry: Arc<dyn PackageRegistry>,
    gate: ReadGate,
    locks: ScopedLocks,
    retries: RetryScheduler,
    /// Packages that already failed an inventory fetch this cycle; controls
    /// which backoff delay the next failure gets.
    failed_before: DashSet<String>,
}

/// Documentation symbol resolver.
///
/// Owns the merged namespace and the parse cache, fans out inventory fetches
/// on [`refresh`](Self::refresh), and serves lookups through
/// [`resolve`](Self::resolve). Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct DocResolver {
    inner: Arc<ResolverInner>,
}

impl DocResolver {
    /// Wire a resolver to its five collaborators.
    #[must_use]
    pub fn new(
        registry: Arc<dyn PackageRegistry>,
        inventories: Arc<dyn InventorySource>,
        pages: Arc<dyn PageSource>,
        extractor: Arc<dyn MarkdownExtractor>,
        store: Arc<dyn DocStore>,
        config: ResolverConfig,
    ) -> Self {
        let cache = PageCache::with_config(pages, extractor, Arc::clone(&store), config.cache.clone());
        Self {
            inner: Arc::new(ResolverInner {
                config,
                table: SymbolTable::new(),
                base_urls: RwLock::new(BTreeMap::new()),
                cache,
                store,
                inventories,
                registry,
                gate: ReadGate::new(),
                locks: ScopedLocks::new(),
                retries: RetryScheduler::new(),
                failed_before: DashSet::new(),
            }),
        }
    }

    /// Rebuild the whole namespace from the package registry.
    ///
    /// Closes the read gate, drops every in-memory structure (scheduled
    /// retries included), then fetches and merges all configured inventories
    /// concurrently. Packages whose inventory is unreachable are retried
    /// with backoff and reported in the result, not propagated.
    ///
    /// # Errors
    ///
    /// [`ResolverError::RefreshInProgress`] when another refresh holds the
    /// scope; registry and cache errors otherwise.
    pub async fn refresh(&self) -> Result<RefreshReport, ResolverError> {
        let Some(_guard) = self.inner.locks.try_acquire(REFRESH_SCOPE) else {
            return Err(ResolverError::RefreshInProgress);
        };
        self.refresh_in_scope().await
    }

    /// Refresh body, assuming the caller holds the refresh scope.
    async fn refresh_in_scope(&self) -> Result<RefreshReport, ResolverError> {
        self.inner.gate.close();
        debug!("refreshing documentation inventories");
        let outcome = self.rebuild().await;
        self.inner.gate.open();
        outcome
    }

    async fn rebuild(&self) -> Result<RefreshReport, ResolverError> {
        let inner = &self.inner;
        inner.retries.cancel_all();
        inner.failed_before.clear();

        let previous: Vec<String> = inner.base_urls.read().keys().cloned().collect();
        inner.base_urls.write().clear();
        inner.table.clear();
        inner.cache.clear().await?;

        let packages = inner
            .registry
            .list_packages()
            .await
            .map_err(ResolverError::Registry)?;
        let updates = packages.iter().map(|spec| {
            update_package(
                Arc::clone(inner),
                spec.name.clone(),
                spec.base_url.clone(),
                spec.inventory_url.clone(),
            )
        });
        let results = join_all(updates).await;

        let failed = packages
            .iter()
            .zip(&results)
            .filter(|(_, merged)| !**merged)
            .map(|(spec, _)| spec.name.clone())
            .collect();
        let current: Vec<String> = inner.base_urls.read().keys().cloned().collect();
        info!(packages = packages.len(), symbols = inner.table.len(), "inventories refreshed");
        Ok(RefreshReport {
            added: current.iter().filter(|name| !previous.contains(name)).cloned().collect(),
            removed: previous.into_iter().filter(|name| !current.contains(name)).collect(),
            failed,
            finished_at: Utc::now(),
        })
    }

    /// Resolve a symbol name to its documentation.
    ///
    /// Waits for any in-flight refresh first (gate before table), then
    /// consults the persistent store, then falls through to the parse cache.
    ///
    /// # Errors
    ///
    /// Store and cache errors; a missing symbol is [`DocLookup::NotFound`],
    /// not an error.
    pub async fn resolve(&self, symbol: &str) -> Result<DocLookup, ResolverError> {
        let inner = &self.inner;
        if !inner.gate.is_open() {
            debug!(symbol, "waiting for inventory refresh before lookup");
        }
        inner.gate.wait_open().await;

        let Some(location) = inner.table.get(symbol) else {
            debug!(symbol, "symbol not found in any inventory");
            return Ok(DocLookup::NotFound);
        };
        counter!("doc_fetches", "package" => location.package().to_owned()).increment(1);

        let markdown = match inner.store.get(&location).await.map_err(ResolverError::Store)? {
            Some(markdown) => markdown,
            None => {
                trace!(symbol, "doc store miss; parsing page");
                inner.cache.markdown(&location).await?
            }
        };

        Ok(DocLookup::Found(SymbolDoc {
            name: symbol.to_owned(),
            url: location.anchored_url(),
            markdown,
            alternates: inner.table.alternates_of(symbol),
            location,
        }))
    }

    /// Fetch and merge one package's inventory into the live namespace.
    ///
    /// Returns whether the inventory was merged; on fetch failure a retry is
    /// scheduled (2 minutes on the package's first failure this cycle,
    /// 5 minutes after) and `false` is returned.
    pub async fn update_package(&self, name: &str, base_url: &str, inventory_url: &str) -> bool {
        update_package(
            Arc::clone(&self.inner),
            name.to_owned(),
            base_url.to_owned(),
            inventory_url.to_owned(),
        )
        .await
    }

    /// Register a package and pull its inventory immediately, without a full
    /// rebuild.
    ///
    /// # Errors
    ///
    /// [`ResolverError::RefreshInProgress`] when a refresh holds the scope;
    /// registry errors otherwise.
    pub async fn install_package(&self, spec: PackageSpec) -> Result<InstallOutcome, ResolverError> {
        let Some(_guard) = self.inner.locks.try_acquire(REFRESH_SCOPE) else {
            return Err(ResolverError::RefreshInProgress);
        };
        self.inner
            .registry
            .add_package(spec.clone())
            .await
            .map_err(ResolverError::Registry)?;
        info!(package = %spec.name, base_url = %spec.base_url, "documentation package registered");

        let merged =
            update_package(Arc::clone(&self.inner), spec.name, spec.base_url, spec.inventory_url).await;
        Ok(if merged {
            InstallOutcome::Refreshed
        } else {
            InstallOutcome::FetchRescheduled
        })
    }

    /// Remove a package, rebuild the namespace, and evict its stored docs.
    ///
    /// # Errors
    ///
    /// [`ResolverError::RefreshInProgress`] when a refresh holds the scope;
    /// registry, store, and cache errors otherwise.
    pub async fn remove_package(&self, name: &str) -> Result<RefreshReport, ResolverError> {
        let Some(_guard) = self.inner.locks.try_acquire(REFRESH_SCOPE) else {
            return Err(ResolverError::RefreshInProgress);
        };
        self.inner
            .registry
            .remove_package(name)
            .await
            .map_err(ResolverError::Registry)?;
        // Rebuild so everything that came from this package is gone.
        let report = self.refresh_in_scope().await?;
        let evicted = self
            .inner
            .store
            .delete_package(name)
            .await
            .map_err(ResolverError::Store)?;
        if evicted {
            debug!(package = name, "evicted stored docs for removed package");
        }
        info!(package = name, "documentation package removed");
        Ok(report)
    }

    /// Evict a package's persisted docs without touching the namespace.
    ///
    /// # Errors
    ///
    /// Store errors.
    pub async fn evict_package_docs(&self, name: &str) -> Result<bool, ResolverError> {
        self.inner
            .store
            .delete_package(name)
            .await
            .map_err(ResolverError::Store)
    }

    /// All configured packages and their base documentation URLs, sorted by
    /// package name.
    #[must_use]
    pub fn all_inventories(&self) -> Vec<(String, String)> {
        self.inner
            .base_urls
            .read()
            .iter()
            .map(|(name, url)| (name.clone(), url.clone()))
            .collect()
    }

    /// Number of packages currently in the namespace.
    #[must_use]
    pub fn package_count(&self) -> usize {
        self.inner.base_urls.read().len()
    }

    /// Whether the namespace is readable right now (no refresh in flight).
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.gate.is_open()
    }
}

/// Fetch one package's inventory and merge it, scheduling a backed-off retry
/// of this same operation on fetch failure. Never propagates the failure to
/// sibling updates.
///
/// Boxed because the scheduled retry re-enters this very function.
fn update_package(
    inner: Arc<ResolverInner>,
    name: String,
    base_url: String,
    inventory_url: String,
) -> BoxFuture<'static, bool> {
    Box::pin(async move {
        inner.base_urls.write().insert(name.clone(), base_url.clone());

        match inner.inventories.fetch_inventory(&inventory_url).await {
            Ok(inventory) => {
                inner.failed_before.remove(&name);
                let stored = inner
                    .table
                    .merge_package(&name, &base_url, &inventory, &inner.config.merge);
                trace!(package = %name, symbols = stored.len(), "inventory merged");
                for location in stored {
                    inner.cache.add_item(location);
                }
                true
            }
            Err(err) => {
                let delay = if inner.failed_before.contains(&name) {
                    inner.config.retry_repeat
                } else {
                    inner.config.retry_initial
                };
                info!(
                    package = %name,
                    %err,
                    retry_in_secs = delay.as_secs(),
                    "inventory unreachable; retrying later"
                );
                inner.failed_before.insert(name.clone());
                let retry = Arc::clone(&inner);
                let (retry_name, retry_base, retry_url) = (name.clone(), base_url, inventory_url);
                inner.retries.schedule_in(&name, delay, async move {
                    update_package(retry, retry_name, retry_base, retry_url).await;
                });
                false
            }
        }
    })
}
