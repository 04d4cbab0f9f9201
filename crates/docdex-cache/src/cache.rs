//! Page-batched, single-flight parse cache

use crate::queue::ParseQueue;
use docdex_source::{DocStore, MarkdownExtractor, PageSource};
use docdex_symbol::SymbolLocation;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

/// Tunables for [`PageCache`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Pause between parsed items, bounding burst load on the extractor and
    /// the persistent store.
    pub parse_cooldown: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            parse_cooldown: Duration::from_millis(100),
        }
    }
}

impl CacheConfig {
    /// Override the inter-item cooldown.
    #[must_use]
    pub fn with_parse_cooldown(mut self, cooldown: Duration) -> Self {
        self.parse_cooldown = cooldown;
        self
    }
}

/// Errors surfaced by [`PageCache::markdown`] and [`PageCache::clear`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// The containing page could not be fetched; the symbols queued for it
    /// were restored and the next request will retry the fetch.
    #[error("page unavailable: {url}: {reason}")]
    PageUnavailable {
        /// Page URL that failed to fetch.
        url: String,
        /// Collaborator failure description.
        reason: String,
    },

    /// The extractor failed on this symbol; the failure is terminal for this
    /// cache generation.
    #[error("markdown extraction failed for {url}")]
    ExtractionFailed {
        /// Anchored URL of the failing symbol.
        url: String,
    },

    /// The cache is mid-[`clear`](PageCache::clear); retry after the owning
    /// refresh finishes.
    #[error("parse cache is being cleared")]
    ClearInProgress,

    /// The symbol is no longer scheduled in this cache generation, typically
    /// because a clear raced the request.
    #[error("symbol is no longer scheduled for parsing: {url}")]
    Stale {
        /// Anchored URL of the requested symbol.
        url: String,
    },
}

/// Terminal state of one symbol's parse.
#[derive(Debug, Clone)]
enum ParseOutcome {
    Markdown(Arc<str>),
    Failed,
}

type ResultSlot = watch::Sender<Option<ParseOutcome>>;
type FlightOutcome = Option<Result<(), String>>;

/// What a `markdown` call has to do about its page, decided under the state
/// lock and executed outside it.
enum PagePlan {
    /// Bucket taken; this caller fetches for everyone.
    Fetch {
        batch: Vec<SymbolLocation>,
        flight: watch::Sender<FlightOutcome>,
        generation: u64,
    },
    /// Another caller is fetching; await its outcome.
    Join(watch::Receiver<FlightOutcome>, u64),
    /// Page already fetched this generation.
    Ready(u64),
}

#[derive(Default)]
struct CacheState {
    /// Page URL → symbols registered but not yet fetched.
    pending_pages: HashMap<String, Vec<SymbolLocation>>,
    /// Page URL → outcome channel of the fetch currently in flight.
    in_flight: HashMap<String, watch::Receiver<FlightOutcome>>,
    queue: ParseQueue,
    /// Single-resolution result per symbol; resolved slots stay valid for
    /// late arrivals until the cache is cleared.
    results: HashMap<SymbolLocation, ResultSlot>,
    worker: Option<JoinHandle<()>>,
    clearing: bool,
    /// Bumped by every clear so stale fetch continuations drop their batch
    /// instead of repopulating a wiped cache.
    generation: u64,
}

struct CacheInner {
    pages: Arc<dyn PageSource>,
    extractor: Arc<dyn MarkdownExtractor>,
    store: Arc<dyn DocStore>,
    config: CacheConfig,
    state: Mutex<CacheState>,
}

/// Get symbol markdown from pages with page-granular batching.
///
/// Symbols are registered up front via [`add_item`](Self::add_item). The
/// first [`markdown`](Self::markdown) call touching a page fetches it once
/// and queues every symbol registered for that page, so N requests against
/// one page cost one fetch. Concurrent requesters of one symbol share a
/// single result; a lone background worker drains the queue
/// most-recently-requested-first.
#[derive(Clone)]
pub struct PageCache {
    inner: Arc<CacheInner>,
}

impl PageCache {
    /// Create a cache over the given collaborators with default tunables.
    #[must_use]
    pub fn new(
        pages: Arc<dyn PageSource>,
        extractor: Arc<dyn MarkdownExtractor>,
        store: Arc<dyn DocStore>,
    ) -> Self {
        Self::with_config(pages, extractor, store, CacheConfig::default())
    }

    /// Create a cache with explicit tunables.
    #[must_use]
    pub fn with_config(
        pages: Arc<dyn PageSource>,
        extractor: Arc<dyn MarkdownExtractor>,
        store: Arc<dyn DocStore>,
        config: CacheConfig,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                pages,
                extractor,
                store,
                config,
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    /// Register a symbol under its page URL. Idempotent-additive: items are
    /// only ever drained by the page fetch, never removed here.
    pub fn add_item(&self, location: SymbolLocation) {
        let mut state = self.inner.state.lock();
        state.pending_pages.entry(location.url()).or_default().push(location);
    }

    /// Resolve one symbol to its markdown.
    ///
    /// Fetches the symbol's page if nobody has yet (exactly once per page,
    /// shared with concurrent callers), promotes the symbol to the front of
    /// the parse queue, and waits for the worker to deliver.
    ///
    /// # Errors
    ///
    /// - [`CacheError::PageUnavailable`] when the page fetch fails; the
    ///   page's symbols are restored for a later retry
    /// - [`CacheError::ExtractionFailed`] when the extractor rejects the
    ///   symbol
    /// - [`CacheError::ClearInProgress`] / [`CacheError::Stale`] when the
    ///   request races a cache clear
    pub async fn markdown(&self, location: &SymbolLocation) -> Result<String, CacheError> {
        let url = location.url();
        let generation = self.prepare_page(&url).await?;
        let mut slot = self.subscribe(location, generation)?;

        let outcome = slot
            .wait_for(|resolved| resolved.is_some())
            .await
            .map_err(|_| CacheError::Stale {
                url: location.anchored_url(),
            })?
            .as_ref()
            .cloned();

        match outcome {
            Some(ParseOutcome::Markdown(markdown)) => Ok(markdown.to_string()),
            Some(ParseOutcome::Failed) => Err(CacheError::ExtractionFailed {
                url: location.anchored_url(),
            }),
            None => Err(CacheError::Stale {
                url: location.anchored_url(),
            }),
        }
    }

    /// Wait out every outstanding result, cancel the worker, then wipe all
    /// in-memory state.
    ///
    /// Callers already waiting on a symbol receive whatever the worker
    /// delivers before the cancellation; nobody observes the clear as their
    /// own failure.
    ///
    /// # Errors
    ///
    /// [`CacheError::ClearInProgress`] when invoked concurrently with
    /// itself; exactly one refresh owns the clear at a time.
    pub async fn clear(&self) -> Result<(), CacheError> {
        let outstanding: Vec<watch::Receiver<Option<ParseOutcome>>> = {
            let mut state = self.inner.state.lock();
            if state.clearing {
                return Err(CacheError::ClearInProgress);
            }
            state.clearing = true;
            state
                .results
                .values()
                .filter(|slot| slot.borrow().is_none())
                .map(watch::Sender::subscribe)
                .collect()
        };

        for mut slot in outstanding {
            // A dropped slot ends the wait just as well as a resolution.
            let _ = slot.wait_for(|resolved| resolved.is_some()).await;
        }

        let mut state = self.inner.state.lock();
        if let Some(worker) = state.worker.take() {
            worker.abort();
            trace!("parse worker cancelled");
        }
        state.pending_pages.clear();
        state.in_flight.clear();
        state.queue.clear();
        state.results.clear();
        state.generation += 1;
        state.clearing = false;
        Ok(())
    }

    /// Decide and execute the page step: fetch the page for everyone, join a
    /// fetch already in flight, or fall through when the page is done.
    async fn prepare_page(&self, url: &str) -> Result<u64, CacheError> {
        let plan = {
            let mut state = self.inner.state.lock();
            if state.clearing {
                return Err(CacheError::ClearInProgress);
            }
            if let Some(batch) = state.pending_pages.remove(url) {
                let (tx, rx) = watch::channel(None);
                state.in_flight.insert(url.to_owned(), rx);
                PagePlan::Fetch {
                    batch,
                    flight: tx,
                    generation: state.generation,
                }
            } else if let Some(rx) = state.in_flight.get(url) {
                PagePlan::Join(rx.clone(), state.generation)
            } else {
                PagePlan::Ready(state.generation)
            }
        };

        match plan {
            PagePlan::Ready(generation) => Ok(generation),
            PagePlan::Join(mut flight, generation) => {
                let joined = flight
                    .wait_for(|outcome| outcome.is_some())
                    .await
                    .map_err(|_| CacheError::Stale { url: url.to_owned() })?
                    .as_ref()
                    .cloned();
                match joined {
                    Some(Err(reason)) => Err(CacheError::PageUnavailable {
                        url: url.to_owned(),
                        reason,
                    }),
                    _ => Ok(generation),
                }
            }
            PagePlan::Fetch {
                batch,
                flight,
                generation,
            } => self.fetch_page(url, batch, flight, generation).await,
        }
    }

    /// Fetch one page and queue its batch, publishing the outcome to every
    /// joined caller.
    async fn fetch_page(
        &self,
        url: &str,
        batch: Vec<SymbolLocation>,
        flight: watch::Sender<FlightOutcome>,
        generation: u64,
    ) -> Result<u64, CacheError> {
        debug!(url, symbols = batch.len(), "fetching documentation page");
        match self.inner.pages.fetch_page(url).await {
            Ok(content) => {
                let content: Arc<str> = content.into();
                let mut state = self.inner.state.lock();
                state.in_flight.remove(url);
                if state.generation != generation {
                    // The cache was cleared while we fetched; this batch
                    // belongs to a dead generation.
                    drop(state);
                    let _ = flight.send(Some(Ok(())));
                    return Err(CacheError::Stale { url: url.to_owned() });
                }
                for location in batch {
                    state.queue.push(location, Arc::clone(&content));
                }
                self.spawn_worker(&mut state);
                drop(state);
                let _ = flight.send(Some(Ok(())));
                Ok(generation)
            }
            Err(err) => {
                let reason = err.to_string();
                let mut state = self.inner.state.lock();
                state.in_flight.remove(url);
                if state.generation == generation {
                    // Put the batch back so a later request retries the page.
                    state.pending_pages.entry(url.to_owned()).or_default().extend(batch);
                }
                drop(state);
                let _ = flight.send(Some(Err(reason.clone())));
                Err(CacheError::PageUnavailable {
                    url: url.to_owned(),
                    reason,
                })
            }
        }
    }

    /// Promote the symbol in the queue and hand back its result channel,
    /// creating one when this is the first request for it.
    fn subscribe(
        &self,
        location: &SymbolLocation,
        generation: u64,
    ) -> Result<watch::Receiver<Option<ParseOutcome>>, CacheError> {
        let mut state = self.inner.state.lock();
        if state.clearing {
            return Err(CacheError::ClearInProgress);
        }
        if state.generation != generation {
            return Err(CacheError::Stale {
                url: location.anchored_url(),
            });
        }

        let queued = state.queue.promote(location);
        if queued {
            // Normally running already; restarts the drain if a request
            // catches a queued item with no live worker.
            self.spawn_worker(&mut state);
        }
        if let Some(slot) = state.results.get(location) {
            return Ok(slot.subscribe());
        }
        if !queued {
            // Nothing left that could ever resolve this symbol.
            return Err(CacheError::Stale {
                url: location.anchored_url(),
            });
        }
        let (tx, rx) = watch::channel(None);
        state.results.insert(location.clone(), tx);
        Ok(rx)
    }

    /// Start the single worker when the queue is non-empty and none runs.
    fn spawn_worker(&self, state: &mut CacheState) {
        if state.worker.is_none() && !state.queue.is_empty() {
            let inner = Arc::clone(&self.inner);
            state.worker = Some(tokio::spawn(run_worker(inner)));
            trace!("parse worker started");
        }
    }
}

/// Drain the parse queue, resolving each symbol's result slot and writing
/// successful parses through to the persistent store. Runs until the queue
/// empties; the next triggering request starts a fresh worker.
async fn run_worker(inner: Arc<CacheInner>) {
    trace!("parse queue drain started");
    loop {
        let next = {
            let mut state = inner.state.lock();
            match state.queue.pop() {
                Some((location, content)) => {
                    // Claim the slot before parsing so a request arriving
                    // mid-extraction finds something to wait on.
                    state
                        .results
                        .entry(location.clone())
                        .or_insert_with(|| watch::channel(None).0);
                    Some((location, content))
                }
                None => {
                    state.worker = None;
                    None
                }
            }
        };
        let Some((location, content)) = next else {
            break;
        };

        match inner.extractor.extract(&content, &location).await {
            Ok(markdown) => {
                if let Err(err) = inner.store.set(&location, &markdown).await {
                    warn!(symbol = %location, %err, "failed to persist parsed markdown");
                }
                resolve(&inner, &location, ParseOutcome::Markdown(markdown.into()));
            }
            Err(err) => {
                error!(symbol = %location, %err, "markdown extraction failed");
                resolve(&inner, &location, ParseOutcome::Failed);
            }
        }

        tokio::time::sleep(inner.config.parse_cooldown).await;
    }
    trace!("parse queue drained");
}

/// Resolve a symbol's slot, creating it when no requester got there first so
/// late arrivals find a completed result.
fn resolve(inner: &CacheInner, location: &SymbolLocation, outcome: ParseOutcome) {
    let mut state = inner.state.lock();
    let slot = state
        .results
        .entry(location.clone())
        .or_insert_with(|| watch::channel(None).0);
    let _ = slot.send(Some(outcome));
}
