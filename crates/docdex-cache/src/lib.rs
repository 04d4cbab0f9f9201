//! docdex parse cache
//!
//! Turns N symbol requests against the same documentation page into exactly
//! one page fetch and N independent markdown deliveries.
//!
//! Symbols are registered through [`PageCache::add_item`] as inventories
//! merge. The first [`PageCache::markdown`] call touching a page fetches it
//! once, queues every symbol registered for it, and starts a single
//! background worker that drains the queue most-recently-requested-first,
//! writing each successful parse through to the persistent store.

#![warn(missing_docs)]

mod cache;
mod queue;

// Re-exports
pub use cache::{CacheConfig, CacheError, PageCache};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
