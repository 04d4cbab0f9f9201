//! Inventory source contract

use crate::error::SourceError;
use async_trait::async_trait;
use docdex_symbol::Inventory;

/// Fetches and decodes a package's inventory file.
///
/// Implementations own the wire format; the core only sees the decoded
/// [`Inventory`]. A failed fetch is an error, never a panic — the refresh
/// coordinator reschedules it with backoff.
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Fetch and decode the inventory published at `url`.
    async fn fetch_inventory(&self, url: &str) -> Result<Inventory, SourceError>;
}
