//! Collaborator error type

/// Failure reported by an external collaborator.
///
/// The core decides how each variant propagates: inventory failures are
/// retried with backoff, page failures surface to the requesting caller,
/// extraction failures resolve that symbol as failed without killing the
/// parse worker.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Inventory file could not be fetched or decoded.
    #[error("inventory fetch failed for {url}: {reason}")]
    InventoryFetch {
        /// Inventory file URL.
        url: String,
        /// Backend-specific failure description.
        reason: String,
    },

    /// Documentation page could not be fetched.
    #[error("page fetch failed for {url}: {reason}")]
    PageFetch {
        /// Page URL.
        url: String,
        /// Backend-specific failure description.
        reason: String,
    },

    /// Extractor could not turn page content into markdown for a symbol.
    #[error("markdown extraction failed for {symbol}: {reason}")]
    Extraction {
        /// Anchored URL of the symbol being extracted.
        symbol: String,
        /// Backend-specific failure description.
        reason: String,
    },

    /// Persistent doc store is unavailable or rejected the operation.
    #[error("doc store error: {0}")]
    Store(String),

    /// Package registry is unavailable or rejected the operation.
    #[error("package registry error: {0}")]
    Registry(String),
}
