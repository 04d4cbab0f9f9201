//! Resolver error type

use docdex_cache::CacheError;
use docdex_source::SourceError;

/// Failures surfaced by [`DocResolver`](crate::DocResolver) operations.
///
/// "Symbol not found" is not an error — lookups report it through
/// [`DocLookup`](crate::DocLookup) so callers can distinguish a missing
/// symbol from documentation that is temporarily unavailable.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    /// Another refresh (or package-mutating operation) holds the
    /// `"inventory refresh"` scope.
    #[error("an inventory refresh is already in progress")]
    RefreshInProgress,

    /// The package registry collaborator failed.
    #[error("package registry unavailable: {0}")]
    Registry(#[source] SourceError),

    /// The persistent doc store collaborator failed.
    #[error("doc store unavailable: {0}")]
    Store(#[source] SourceError),

    /// The parse cache could not deliver the symbol's markdown.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ResolverError {
    /// Whether retrying later could succeed (transient fetch trouble), as
    /// opposed to a terminal failure for this symbol.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RefreshInProgress
                | Self::Registry(_)
                | Self::Store(_)
                | Self::Cache(CacheError::PageUnavailable { .. })
                | Self::Cache(CacheError::ClearInProgress)
                | Self::Cache(CacheError::Stale { .. })
        )
    }
}
