//! Markdown extractor contract

use crate::error::SourceError;
use async_trait::async_trait;
use docdex_symbol::SymbolLocation;

/// Turns fetched page content into the markdown for one symbol on it.
///
/// May fail on malformed content; the parse worker logs the failure and
/// resolves that symbol as failed rather than aborting the queue.
#[async_trait]
pub trait MarkdownExtractor: Send + Sync {
    /// Extract markdown for `location` out of `page`.
    async fn extract(&self, page: &str, location: &SymbolLocation) -> Result<String, SourceError>;
}
