//! Page source contract

use crate::error::SourceError;
use async_trait::async_trait;

/// Fetches raw documentation page content.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page at `url`, failing on network or HTTP errors.
    async fn fetch_page(&self, url: &str) -> Result<String, SourceError>;
}
