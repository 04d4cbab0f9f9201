//! docdex core - refresh coordination and symbol resolution
//!
//! The front door of the system: [`DocResolver`] owns the merged symbol
//! namespace, the page-batched parse cache, and the collaborator handles,
//! and orchestrates full inventory rebuilds without ever exposing readers to
//! a half-rebuilt namespace they didn't ask for.
//!
//! # Example
//!
//! ```rust,ignore
//! use docdex_core::{DocLookup, DocResolver, ResolverConfig};
//!
//! # async fn example(resolver: DocResolver) -> Result<(), docdex_core::ResolverError> {
//! resolver.refresh().await?;
//!
//! match resolver.resolve("aiohttp.ClientSession").await? {
//!     DocLookup::Found(doc) => println!("{}", doc.markdown),
//!     DocLookup::NotFound => println!("no such symbol"),
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod gate;
mod lock;
mod resolver;
mod schedule;

// Re-exports
pub use config::ResolverConfig;
pub use error::ResolverError;
pub use gate::ReadGate;
pub use lock::{ScopedLocks, REFRESH_SCOPE};
pub use resolver::{DocLookup, DocResolver, InstallOutcome, RefreshReport, SymbolDoc};
pub use schedule::RetryScheduler;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for embedding docdex
    pub use crate::{DocLookup, DocResolver, RefreshReport, ResolverConfig, ResolverError, SymbolDoc};
    pub use docdex_source::{
        DocStore, InventorySource, MarkdownExtractor, PackageRegistry, PackageSpec, PageSource,
    };
    pub use docdex_symbol::{Inventory, MergeConfig, SymbolLocation, SymbolTable};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
