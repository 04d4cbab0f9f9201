//! Collaborator contracts for docdex
//!
//! The resolution core treats everything that touches the outside world as a
//! service behind a trait: inventory files, documentation pages, the
//! HTML-to-markdown extractor, the persistent doc store, and the package
//! registry. Concrete network/storage backends implement these traits
//! elsewhere; the core only ever holds `Arc<dyn Trait>` handles.
//!
//! One implementation ships here: [`MemoryDocStore`], a moka-backed
//! [`DocStore`] suitable for tests and single-process deployments.

#![warn(missing_docs)]

mod error;
mod extract;
mod inventories;
mod pages;
mod registry;
mod store;

// Re-exports
pub use error::SourceError;
pub use extract::MarkdownExtractor;
pub use inventories::InventorySource;
pub use pages::PageSource;
pub use registry::{PackageRegistry, PackageSpec};
pub use store::{DocStore, MemoryDocStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
