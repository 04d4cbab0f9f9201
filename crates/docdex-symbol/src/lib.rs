//! docdex symbol namespace
//!
//! Merges per-package documentation inventories into a single name → location
//! table, applying deterministic collision rules so every symbol stays
//! reachable under either its bare name or a disambiguated alternate.
//!
//! # Overview
//!
//! - [`SymbolLocation`]: where one symbol's documentation lives
//! - [`Inventory`]: a package's published symbol index, grouped by kind
//! - [`SymbolTable`]: the merged namespace plus its alternate-name set
//! - [`MergeConfig`]: the force-prefix kind set and priority-package set
//!
//! # Example
//!
//! ```rust
//! use docdex_symbol::{Inventory, MergeConfig, SymbolTable};
//!
//! let table = SymbolTable::new();
//! let inventory = Inventory::new()
//!     .with_entry("py:class", "ClientSession", "client.html#aiohttp.ClientSession");
//!
//! let stored = table.merge_package(
//!     "aiohttp",
//!     "https://docs.aiohttp.org/en/stable/",
//!     &inventory,
//!     &MergeConfig::default(),
//! );
//!
//! assert_eq!(stored.len(), 1);
//! assert!(table.get("ClientSession").is_some());
//! ```

#![warn(missing_docs)]

pub mod inventory;
pub mod location;
pub mod table;

// Re-exports
pub use inventory::{Inventory, InventoryEntry};
pub use location::SymbolLocation;
pub use table::{MergeConfig, SymbolTable};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
