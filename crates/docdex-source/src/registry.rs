//! Package registry contract

use crate::error::SourceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One configured documentation package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpec {
    /// Package name, the namespace prefix used on collisions.
    pub name: String,
    /// Root documentation URL; symbol paths are resolved against it.
    pub base_url: String,
    /// Absolute URL of the package's inventory file.
    pub inventory_url: String,
}

impl PackageSpec {
    /// Convenience constructor.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        inventory_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            inventory_url: inventory_url.into(),
        }
    }
}

/// Externally persisted CRUD over the configured package set.
///
/// The core only consumes [`list_packages`](Self::list_packages) during a
/// refresh; add/remove exist so package management operations can go through
/// the same seam.
#[async_trait]
pub trait PackageRegistry: Send + Sync {
    /// All configured packages.
    async fn list_packages(&self) -> Result<Vec<PackageSpec>, SourceError>;

    /// Register a package, replacing any existing spec with the same name.
    async fn add_package(&self, spec: PackageSpec) -> Result<(), SourceError>;

    /// Remove a package by name.
    async fn remove_package(&self, name: &str) -> Result<(), SourceError>;
}
