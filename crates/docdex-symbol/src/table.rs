//! Merged symbol namespace with collision rules
//!
//! Provides [`SymbolTable`], the shared name → [`SymbolLocation`] mapping all
//! package inventories merge into, and [`MergeConfig`], the static collision
//! policy. The table and its alternate-name set live behind one lock so they
//! are always cleared and repopulated as a pair.

use crate::inventory::{group_kind, Inventory};
use crate::location::SymbolLocation;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::warn;

/// Collision policy for [`SymbolTable::merge_package`].
///
/// Symbols whose kind is in `force_prefix_kinds` always lose the bare name to
/// a `"<kind>.<name>"` composite when colliding; packages in
/// `priority_packages` win the bare name from whoever holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Kinds whose symbols get the kind prefixed on duplicates.
    pub force_prefix_kinds: HashSet<String>,
    /// Packages that take the bare name over an incumbent.
    pub priority_packages: HashSet<String>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            force_prefix_kinds: ["2to3fixer", "token", "label", "pdbcommand", "term"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            priority_packages: ["python"].into_iter().map(str::to_owned).collect(),
        }
    }
}

impl MergeConfig {
    /// Replace the force-prefix kind set.
    #[must_use]
    pub fn with_force_prefix_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.force_prefix_kinds = kinds.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the priority-package set.
    #[must_use]
    pub fn with_priority_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.priority_packages = packages.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Default)]
struct TableInner {
    symbols: HashMap<String, SymbolLocation>,
    alternates: HashSet<String>,
}

/// The merged namespace: symbol name → location, plus the set of alternate
/// (disambiguated) names created while resolving collisions.
///
/// Invariant: at most one location per live name. Both structures sit behind
/// a single lock, so concurrent `merge_package` calls from a refresh fan-out
/// serialize on mutation while reads stay concurrent.
#[derive(Debug, Default)]
pub struct SymbolTable {
    inner: RwLock<TableInner>,
}

impl SymbolTable {
    /// Create an empty table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one package's inventory into the table.
    ///
    /// Returns the newly stored locations in merge order so the caller can
    /// register each with the parse cache. Entries whose raw name contains a
    /// path separator are unaddressable and skipped; groups with a malformed
    /// identifier (no `:`) are skipped whole without aborting the merge.
    ///
    /// Name collisions resolve by the first matching rule:
    /// 1. new entry's kind is force-prefixed → new stored as `"<kind>.<name>"`
    /// 2. incumbent's kind is force-prefixed → incumbent moves to
    ///    `"<kind>.<name>"` (re-derived as `"<package>.<kind>.<name>"` if that
    ///    alternate is taken), new entry takes the bare name
    /// 3. merging package has priority → incumbent moves to
    ///    `"<its package>.<name>"`, new entry takes the bare name
    /// 4. otherwise → new stored as `"<package>.<name>"`
    pub fn merge_package(
        &self,
        package: &str,
        base_url: &str,
        inventory: &Inventory,
        config: &MergeConfig,
    ) -> Vec<SymbolLocation> {
        let package: Arc<str> = package.into();
        let base_url: Arc<str> = base_url.into();
        let mut stored = Vec::with_capacity(inventory.symbol_count());

        let mut inner = self.inner.write();
        for (group, entries) in inventory.groups() {
            let Some(kind) = group_kind(group) else {
                warn!(package = %package, group, "skipping inventory group with malformed identifier");
                continue;
            };
            let kind: Arc<str> = kind.into();

            for entry in entries {
                if entry.name.contains('/') {
                    continue; // unaddressable
                }

                let mut name = entry.name.clone();
                if let Some(incumbent) = inner.symbols.get(&name).cloned() {
                    if config.force_prefix_kinds.contains(kind.as_ref()) {
                        name = format!("{kind}.{name}");
                        inner.alternates.insert(name.clone());
                    } else if config.force_prefix_kinds.contains(incumbent.kind()) {
                        let mut moved = format!("{}.{}", incumbent.kind(), name);
                        if inner.alternates.contains(&moved) {
                            moved = format!("{package}.{moved}");
                        }
                        inner.alternates.insert(moved.clone());
                        inner.symbols.insert(moved, incumbent);
                    } else if config.priority_packages.contains(package.as_ref()) {
                        let moved = format!("{}.{}", incumbent.package(), name);
                        inner.alternates.insert(moved.clone());
                        inner.alternates.insert(name.clone());
                        inner.symbols.insert(moved, incumbent);
                    } else {
                        name = format!("{package}.{name}");
                        inner.alternates.insert(name.clone());
                    }
                }

                let (relative_path, anchor) = split_anchor(&entry.location);
                let location = SymbolLocation::new(
                    Arc::clone(&package),
                    Arc::clone(&kind),
                    Arc::clone(&base_url),
                    relative_path.into(),
                    anchor,
                );
                inner.symbols.insert(name, location.clone());
                stored.push(location);
            }
        }

        stored
    }

    /// Look up a symbol by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<SymbolLocation> {
        self.inner.read().symbols.get(name).cloned()
    }

    /// Whether `name` was recorded as an alternate (disambiguated) name.
    #[must_use]
    pub fn is_alternate(&self, name: &str) -> bool {
        self.inner.read().alternates.contains(name)
    }

    /// Alternate names a symbol is also known as: every recorded alternate
    /// ending in `".<name>"`, excluding the name itself, sorted.
    #[must_use]
    pub fn alternates_of(&self, name: &str) -> Vec<String> {
        let suffix = format!(".{name}");
        let inner = self.inner.read();
        let mut out: Vec<String> = inner
            .alternates
            .iter()
            .filter(|alt| alt.as_str() != name && alt.ends_with(&suffix))
            .cloned()
            .collect();
        out.sort();
        out
    }

    /// Number of live names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().symbols.len()
    }

    /// True when no symbol is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().symbols.is_empty()
    }

    /// Drop the table and its alternate set together.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.symbols.clear();
        inner.alternates.clear();
    }
}

/// Split a relative URL on the first `#` into path and anchor.
fn split_anchor(location: &str) -> (&str, &str) {
    location.split_once('#').unwrap_or((location, ""))
}
