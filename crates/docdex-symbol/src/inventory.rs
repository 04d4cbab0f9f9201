//! Decoded inventory shape
//!
//! An inventory is a package's published index: symbol names mapped to
//! relative documentation paths, grouped by `"<domain>:<kind>"` identifiers.
//! Decoding the wire format is a collaborator concern; this type only models
//! the decoded result handed to [`SymbolTable::merge_package`].
//!
//! [`SymbolTable::merge_package`]: crate::SymbolTable::merge_package

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One symbol row within an inventory group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    /// Raw symbol name as published by the package.
    pub name: String,
    /// Relative page URL, optionally carrying a `#anchor` suffix.
    pub location: String,
}

/// A package's decoded inventory: group identifier → symbol rows.
///
/// Group order is preserved so merging stays deterministic for a given
/// inventory file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    groups: IndexMap<String, Vec<InventoryEntry>>,
}

impl Inventory {
    /// Create an empty inventory.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a symbol row to a group, creating the group if needed.
    pub fn push(
        &mut self,
        group: impl Into<String>,
        name: impl Into<String>,
        location: impl Into<String>,
    ) {
        self.groups.entry(group.into()).or_default().push(InventoryEntry {
            name: name.into(),
            location: location.into(),
        });
    }

    /// Builder-style [`push`](Self::push).
    #[must_use]
    pub fn with_entry(
        mut self,
        group: impl Into<String>,
        name: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        self.push(group, name, location);
        self
    }

    /// Iterate groups in insertion order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[InventoryEntry])> {
        self.groups.iter().map(|(id, entries)| (id.as_str(), entries.as_slice()))
    }

    /// Total symbol rows across all groups.
    #[must_use]
    pub fn symbol_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// True when no group holds any row.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbol_count() == 0
    }
}

/// Extract the kind from a `"<domain>:<kind>"` group identifier.
///
/// Returns `None` for identifiers with no separator; such groups are
/// structurally malformed and skipped by the merge.
pub(crate) fn group_kind(group: &str) -> Option<&str> {
    group.split(':').nth(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_preserves_group_order() {
        let mut inventory = Inventory::new();
        inventory.push("py:class", "ClientSession", "client.html#ClientSession");
        inventory.push("py:function", "request", "client.html#request");
        inventory.push("py:class", "ClientTimeout", "client.html#ClientTimeout");

        let groups: Vec<&str> = inventory.groups().map(|(id, _)| id).collect();
        assert_eq!(groups, ["py:class", "py:function"]);
        assert_eq!(inventory.symbol_count(), 3);
    }

    #[test]
    fn group_kind_takes_second_component() {
        assert_eq!(group_kind("py:class"), Some("class"));
        assert_eq!(group_kind("std:label"), Some("label"));
        assert_eq!(group_kind("a:b:c"), Some("b"));
        assert_eq!(group_kind("malformed"), None);
    }

    #[test]
    fn empty_inventory() {
        assert!(Inventory::new().is_empty());
        assert!(!Inventory::new().with_entry("py:class", "A", "a.html").is_empty());
    }
}
