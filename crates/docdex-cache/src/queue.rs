//! Reprioritizable parse queue
//!
//! An index-addressable deque: insertion order plus O(1) identity lookup, so
//! a freshly requested symbol can be promoted to the drain-next position
//! without a linear scan.

use docdex_symbol::SymbolLocation;
use indexmap::IndexMap;
use std::sync::Arc;

/// Ordered `(location, page content)` pairs awaiting parsing.
///
/// A location appears at most once. The worker drains from the back, so
/// promotion means move-to-back: most-recently-requested-first.
#[derive(Debug, Default)]
pub(crate) struct ParseQueue {
    items: IndexMap<SymbolLocation, Arc<str>>,
}

impl ParseQueue {
    /// Append a pair unless the location is already queued.
    pub(crate) fn push(&mut self, location: SymbolLocation, content: Arc<str>) {
        if !self.items.contains_key(&location) {
            self.items.insert(location, content);
        }
    }

    /// Move `location` to the drain-next position.
    ///
    /// Returns whether the location was queued; absence is a defined no-op
    /// (the item may already be parsed, or its page not fetched yet).
    pub(crate) fn promote(&mut self, location: &SymbolLocation) -> bool {
        match self.items.shift_remove(location) {
            Some(content) => {
                self.items.insert(location.clone(), content);
                true
            }
            None => false,
        }
    }

    /// Take the next pair to parse.
    pub(crate) fn pop(&mut self) -> Option<(SymbolLocation, Arc<str>)> {
        self.items.pop()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }
}
