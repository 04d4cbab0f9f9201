//! Symbol location value type

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Where one documentation symbol lives.
///
/// Used both as a map key and as a work-item identity in the parse cache, so
/// equality and hashing are field-wise. The shared fields are `Arc<str>`
/// because a package's symbols repeat the same package name, kind, base URL
/// and (for symbols on the same page) relative path thousands of times.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolLocation {
    package: Arc<str>,
    kind: Arc<str>,
    base_url: Arc<str>,
    relative_path: Arc<str>,
    anchor: String,
}

impl SymbolLocation {
    /// Create a location from pre-shared field handles.
    #[must_use]
    pub fn new(
        package: Arc<str>,
        kind: Arc<str>,
        base_url: Arc<str>,
        relative_path: Arc<str>,
        anchor: impl Into<String>,
    ) -> Self {
        Self {
            package,
            kind,
            base_url,
            relative_path,
            anchor: anchor.into(),
        }
    }

    /// Owning package name.
    #[inline]
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Symbol kind within its source documentation system (class, label, ...).
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Root documentation URL of the owning package.
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Page path relative to [`base_url`](Self::base_url).
    #[inline]
    #[must_use]
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Fragment identifier on the page, empty when the symbol has none.
    #[inline]
    #[must_use]
    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    /// Absolute URL of the page holding this symbol.
    ///
    /// Every symbol sharing a page produces the same value here, which is
    /// what the parse cache batches on.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.relative_path)
    }

    /// Absolute URL including the symbol's anchor, for linking to the symbol
    /// itself rather than its page.
    #[must_use]
    pub fn anchored_url(&self) -> String {
        if self.anchor.is_empty() {
            self.url()
        } else {
            format!("{}{}#{}", self.base_url, self.relative_path, self.anchor)
        }
    }
}

impl fmt::Display for SymbolLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.package, self.anchored_url())
    }
}
