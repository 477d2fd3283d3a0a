//! CSS selectors for template matching
//!
//! A thin wrapper over `scraper::Selector` that remembers its trimmed source
//! text (used for deduplication and logging) and maps parse failures to
//! [`ConfigError::InvalidSelector`]. Matching walks only the nodes reachable
//! from the root, in document order, so subtrees detached by chrome removal
//! never match.

use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;
use crate::dom::{Document, NodeId};

/// Parsed CSS selector
#[derive(Debug, Clone)]
pub struct Selector {
    source: String,
    inner: scraper::Selector,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let source = source.trim();
        let inner =
            scraper::Selector::parse(source).map_err(|e| ConfigError::InvalidSelector {
                selector: source.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            source: source.to_string(),
            inner,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True when the element `id` matches
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        doc.element_ref(id)
            .is_some_and(|element| self.inner.matches(&element))
    }

    /// Every reachable matching element, in document order
    pub fn select_all<'a>(&'a self, doc: &'a Document) -> impl Iterator<Item = NodeId> + 'a {
        doc.elements().filter(move |id| self.matches(doc, *id))
    }

    /// First reachable matching element in document order
    pub fn select_first(&self, doc: &Document) -> Option<NodeId> {
        self.select_all(doc).next()
    }
}

impl FromStr for Selector {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
