//! Layer 1: HTML5 semantic containers

use std::borrow::Cow;

use super::{is_meaningful, ExtractionResult, ExtractionStrategy, Layer};
use crate::config::Meaningfulness;
use crate::dom::Document;
use crate::selector::Selector;

/// Semantic container selectors, in priority order
const SEMANTIC_SELECTORS: [&str; 3] = ["main", "article", "[role=\"main\"]"];

/// Tries the first `<main>`, then the first `<article>`, then the first
/// `[role="main"]` element
#[derive(Debug, Clone)]
pub struct SemanticContainers {
    selectors: Vec<Selector>,
    thresholds: Meaningfulness,
}

impl SemanticContainers {
    pub fn new(thresholds: Meaningfulness) -> Self {
        let selectors = SEMANTIC_SELECTORS
            .iter()
            .filter_map(|source| Selector::parse(source).ok())
            .collect();
        Self {
            selectors,
            thresholds,
        }
    }
}

impl ExtractionStrategy for SemanticContainers {
    fn layer(&self) -> Layer {
        Layer::Semantic
    }

    fn try_extract<'a>(&self, doc: &'a Document) -> Option<ExtractionResult<'a>> {
        self.selectors
            .iter()
            .filter_map(|selector| selector.select_first(doc))
            .find(|id| is_meaningful(doc, *id, &self.thresholds))
            .map(|id| ExtractionResult::new(Cow::Borrowed(doc), id, Layer::Semantic))
    }
}
