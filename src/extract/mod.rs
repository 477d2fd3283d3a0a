//! Content isolation
//!
//! Separates documentation content from site chrome with three layers, tried
//! in order until one yields a meaningful container:
//!
//! 1. [`SemanticContainers`]: `<main>`, `<article>`, `[role="main"]`
//! 2. [`KnownTemplates`]: curated documentation-framework containers plus
//!    caller-supplied selectors
//! 3. [`DensityScorer`]: chrome removal on a deep clone, then weighted
//!    content scoring of every remaining `div`/`section`/`body`
//!
//! A miss in one layer is not an error; only the exhaustion of all layers is
//! (`NoContent`, non-retryable). Layers are strategy objects behind one
//! trait, and [`ContentExtractor`] is just the ordered list.
//!
//! ```
//! use rag_markdown_normalizer::config::ExtractParam;
//! use rag_markdown_normalizer::extract::{ContentExtractor, Layer};
//! use rag_markdown_normalizer::parser::parse_html;
//!
//! let html = b"<html><body><nav>Home | About</nav><main><h1>Install</h1>\
//!     <p>Run the installer and follow the prompts until setup completes.</p></main></body></html>";
//! let doc = parse_html(html).unwrap();
//! let extractor = ContentExtractor::new(ExtractParam::default()).unwrap();
//! let result = extractor.extract(&doc).unwrap();
//! assert_eq!(result.layer(), Layer::Semantic);
//! assert_eq!(result.document().tag_name(result.content()), Some("main"));
//! ```

mod chrome;
mod density;
mod meaningful;
mod semantic;
mod template;

use std::borrow::Cow;
use std::fmt;

pub use chrome::{remove_chrome, CHROME_KEYWORDS, CHROME_TAGS};
pub use density::{score_candidates, DensityScorer, ScoredCandidate};
pub use meaningful::{is_meaningful, ContentStats};
pub use semantic::SemanticContainers;
pub use template::{KnownTemplates, CURATED_SELECTORS};

use crate::config::{ConfigError, ExtractParam};
use crate::dom::{Document, NodeId};
use crate::error::ClassifiedError;

/// Extraction layer that produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Semantic,
    KnownTemplate,
    Density,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Semantic => "semantic",
            Layer::KnownTemplate => "known_template",
            Layer::Density => "density",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Located content container
///
/// `content` addresses a node of `document`. Layers 1 and 2 borrow the
/// caller's document; Layer 3 owns the chrome-stripped clone it scored.
#[derive(Debug, Clone)]
pub struct ExtractionResult<'a> {
    document: Cow<'a, Document>,
    content: NodeId,
    layer: Layer,
}

impl<'a> ExtractionResult<'a> {
    pub(crate) fn new(document: Cow<'a, Document>, content: NodeId, layer: Layer) -> Self {
        Self {
            document,
            content,
            layer,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn content(&self) -> NodeId {
        self.content
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// Serialized HTML of the content subtree
    pub fn content_html(&self) -> String {
        self.document.outer_html(self.content)
    }
}

/// One extraction layer
pub trait ExtractionStrategy: Send + Sync {
    fn layer(&self) -> Layer;

    /// Meaningful content container, or `None` to defer to the next layer
    fn try_extract<'a>(&self, doc: &'a Document) -> Option<ExtractionResult<'a>>;
}

/// Runs the extraction layers in priority order
pub struct ContentExtractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl ContentExtractor {
    /// Standard three-layer extractor
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a parameter is out of range or a custom
    /// selector cannot be parsed.
    pub fn new(param: ExtractParam) -> Result<Self, ConfigError> {
        param.validate()?;
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(SemanticContainers::new(param.meaningfulness())),
            Box::new(KnownTemplates::new(&param)?),
            Box::new(DensityScorer::new(param)),
        ];
        Ok(Self { strategies })
    }

    /// Extractor with an explicit strategy list
    pub fn with_strategies(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Locate the documentation content of `doc`
    ///
    /// # Errors
    ///
    /// Returns a non-retryable `NoContent` error when every layer misses.
    pub fn extract<'a>(&self, doc: &'a Document) -> Result<ExtractionResult<'a>, ClassifiedError> {
        for strategy in &self.strategies {
            match strategy.try_extract(doc) {
                Some(result) => {
                    tracing::debug!(layer = %strategy.layer(), "content container found");
                    return Ok(result);
                }
                None => tracing::debug!(layer = %strategy.layer(), "layer found no content"),
            }
        }
        Err(ClassifiedError::no_content())
    }
}

impl fmt::Debug for ContentExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layers: Vec<Layer> = self.strategies.iter().map(|s| s.layer()).collect();
        f.debug_struct("ContentExtractor")
            .field("layers", &layers)
            .finish()
    }
}
