//! Per-page orchestration
//!
//! [`Pipeline::process`] takes one fetched page through parse, extract,
//! render and normalize, and reports exactly one terminal record: an
//! [`ErrorRecord`] for the first failing stage, or an [`ArtifactRecord`]
//! naming the storage key of the produced document. A failure never yields a
//! partial document.
//!
//! The pipeline holds no mutable state, so one instance can be shared by
//! every worker thread of a crawl.
//!
//! ```
//! use chrono::Utc;
//! use rag_markdown_normalizer::config::{ExtractParam, NormalizeParam};
//! use rag_markdown_normalizer::pipeline::{PageInput, Pipeline};
//!
//! let html = "<html><body><nav><a href=\"/\">Home</a></nav><main>\
//!     <h1>Routing</h1><p>Requests are matched against the route table in order.</p>\
//!     </main></body></html>";
//! let page = PageInput::new("https://example.com/docs/guide/routing", html);
//! let param = NormalizeParam::new(Utc::now()).with_allowed_path_prefixes(["/docs"]);
//!
//! let pipeline = Pipeline::new(ExtractParam::default()).unwrap();
//! let doc = pipeline.process(&page, &param).unwrap();
//! assert_eq!(doc.frontmatter().section(), "guide");
//! assert!(doc.content_str().starts_with("# Routing\n"));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::config::{ConfigError, ExtractParam, NormalizeParam, PipelineConfig};
use crate::error::ClassifiedError;
use crate::extract::ContentExtractor;
use crate::frontmatter::NormalizedMarkdownDoc;
use crate::normalize::Normalizer;
use crate::parser::parse_html_with_charset;
use crate::render::{HtmlToMarkdown, MarkdownRenderer};
use crate::report::{ArtifactRecord, Attributes, ErrorRecord, ObservabilitySink, TracingSink};

/// Artifact kind reported for normalized documents
pub const ARTIFACT_KIND: &str = "markdown";

/// One fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInput {
    pub source_url: String,
    pub html: Vec<u8>,
    /// Raw `Content-Type` header, used for charset detection
    pub content_type: Option<String>,
}

impl PageInput {
    pub fn new(source_url: impl Into<String>, html: impl Into<Vec<u8>>) -> Self {
        Self {
            source_url: source_url.into(),
            html: html.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Pipeline stage, reported as the record action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Parse,
    Extract,
    Render,
    Normalize,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Stage::Parse => "parse",
            Stage::Extract => "extract",
            Stage::Render => "render",
            Stage::Normalize => "normalize",
        }
    }
}

/// HTML page to normalized Markdown document
pub struct Pipeline {
    extractor: ContentExtractor,
    renderer: Box<dyn MarkdownRenderer>,
    normalizer: Normalizer,
    sink: Arc<dyn ObservabilitySink>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("extractor", &self.extractor)
            .field("normalizer", &self.normalizer)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Pipeline with the reference renderer and a [`TracingSink`]
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `param` fails validation.
    pub fn new(param: ExtractParam) -> Result<Self, ConfigError> {
        Ok(Self {
            extractor: ContentExtractor::new(param)?,
            renderer: Box::new(HtmlToMarkdown::new()),
            normalizer: Normalizer::new(),
            sink: Arc::new(TracingSink),
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::new(config.extract.clone())
    }

    pub fn with_renderer(mut self, renderer: Box<dyn MarkdownRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ObservabilitySink>) -> Self {
        self.sink = sink;
        self
    }

    /// Process one page and report its outcome
    ///
    /// # Errors
    ///
    /// The [`ClassifiedError`] of the first failing stage, unchanged.
    pub fn process(
        &self,
        page: &PageInput,
        param: &NormalizeParam,
    ) -> Result<NormalizedMarkdownDoc, ClassifiedError> {
        let mut attributes: Attributes = vec![("source_url".to_string(), page.source_url.clone())];

        match self.run(page, param) {
            Ok(doc) => {
                let write_path = doc.storage_key();
                attributes.push(("write_path".to_string(), write_path.clone()));
                tracing::info!(
                    source_url = %page.source_url,
                    write_path = %write_path,
                    content_bytes = doc.content().len(),
                    "page normalized"
                );
                self.sink
                    .record_artifact(&ArtifactRecord::new(ARTIFACT_KIND, write_path, attributes));
                Ok(doc)
            }
            Err((stage, error)) => {
                self.sink
                    .record_error(&ErrorRecord::from_error(&error, stage.as_str(), attributes));
                Err(error)
            }
        }
    }

    fn run(
        &self,
        page: &PageInput,
        param: &NormalizeParam,
    ) -> Result<NormalizedMarkdownDoc, (Stage, ClassifiedError)> {
        let document = parse_html_with_charset(&page.html, page.content_type.as_deref())
            .map_err(|e| (Stage::Parse, e))?;
        let extracted = self
            .extractor
            .extract(&document)
            .map_err(|e| (Stage::Extract, e))?;
        let markdown = self
            .renderer
            .render(&extracted)
            .map_err(|e| (Stage::Render, e))?;
        self.normalizer
            .normalize(&page.source_url, markdown.as_bytes(), param)
            .map_err(|e| (Stage::Normalize, e))
    }
}
