//! RAG Markdown Normalizer
//!
//! Turns fetched HTML documentation pages into structurally validated
//! Markdown documents with provenance frontmatter, ready for chunking and
//! embedding.
//!
//! # Architecture
//!
//! The library is structured into several modules:
//! - `parser`: charset detection and HTML5 parsing into the arena DOM (`dom`)
//! - `extract`: three-layer content isolation (semantic containers, known
//!   documentation templates, density scoring after chrome removal)
//! - `render`: reference HTML to Markdown renderer behind a trait seam
//! - `validate`: structural rules over the Markdown AST
//! - `normalize`: frontmatter derivation (title, canonical URL, section,
//!   content-addressed identifiers) on top of validation
//! - `pipeline`: per-page orchestration with one terminal `report` record
//! - `error`: the classified failure taxonomy shared by every stage
//!
//! # Concurrency
//!
//! Every operation works on data owned by the call. Extractors, renderers,
//! normalizers and pipelines are `Send + Sync` and can be shared across
//! worker threads without locking.

pub mod canonical;
pub mod config;
pub mod dom;
pub mod error;
pub mod extract;
pub mod frontmatter;
pub mod hash;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod selector;
pub mod validate;

// Re-export main types for convenience
pub use config::{ConfigError, ExtractParam, NormalizeConfig, NormalizeParam, PipelineConfig};
pub use error::{Cause, ClassifiedError, Component, Severity};
pub use extract::{ContentExtractor, ExtractionResult, Layer};
pub use frontmatter::{Frontmatter, NormalizedMarkdownDoc};
pub use hash::HashAlgorithm;
pub use normalize::Normalizer;
pub use parser::{parse_html, parse_html_with_charset};
pub use pipeline::{PageInput, Pipeline};
pub use render::{HtmlToMarkdown, MarkdownRenderer};
pub use report::{ObservabilitySink, TracingSink};
pub use validate::{validate, DocumentOutline};
