//! Classified errors for extraction and normalization
//!
//! Every failure raised by this crate is a [`ClassifiedError`]: a cause tag
//! from a fixed taxonomy, a human-readable message and a retryable flag.
//! Severity is derived from the flag alone, so callers never need to match on
//! the cause to decide how loudly to report a failure.
//!
//! Content-shape and input-shape failures are deterministic: parsing the same
//! bytes again produces the same outcome. Every constructor in this module
//! therefore produces a non-retryable error; [`ClassifiedError::retryable`]
//! exists for collaborators (custom hash providers, renderers) that wrap
//! transient failures.

use std::fmt;

use thiserror::Error;

/// Canonical failure taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Cause {
    /// Input failed to decode/parse or has no `<html>` element
    NotHtml,
    /// No extraction layer found a meaningful content container
    NoContent,
    /// Markdown body is empty or whitespace-only
    EmptyContent,
    /// Zero or more than one level-1 heading
    BrokenH1Invariant,
    /// Heading depth increased by more than one level
    SkippedHeadingLevels,
    /// Content appeared before the first heading
    OrphanContent,
    /// A heading owns no content before its section ends
    EmptySection,
    /// A heading was swallowed by (or seen inside) a fenced code block
    BrokenAtomicBlock,
    /// No section could be derived from the canonical URL path
    SectionDerivationFailed,
    /// The H1 heading carries no usable text
    TitleExtractionFailed,
    /// The hash provider failed
    HashComputationFailed,
    /// The URL canonicalizer rejected the source URL
    CanonicalizationFailed,
    /// The Markdown renderer rejected the content subtree
    RenderFailed,
}

impl Cause {
    /// Canonical snake_case name used by observability sinks
    pub fn as_str(&self) -> &'static str {
        match self {
            Cause::NotHtml => "not_html",
            Cause::NoContent => "no_content",
            Cause::EmptyContent => "empty_content",
            Cause::BrokenH1Invariant => "broken_h1_invariant",
            Cause::SkippedHeadingLevels => "skipped_heading_levels",
            Cause::OrphanContent => "orphan_content",
            Cause::EmptySection => "empty_section",
            Cause::BrokenAtomicBlock => "broken_atomic_block",
            Cause::SectionDerivationFailed => "section_derivation_failed",
            Cause::TitleExtractionFailed => "title_extraction_failed",
            Cause::HashComputationFailed => "hash_computation_failed",
            Cause::CanonicalizationFailed => "canonicalization_failed",
            Cause::RenderFailed => "render_failed",
        }
    }

    /// Component that detects this cause
    pub fn component(&self) -> Component {
        match self {
            Cause::NotHtml => Component::Parser,
            Cause::NoContent => Component::Extractor,
            Cause::RenderFailed => Component::Renderer,
            Cause::EmptyContent
            | Cause::BrokenH1Invariant
            | Cause::SkippedHeadingLevels
            | Cause::OrphanContent
            | Cause::EmptySection
            | Cause::BrokenAtomicBlock => Component::Validator,
            Cause::SectionDerivationFailed
            | Cause::TitleExtractionFailed
            | Cause::HashComputationFailed
            | Cause::CanonicalizationFailed => Component::Frontmatter,
        }
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline component that raised an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Parser,
    Extractor,
    Renderer,
    Validator,
    Frontmatter,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Parser => "parser",
            Component::Extractor => "extractor",
            Component::Renderer => "renderer",
            Component::Validator => "validator",
            Component::Frontmatter => "frontmatter",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reporting severity, derived from the retryable flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Transient; the page may succeed on a later attempt
    Error,
    /// Terminal; the page is dropped
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }
}

/// A failure tagged with its cause and retry policy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{cause}: {message}")]
pub struct ClassifiedError {
    cause: Cause,
    message: String,
    retryable: bool,
}

impl ClassifiedError {
    /// Create a non-retryable error
    pub fn new(cause: Cause, message: impl Into<String>) -> Self {
        Self {
            cause,
            message: message.into(),
            retryable: false,
        }
    }

    /// Create a retryable error
    pub fn retryable(cause: Cause, message: impl Into<String>) -> Self {
        Self {
            cause,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn cause(&self) -> Cause {
        self.cause
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    pub fn severity(&self) -> Severity {
        if self.retryable {
            Severity::Error
        } else {
            Severity::Fatal
        }
    }

    pub fn component(&self) -> Component {
        self.cause.component()
    }

    pub(crate) fn not_html(message: impl Into<String>) -> Self {
        Self::new(Cause::NotHtml, message)
    }

    pub(crate) fn no_content() -> Self {
        Self::new(Cause::NoContent, "no meaningful content container found")
    }
}
