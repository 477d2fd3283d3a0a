//! Structural normalization
//!
//! Turns a rendered Markdown body into a [`NormalizedMarkdownDoc`]: the body
//! is validated first, then each frontmatter field is derived in turn. Every
//! step has its own failure cause and nothing is returned unless all of them
//! succeed.
//!
//! ```
//! use chrono::Utc;
//! use rag_markdown_normalizer::config::NormalizeParam;
//! use rag_markdown_normalizer::normalize::Normalizer;
//!
//! let param = NormalizeParam::new(Utc::now()).with_allowed_path_prefixes(["/docs"]);
//! let doc = Normalizer::new()
//!     .normalize(
//!         "https://Example.com/docs/cli/install?ref=nav",
//!         b"# Install\n\nRun the installer.\n",
//!         &param,
//!     )
//!     .unwrap();
//!
//! let frontmatter = doc.frontmatter();
//! assert_eq!(frontmatter.title(), "Install");
//! assert_eq!(frontmatter.section(), "cli");
//! assert_eq!(frontmatter.canonical_url(), "https://example.com/docs/cli/install");
//! assert!(frontmatter.doc_id().starts_with("sha256:"));
//! ```

use std::fmt;

use crate::canonical::{StandardCanonicalizer, UrlCanonicalizer};
use crate::config::NormalizeParam;
use crate::error::{Cause, ClassifiedError};
use crate::frontmatter::{derive_section, Frontmatter, FrontmatterFields, NormalizedMarkdownDoc};
use crate::hash::{content_address, DigestHasher, HashProvider};
use crate::validate::validate;

/// Validates Markdown bodies and derives their frontmatter
pub struct Normalizer {
    canonicalizer: Box<dyn UrlCanonicalizer>,
    hasher: Box<dyn HashProvider>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalizer").finish_non_exhaustive()
    }
}

impl Normalizer {
    /// Normalizer using [`StandardCanonicalizer`] and [`DigestHasher`]
    pub fn new() -> Self {
        Self::with_collaborators(Box::new(StandardCanonicalizer), Box::new(DigestHasher))
    }

    pub fn with_collaborators(
        canonicalizer: Box<dyn UrlCanonicalizer>,
        hasher: Box<dyn HashProvider>,
    ) -> Self {
        Self {
            canonicalizer,
            hasher,
        }
    }

    /// Validate `markdown` and wrap it with frontmatter
    ///
    /// # Errors
    ///
    /// The structural violation found by validation, or the first failing
    /// derivation step: `TitleExtractionFailed`, `CanonicalizationFailed`,
    /// `SectionDerivationFailed` or `HashComputationFailed`.
    pub fn normalize(
        &self,
        source_url: &str,
        markdown: &[u8],
        param: &NormalizeParam,
    ) -> Result<NormalizedMarkdownDoc, ClassifiedError> {
        let outline = validate(markdown)?;

        let title = outline.title().trim().to_string();
        if title.is_empty() {
            return Err(ClassifiedError::new(
                Cause::TitleExtractionFailed,
                "H1 heading has no text",
            ));
        }

        let canonical = self
            .canonicalizer
            .canonicalize(source_url)
            .map_err(|e| ClassifiedError::new(Cause::CanonicalizationFailed, e.to_string()))?;

        let section = derive_section(canonical.path(), &param.allowed_path_prefixes)?;

        let algorithm = param.hash_algorithm;
        let doc_id = content_address(self.hasher.as_ref(), algorithm, canonical.as_str().as_bytes())
            .map_err(|e| ClassifiedError::new(Cause::HashComputationFailed, e.to_string()))?;
        let content_hash = content_address(self.hasher.as_ref(), algorithm, markdown)
            .map_err(|e| ClassifiedError::new(Cause::HashComputationFailed, e.to_string()))?;

        tracing::debug!(
            source_url,
            section = %section,
            doc_id = %doc_id,
            "frontmatter derived"
        );

        let frontmatter = Frontmatter::new(FrontmatterFields {
            title,
            source_url: source_url.to_string(),
            canonical_url: canonical.to_string(),
            crawl_depth: param.crawl_depth,
            section,
            doc_id,
            content_hash,
            fetched_at: param.fetched_at,
            crawler_version: param.crawler_version.clone(),
        });
        Ok(NormalizedMarkdownDoc::new(frontmatter, markdown.to_vec()))
    }
}
