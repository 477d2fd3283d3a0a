//! Provenance frontmatter and the normalized document artifact
//!
//! A [`Frontmatter`] is only ever built whole, by the normalizer, after the
//! body passed structural validation; there is no way to observe one with a
//! field missing. [`NormalizedMarkdownDoc::to_markdown`] renders the on-disk
//! shape: a YAML block with double-quoted scalars in a fixed field order,
//! followed by the body.

use std::borrow::Cow;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::error::{Cause, ClassifiedError};

/// Provenance metadata of a normalized document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frontmatter {
    title: String,
    source_url: String,
    canonical_url: String,
    crawl_depth: u32,
    section: String,
    doc_id: String,
    content_hash: String,
    fetched_at: DateTime<Utc>,
    crawler_version: String,
}

/// Field values for [`Frontmatter`], assembled by the normalizer
pub(crate) struct FrontmatterFields {
    pub title: String,
    pub source_url: String,
    pub canonical_url: String,
    pub crawl_depth: u32,
    pub section: String,
    pub doc_id: String,
    pub content_hash: String,
    pub fetched_at: DateTime<Utc>,
    pub crawler_version: String,
}

impl Frontmatter {
    pub(crate) fn new(fields: FrontmatterFields) -> Self {
        Self {
            title: fields.title,
            source_url: fields.source_url,
            canonical_url: fields.canonical_url,
            crawl_depth: fields.crawl_depth,
            section: fields.section,
            doc_id: fields.doc_id,
            content_hash: fields.content_hash,
            fetched_at: fields.fetched_at,
            crawler_version: fields.crawler_version,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn canonical_url(&self) -> &str {
        &self.canonical_url
    }

    pub fn crawl_depth(&self) -> u32 {
        self.crawl_depth
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    /// `algorithm:hexdigest` of the canonical URL
    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    /// `algorithm:hexdigest` of the Markdown body bytes
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn crawler_version(&self) -> &str {
        &self.crawler_version
    }

    /// Render as a `---` delimited YAML block, trailing blank line included
    pub fn to_yaml(&self) -> String {
        let mut output = String::from("---\n");
        let fetched_at = self.fetched_at.to_rfc3339_opts(SecondsFormat::Secs, true);

        write_yaml_field(&mut output, "title", &self.title);
        write_yaml_field(&mut output, "source_url", &self.source_url);
        write_yaml_field(&mut output, "canonical_url", &self.canonical_url);
        output.push_str(&format!("crawl_depth: {}\n", self.crawl_depth));
        write_yaml_field(&mut output, "section", &self.section);
        write_yaml_field(&mut output, "doc_id", &self.doc_id);
        write_yaml_field(&mut output, "content_hash", &self.content_hash);
        write_yaml_field(&mut output, "fetched_at", &fetched_at);
        write_yaml_field(&mut output, "crawler_version", &self.crawler_version);

        output.push_str("---\n\n");
        output
    }
}

fn write_yaml_field(output: &mut String, key: &str, value: &str) {
    output.push_str(key);
    output.push_str(": ");
    write_yaml_string(output, value);
    output.push('\n');
}

/// Double-quoted YAML scalar
fn write_yaml_string(output: &mut String, value: &str) {
    output.push('"');
    for ch in value.chars() {
        match ch {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            c if c.is_control() => output.push_str(&format!("\\u{:04X}", c as u32)),
            c => output.push(c),
        }
    }
    output.push('"');
}

/// Validated Markdown body with its frontmatter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMarkdownDoc {
    frontmatter: Frontmatter,
    content: Vec<u8>,
}

impl NormalizedMarkdownDoc {
    pub(crate) fn new(frontmatter: Frontmatter, content: Vec<u8>) -> Self {
        Self {
            frontmatter,
            content,
        }
    }

    pub fn frontmatter(&self) -> &Frontmatter {
        &self.frontmatter
    }

    /// Body bytes exactly as hashed into `content_hash`
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn content_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    /// Frontmatter block followed by the body
    pub fn to_markdown(&self) -> String {
        let mut output = self.frontmatter.to_yaml();
        output.push_str(&self.content_str());
        output
    }

    /// Suggested relative storage path: `<section>/<docID digest>.md`
    pub fn storage_key(&self) -> String {
        let doc_id = self.frontmatter.doc_id();
        let digest = doc_id
            .split_once(':')
            .map_or(doc_id, |(_, digest)| digest);
        format!("{}/{}.md", self.frontmatter.section(), digest)
    }
}

/// Derive the section from a canonical URL path
///
/// The first prefix (a leading `/` is added when missing) that is a literal
/// prefix of `path` is stripped; the first non-empty segment of what remains
/// is the section. Without a matching prefix the whole path is used.
///
/// # Errors
///
/// `SectionDerivationFailed` for the root path or when nothing remains after
/// stripping.
pub fn derive_section<S: AsRef<str>>(path: &str, prefixes: &[S]) -> Result<String, ClassifiedError> {
    if path.is_empty() || path == "/" {
        return Err(ClassifiedError::new(
            Cause::SectionDerivationFailed,
            "cannot derive a section from the root path",
        ));
    }

    let mut remainder = path;
    for prefix in prefixes {
        let prefix = prefix.as_ref();
        let prefix: Cow<'_, str> = if prefix.starts_with('/') {
            Cow::Borrowed(prefix)
        } else {
            Cow::Owned(format!("/{prefix}"))
        };
        if let Some(rest) = path.strip_prefix(&*prefix) {
            remainder = rest;
            break;
        }
    }

    remainder
        .split('/')
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            ClassifiedError::new(
                Cause::SectionDerivationFailed,
                format!("path '{path}' has no segment after its allowed prefix"),
            )
        })
}
