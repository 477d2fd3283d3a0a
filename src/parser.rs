//! HTML parsing and document validation
//!
//! Raw page bytes are decoded to UTF-8 and parsed with html5ever through
//! `scraper` (the WHATWG parsing algorithm, so malformed markup is repaired
//! the way browsers repair it) into a [`Document`].
//!
//! # Charset Detection
//!
//! The byte encoding is resolved with a three-level cascade:
//!
//! 1. `charset` parameter of the Content-Type header, when supplied
//! 2. `<meta charset>` or `<meta http-equiv="Content-Type">` in the first 1024 bytes
//! 3. UTF-8
//!
//! # Validation
//!
//! A document is accepted only if a depth-first search finds an `html`
//! element. Empty input, bytes invalid for the detected charset, unknown
//! charsets and documents without `<html>` are all rejected with a
//! non-retryable `NotHtml` error; no partial tree is ever returned.
//!
//! ```rust
//! use rag_markdown_normalizer::parser::parse_html;
//!
//! let doc = parse_html(b"<html><body><h1>Hello</h1></body></html>").unwrap();
//! assert!(doc.find_element("h1").is_some());
//! ```

use std::borrow::Cow;
use std::sync::OnceLock;

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use scraper::Html;

use crate::dom::Document;
use crate::error::ClassifiedError;

/// Maximum bytes scanned for meta charset declarations
const META_SCAN_LIMIT: usize = 1024;

/// Parse HTML bytes, honouring an optional Content-Type header
///
/// # Errors
///
/// Returns a `NotHtml` [`ClassifiedError`] when the input is empty, cannot be
/// decoded, or contains no `<html>` element.
pub fn parse_html_with_charset(
    html: &[u8],
    content_type: Option<&str>,
) -> Result<Document, ClassifiedError> {
    if html.is_empty() {
        return Err(ClassifiedError::not_html("HTML input is empty"));
    }

    let encoding = detect_encoding(content_type, html)?;
    let text = decode(html, encoding)?;

    let document = Document::from(Html::parse_document(&text));

    if document.find_element("html").is_none() {
        return Err(ClassifiedError::not_html(
            "document has no <html> root element",
        ));
    }

    tracing::debug!(
        encoding = encoding.name(),
        input_bytes = html.len(),
        "parsed HTML document"
    );
    Ok(document)
}

/// Parse HTML bytes using meta tags or the UTF-8 default for decoding
pub fn parse_html(html: &[u8]) -> Result<Document, ClassifiedError> {
    parse_html_with_charset(html, None)
}

/// Resolve the input encoding via the header → meta → UTF-8 cascade
pub fn detect_encoding(
    content_type: Option<&str>,
    html: &[u8],
) -> Result<&'static Encoding, ClassifiedError> {
    let label = content_type
        .and_then(charset_from_content_type)
        .or_else(|| charset_from_meta(html));

    match label {
        Some(label) => Encoding::for_label(label.as_bytes()).ok_or_else(|| {
            ClassifiedError::not_html(format!("unsupported charset '{label}'"))
        }),
        None => Ok(UTF_8),
    }
}

fn decode<'a>(
    html: &'a [u8],
    encoding: &'static Encoding,
) -> Result<Cow<'a, str>, ClassifiedError> {
    if encoding == UTF_8 {
        return std::str::from_utf8(html).map(Cow::Borrowed).map_err(|e| {
            ClassifiedError::not_html(format!(
                "invalid UTF-8 at byte position {}",
                e.valid_up_to()
            ))
        });
    }

    encoding
        .decode_without_bom_handling_and_without_replacement(html)
        .ok_or_else(|| {
            ClassifiedError::not_html(format!(
                "invalid byte sequence for charset '{}'",
                encoding.name()
            ))
        })
}

/// `charset` parameter of a Content-Type header value
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    static CHARSET: OnceLock<Option<Regex>> = OnceLock::new();
    let regex = CHARSET
        .get_or_init(|| Regex::new(r#"(?i)charset\s*=\s*"?([^";,\s]+)"?"#).ok())
        .as_ref()?;

    regex
        .captures(content_type)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Charset declared by a meta tag near the start of the document
pub fn charset_from_meta(html: &[u8]) -> Option<String> {
    static META: OnceLock<Option<Regex>> = OnceLock::new();
    let regex = META
        .get_or_init(|| {
            Regex::new(
                r#"(?i)<meta\s+(?:charset\s*=\s*"?([^";>\s]+)|http-equiv\s*=\s*"?Content-Type"?\s+content\s*=\s*"?[^">]*charset\s*=\s*([^";>\s]+))"#,
            )
            .ok()
        })
        .as_ref()?;

    let prefix = String::from_utf8_lossy(&html[..html.len().min(META_SCAN_LIMIT)]);
    let caps = regex.captures(&prefix)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}
