//! Layer 2: documentation-framework containers
//!
//! A curated list of content containers used by common documentation site
//! generators (GitHub-style markdown, MkDocs, Docusaurus, Sphinx, VitePress,
//! Hugo/Jekyll themes), followed by caller-supplied selectors.

use std::borrow::Cow;

use super::{is_meaningful, ExtractionResult, ExtractionStrategy, Layer};
use crate::config::{ConfigError, ExtractParam, Meaningfulness};
use crate::dom::Document;
use crate::selector::Selector;

/// Curated container selectors, highest priority first
pub const CURATED_SELECTORS: &[&str] = &[
    ".markdown-body",
    ".md-content",
    ".theme-doc-markdown",
    ".rst-content",
    "div.document",
    "div.body",
    ".vp-doc",
    "#main-content",
    ".main-content",
    ".docs-content",
    ".documentation",
    ".page-content",
    ".post-content",
    "#content",
    ".content",
];

/// Known-template matcher
#[derive(Debug, Clone)]
pub struct KnownTemplates {
    selectors: Vec<Selector>,
    thresholds: Meaningfulness,
}

impl KnownTemplates {
    /// Merge the curated list with `param.custom_selectors`
    ///
    /// Custom selectors whose trimmed text repeats an earlier entry are
    /// dropped; order is otherwise preserved.
    pub fn new(param: &ExtractParam) -> Result<Self, ConfigError> {
        let mut selectors: Vec<Selector> = Vec::new();
        let sources = CURATED_SELECTORS
            .iter()
            .copied()
            .chain(param.custom_selectors.iter().map(String::as_str));

        for source in sources {
            let source = source.trim();
            if selectors.iter().any(|s| s.as_str() == source) {
                continue;
            }
            selectors.push(Selector::parse(source)?);
        }

        Ok(Self {
            selectors,
            thresholds: param.meaningfulness(),
        })
    }

    /// Selectors in the order they are tried
    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.selectors.iter().map(Selector::as_str)
    }
}

impl ExtractionStrategy for KnownTemplates {
    fn layer(&self) -> Layer {
        Layer::KnownTemplate
    }

    fn try_extract<'a>(&self, doc: &'a Document) -> Option<ExtractionResult<'a>> {
        for selector in &self.selectors {
            if let Some(id) = selector
                .select_all(doc)
                .find(|id| is_meaningful(doc, *id, &self.thresholds))
            {
                tracing::trace!(selector = %selector, "template selector matched");
                return Some(ExtractionResult::new(
                    Cow::Borrowed(doc),
                    id,
                    Layer::KnownTemplate,
                ));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_html;

    const TEXT: &str = "A paragraph long enough to be considered real documentation content.";

    fn layer(custom: &[&str]) -> KnownTemplates {
        let param = ExtractParam {
            custom_selectors: custom.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        KnownTemplates::new(&param).unwrap()
    }

    fn found_id(layer: &KnownTemplates, body: &str) -> Option<String> {
        let html = format!("<html><body>{body}</body></html>");
        let doc = parse_html(html.as_bytes()).unwrap();
        layer
            .try_extract(&doc)
            .and_then(|r| r.document().attr(r.content(), "id").map(str::to_string))
    }

    #[test]
    fn test_curated_selectors_all_parse() {
        assert_eq!(layer(&[]).selectors().count(), CURATED_SELECTORS.len());
    }

    #[test]
    fn test_custom_selectors_are_deduplicated_after_curated() {
        let layer = layer(&[" .content ", "#docs", "#docs", ".markdown-body"]);
        let selectors: Vec<&str> = layer.selectors().collect();
        assert_eq!(selectors.len(), CURATED_SELECTORS.len() + 1);
        assert_eq!(selectors.last(), Some(&"#docs"));
        assert_eq!(selectors[0], ".markdown-body");
    }

    #[test]
    fn test_priority_follows_selector_order_not_document_order() {
        let body = format!(
            "<div id=\"generic\" class=\"content\"><p>{TEXT}</p></div>\
             <div id=\"gh\" class=\"markdown-body\"><p>{TEXT}</p></div>"
        );
        assert_eq!(found_id(&layer(&[]), &body).as_deref(), Some("gh"));
    }

    #[test]
    fn test_later_matches_of_a_selector_are_tried() {
        let body = format!(
            "<div id=\"a\" class=\"content\"><p>tiny</p></div>\
             <div id=\"b\" class=\"content\"><p>{TEXT}</p></div>"
        );
        assert_eq!(found_id(&layer(&[]), &body).as_deref(), Some("b"));
    }

    #[test]
    fn test_custom_selector_used_after_curated() {
        let body = format!("<div id=\"x\" data-docs=\"body\"><p>{TEXT}</p></div>");
        assert_eq!(found_id(&layer(&[]), &body), None);
        assert_eq!(
            found_id(&layer(&["[data-docs=body]"]), &body).as_deref(),
            Some("x")
        );
    }

    #[test]
    fn test_invalid_custom_selector_rejected() {
        let param = ExtractParam {
            custom_selectors: vec!["main:first-child(".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            KnownTemplates::new(&param),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }
}
