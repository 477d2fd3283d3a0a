//! Content isolation tests
//!
//! Exercises the three extraction layers end to end through the public API:
//! layer priority, chrome-only pages, idempotence and the body bias.

use rag_markdown_normalizer::config::ExtractParam;
use rag_markdown_normalizer::extract::{ContentExtractor, Layer};
use rag_markdown_normalizer::parser::parse_html;
use rag_markdown_normalizer::render::{HtmlToMarkdown, MarkdownRenderer};
use rag_markdown_normalizer::Cause;

const PARAGRAPH: &str =
    "Configuration files are read from the project root before any command runs.";

fn extractor() -> ContentExtractor {
    ContentExtractor::new(ExtractParam::default()).expect("default parameters are valid")
}

/// Test that `<main>` wins over a template container and a denser div
#[test]
fn test_semantic_layer_has_priority() {
    let html = format!(
        "<html><body>\
         <div class=\"markdown-body\"><p>{PARAGRAPH}</p><p>{PARAGRAPH}</p></div>\
         <div><p>{PARAGRAPH}</p><p>{PARAGRAPH}</p><p>{PARAGRAPH}</p></div>\
         <main id=\"primary\"><h1>Config</h1><p>{PARAGRAPH}</p></main>\
         </body></html>"
    );
    let doc = parse_html(html.as_bytes()).expect("Failed to parse HTML");
    let result = extractor().extract(&doc).expect("Failed to extract");

    assert_eq!(result.layer(), Layer::Semantic);
    assert_eq!(result.document().attr(result.content(), "id"), Some("primary"));
}

/// Test that a too-small `<main>` falls through to the template layer
#[test]
fn test_unmeaningful_main_falls_through() {
    let html = format!(
        "<html><body><main><p>Loading</p></main>\
         <div class=\"rst-content\"><h1>Config</h1><p>{PARAGRAPH}</p></div></body></html>"
    );
    let doc = parse_html(html.as_bytes()).expect("Failed to parse HTML");
    let result = extractor().extract(&doc).expect("Failed to extract");

    assert_eq!(result.layer(), Layer::KnownTemplate);
    assert!(result.content_html().starts_with("<div class=\"rst-content\">"));
}

/// Test that custom selectors are tried after the curated ones
#[test]
fn test_custom_selector() {
    let param = ExtractParam {
        custom_selectors: vec!["section.guide-body".to_string()],
        ..ExtractParam::default()
    };
    let html = format!(
        "<html><body><section class=\"guide-body\"><p>{PARAGRAPH}</p></section></body></html>"
    );
    let doc = parse_html(html.as_bytes()).expect("Failed to parse HTML");
    let result = ContentExtractor::new(param)
        .expect("valid selector")
        .extract(&doc)
        .expect("Failed to extract");

    assert_eq!(result.layer(), Layer::KnownTemplate);
    assert_eq!(result.document().tag_name(result.content()), Some("section"));
}

/// Test that an invalid custom selector is a configuration error
#[test]
fn test_invalid_custom_selector_rejected() {
    let param = ExtractParam {
        custom_selectors: vec!["div > ".to_string()],
        ..ExtractParam::default()
    };
    assert!(ContentExtractor::new(param).is_err());
}

/// Test that child combinators, selector lists and pseudo-classes are accepted
#[test]
fn test_custom_selector_full_css_syntax() {
    let html = format!(
        "<html><body>\
         <div class=\"draft\"><h1>Draft</h1><p>{PARAGRAPH}</p></div>\
         <div class=\"shell\"><div class=\"guide\"><h1>Guide</h1><p>{PARAGRAPH}</p></div></div>\
         </body></html>"
    );
    let doc = parse_html(html.as_bytes()).expect("Failed to parse HTML");

    for selector in ["div.shell > .guide", "aside, div.shell > div", "div:not(.draft):not(.shell)"] {
        let param = ExtractParam {
            custom_selectors: vec![selector.to_string()],
            ..ExtractParam::default()
        };
        let result = ContentExtractor::new(param)
            .expect("valid selector")
            .extract(&doc)
            .expect("Failed to extract");
        assert_eq!(result.layer(), Layer::KnownTemplate, "{selector}");
        assert_eq!(result.document().attr(result.content(), "class"), Some("guide"), "{selector}");
    }

    for selector in ["main, article", "#content:not(.x)"] {
        let param = ExtractParam {
            custom_selectors: vec![selector.to_string()],
            ..ExtractParam::default()
        };
        assert!(ContentExtractor::new(param).is_ok(), "{selector}");
    }
}

/// Test that a page made only of chrome yields NoContent
#[test]
fn test_navigation_only_page_has_no_content() {
    let links: String = (0..30)
        .map(|i| format!("<li><a href=\"/page/{i}\">Documentation page number {i}</a></li>"))
        .collect();
    let html = format!(
        "<html><body><nav><ul>{links}</ul></nav><footer><p>{PARAGRAPH}</p></footer></body></html>"
    );
    let doc = parse_html(html.as_bytes()).expect("Failed to parse HTML");
    let err = extractor().extract(&doc).unwrap_err();

    assert_eq!(err.cause(), Cause::NoContent);
    assert!(!err.is_retryable());
}

/// Test that density scoring strips chrome and picks the content div
#[test]
fn test_density_layer_isolates_content() {
    let html = format!(
        "<html><body>\
         <div class=\"site-header\"><a href=\"/\">Home</a><a href=\"/blog\">Blog</a></div>\
         <div id=\"doc\"><h1>Config</h1><p>{PARAGRAPH}</p><p>{PARAGRAPH}</p></div>\
         <div class=\"sidebar\"><p>{PARAGRAPH}</p></div>\
         </body></html>"
    );
    let doc = parse_html(html.as_bytes()).expect("Failed to parse HTML");
    let result = extractor().extract(&doc).expect("Failed to extract");

    assert_eq!(result.layer(), Layer::Density);
    assert_eq!(result.document().attr(result.content(), "id"), Some("doc"));
    // the caller's tree is untouched by chrome removal
    assert!(doc.elements().any(|id| doc.attr(id, "class") == Some("sidebar")));
}

/// Test that extracting twice yields identical subtrees
#[test]
fn test_extraction_is_idempotent() {
    let html = format!(
        "<html><body><div><p>{PARAGRAPH}</p></div>\
         <div><p>{PARAGRAPH}</p><ul><li>one</li><li>two</li></ul></div></body></html>"
    );
    let doc = parse_html(html.as_bytes()).expect("Failed to parse HTML");
    let extractor = extractor();

    let first = extractor.extract(&doc).expect("Failed to extract");
    let second = extractor.extract(&doc).expect("Failed to extract");
    assert_eq!(first.layer(), second.layer());
    assert_eq!(first.content_html(), second.content_html());
}

/// Test that the extracted subtree renders without chrome
#[test]
fn test_extracted_content_renders() {
    let html = format!(
        "<html><body><nav><a href=\"/\">Home</a></nav>\
         <article><h1>Config</h1><p>{PARAGRAPH}</p></article></body></html>"
    );
    let doc = parse_html(html.as_bytes()).expect("Failed to parse HTML");
    let result = extractor().extract(&doc).expect("Failed to extract");
    let markdown = HtmlToMarkdown::new()
        .render(&result)
        .expect("Failed to render");

    assert_eq!(markdown, format!("# Config\n\n{PARAGRAPH}\n"));
}
