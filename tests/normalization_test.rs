//! Structural normalization tests
//!
//! Each structural rule is checked through [`Normalizer::normalize`], together
//! with section derivation and the content-addressed identifiers.

use chrono::{TimeZone, Utc};
use rag_markdown_normalizer::config::NormalizeParam;
use rag_markdown_normalizer::hash::{content_address, DigestHasher, HashAlgorithm, HashProvider};
use rag_markdown_normalizer::normalize::Normalizer;
use rag_markdown_normalizer::{Cause, ClassifiedError, NormalizedMarkdownDoc};

fn param() -> NormalizeParam {
    NormalizeParam::new(Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap())
        .with_allowed_path_prefixes(["/docs"])
}

fn normalize(markdown: &str) -> Result<NormalizedMarkdownDoc, ClassifiedError> {
    Normalizer::new().normalize("https://x.com/docs/api/login", markdown.as_bytes(), &param())
}

fn cause_of(markdown: &str) -> Cause {
    normalize(markdown)
        .expect_err("markdown should be rejected")
        .cause()
}

/// Test that a minimal valid document keeps its body byte for byte
#[test]
fn test_minimal_document() {
    let markdown = "# Title\n\nBody text.\n";
    let doc = normalize(markdown).expect("Failed to normalize");

    assert_eq!(doc.frontmatter().title(), "Title");
    assert_eq!(doc.content(), markdown.as_bytes());
    assert!(doc.to_markdown().ends_with(markdown));
    assert!(doc.to_markdown().starts_with("---\ntitle: \"Title\"\n"));
}

/// Test that empty and whitespace-only bodies are rejected
#[test]
fn test_empty_content() {
    assert_eq!(cause_of(""), Cause::EmptyContent);
    assert_eq!(cause_of(" \n\t\n"), Cause::EmptyContent);
}

/// Test the single-H1 rule
#[test]
fn test_h1_invariant() {
    assert_eq!(cause_of("## Only a subheading\n\ntext\n"), Cause::BrokenH1Invariant);
    assert_eq!(cause_of("# One\n\ntext\n\n# Two\n\ntext\n"), Cause::BrokenH1Invariant);
    // Setext headings count as H1 as well
    assert_eq!(cause_of("# One\n\ntext\n\nTwo\n===\n\ntext\n"), Cause::BrokenH1Invariant);
}

/// Test that heading depth may only increase one level at a time
#[test]
fn test_skipped_heading_levels() {
    assert_eq!(cause_of("# T\n\na\n\n### Deep\n\nb\n"), Cause::SkippedHeadingLevels);
    assert!(normalize("# T\n\na\n\n## B\n\nb\n\n### C\n\nc\n\n## D\n\nd\n").is_ok());
}

/// Test that content before the first heading is orphaned
#[test]
fn test_orphan_content() {
    assert_eq!(cause_of("Preface.\n\n# Title\n\nBody\n"), Cause::OrphanContent);
    assert_eq!(cause_of("- item\n\n# Title\n\nBody\n"), Cause::OrphanContent);
}

/// Test that a heading without content before its next sibling is empty
#[test]
fn test_empty_section() {
    assert_eq!(cause_of("# Title\n\nintro\n\n## Empty\n\n## Full\n\ntext\n"), Cause::EmptySection);
    assert_eq!(cause_of("# Title\n\nintro\n\n## Trailing\n"), Cause::EmptySection);
    // a parent owns the content of its subsections
    assert!(normalize("# Title\n\n## Parent\n\n### Child\n\ntext\n").is_ok());
}

/// Test that an unclosed fence swallowing headings breaks the atomic block
#[test]
fn test_broken_atomic_block() {
    assert_eq!(
        cause_of("# Title\n\nintro\n\n```bash\necho hi\n\n## Next\n\ntext\n"),
        Cause::BrokenAtomicBlock
    );
    let doc = normalize("# Title\n\n```python\n# a comment, not a heading\nx = 1\n```\n")
        .expect("closed fences may contain hash lines");
    assert_eq!(doc.frontmatter().title(), "Title");
}

/// Test that every structural rejection is non-retryable
#[test]
fn test_structural_failures_are_not_retryable() {
    for markdown in ["", "text\n", "# A\n\n#### B\n\nc\n", "# A\n\n## B\n"] {
        let err = normalize(markdown).expect_err("markdown should be rejected");
        assert!(!err.is_retryable(), "{markdown:?} produced {err}");
    }
}

/// Test section derivation after the allowed prefix
#[test]
fn test_section_from_canonical_path() {
    let doc = Normalizer::new()
        .normalize(
            "https://Docs.Example.com/docs/api/v1/users?page=2#list",
            b"# Users\n\nList users.\n",
            &param(),
        )
        .expect("Failed to normalize");

    assert_eq!(doc.frontmatter().section(), "api");
    assert_eq!(
        doc.frontmatter().canonical_url(),
        "https://docs.example.com/docs/api/v1/users"
    );
    assert!(doc.storage_key().starts_with("api/"));
}

/// Test that a root URL has no section
#[test]
fn test_root_url_has_no_section() {
    let err = Normalizer::new()
        .normalize("https://x.com/", b"# Home\n\nWelcome.\n", &param())
        .expect_err("root path has no section");
    assert_eq!(err.cause(), Cause::SectionDerivationFailed);
}

/// Test the identifiers against a known SHA-256 vector
#[test]
fn test_content_addressed_identifiers() {
    assert_eq!(
        content_address(&DigestHasher, HashAlgorithm::Sha256, b"abc").expect("sha256"),
        "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );

    let markdown = b"# Title\n\nBody text.\n";
    let doc = Normalizer::new()
        .normalize("https://x.com/docs/api/login?utm=1", markdown, &param())
        .expect("Failed to normalize");
    let expected_doc_id = DigestHasher
        .hash(b"https://x.com/docs/api/login", HashAlgorithm::Sha256)
        .expect("sha256");
    let expected_content = DigestHasher
        .hash(markdown, HashAlgorithm::Sha256)
        .expect("sha256");

    assert_eq!(doc.frontmatter().doc_id(), format!("sha256:{expected_doc_id}"));
    assert_eq!(
        doc.frontmatter().content_hash(),
        format!("sha256:{expected_content}")
    );
    assert_eq!(doc.storage_key(), format!("api/{expected_doc_id}.md"));
}

/// Test that identical inputs always produce identical documents
#[test]
fn test_normalization_is_deterministic() {
    let markdown = "# Title\n\nintro\n\n## Usage\n\n```sh\nrun\n```\n";
    let first = normalize(markdown).expect("Failed to normalize");
    let second = normalize(markdown).expect("Failed to normalize");
    assert_eq!(first, second);
    assert_eq!(first.to_markdown(), second.to_markdown());
}
