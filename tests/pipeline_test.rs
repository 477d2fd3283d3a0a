//! Page pipeline tests
//!
//! Validates end-to-end processing, terminal reporting and that one shared
//! pipeline gives the same results from many threads as it does sequentially.

use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{TimeZone, Utc};
use rag_markdown_normalizer::config::{NormalizeParam, PipelineConfig};
use rag_markdown_normalizer::pipeline::{PageInput, Pipeline};
use rag_markdown_normalizer::report::{ArtifactRecord, ErrorRecord, NoopSink, ObservabilitySink};
use rag_markdown_normalizer::{Cause, HashAlgorithm, Severity};

#[derive(Default)]
struct RecordingSink {
    errors: Mutex<Vec<ErrorRecord>>,
    artifacts: Mutex<Vec<ArtifactRecord>>,
}

impl ObservabilitySink for RecordingSink {
    fn record_error(&self, record: &ErrorRecord) {
        self.errors.lock().unwrap().push(record.clone());
    }

    fn record_artifact(&self, record: &ArtifactRecord) {
        self.artifacts.lock().unwrap().push(record.clone());
    }
}

const CONFIG: &str = r#"
[extract]
custom_selectors = ["div.handbook"]

[normalize]
crawler_version = "docs-crawler/2.1"
hash_algorithm = "blake3"
allowed_path_prefixes = ["/docs", "/handbook"]
"#;

fn param(config: &PipelineConfig) -> NormalizeParam {
    config
        .normalize
        .for_page(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(), 1)
}

fn page(topic: &str) -> PageInput {
    let html = format!(
        "<html><head><title>{topic}</title></head><body>\
         <header><a href=\"/\">Docs home</a></header>\
         <main><h1>{topic}</h1><p>The {topic} guide explains every option available to operators.</p>\
         <h2>Example</h2><pre><code class=\"language-toml\">[{topic}]\nenabled = true\n</code></pre></main>\
         <footer>Copyright</footer></body></html>"
    );
    PageInput::new(format!("https://example.com/docs/{topic}/overview"), html)
}

/// Test a full page run against a TOML configuration
#[test]
fn test_process_with_toml_config() {
    let config = PipelineConfig::from_toml_str(CONFIG).expect("Failed to load config");
    let sink = Arc::new(RecordingSink::default());
    let pipeline = Pipeline::from_config(&config)
        .expect("Failed to build pipeline")
        .with_sink(sink.clone());

    let doc = pipeline
        .process(&page("caching"), &param(&config))
        .expect("Failed to process page");

    let frontmatter = doc.frontmatter();
    assert_eq!(frontmatter.title(), "caching");
    assert_eq!(frontmatter.section(), "caching");
    assert_eq!(frontmatter.crawl_depth(), 1);
    assert_eq!(frontmatter.crawler_version(), "docs-crawler/2.1");
    assert!(frontmatter.doc_id().starts_with("blake3:"));
    assert_eq!(
        doc.content_str(),
        "# caching\n\nThe caching guide explains every option available to operators.\n\n\
         ## Example\n\n```toml\n[caching]\nenabled = true\n```\n"
    );
    assert!(
        doc.to_markdown()
            .contains("fetched_at: \"2024-03-01T08:00:00Z\"\n")
    );

    let artifacts = sink.artifacts.lock().unwrap();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].attribute("write_path"), Some(doc.storage_key().as_str()));
    assert!(sink.errors.lock().unwrap().is_empty());
}

/// Test that a custom selector from configuration is honoured
#[test]
fn test_custom_selector_from_config() {
    let config = PipelineConfig::from_toml_str(CONFIG).expect("Failed to load config");
    let html = "<html><body><div class=\"handbook\"><h1>Onboarding</h1>\
                <p>New team members start with the onboarding checklist and a buddy.</p></div>\
                </body></html>";
    let doc = Pipeline::from_config(&config)
        .expect("Failed to build pipeline")
        .with_sink(Arc::new(NoopSink))
        .process(
            &PageInput::new("https://example.com/handbook/people/onboarding", html),
            &param(&config),
        )
        .expect("Failed to process page");

    assert_eq!(doc.frontmatter().section(), "people");
}

/// Test that an extraction failure is reported once and returned unmapped
#[test]
fn test_failure_reported_once() {
    let config = PipelineConfig::default();
    let sink = Arc::new(RecordingSink::default());
    let pipeline = Pipeline::from_config(&config)
        .expect("Failed to build pipeline")
        .with_sink(sink.clone());

    let html = "<html><body><nav><a href=\"/a\">A</a><a href=\"/b\">B</a></nav></body></html>";
    let err = pipeline
        .process(&PageInput::new("https://example.com/docs/x", html), &param(&config))
        .expect_err("navigation-only page has no content");
    assert_eq!(err.cause(), Cause::NoContent);

    let errors = sink.errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].cause, "no_content");
    assert_eq!(errors[0].component, "extractor");
    assert_eq!(errors[0].action, "extract");
    assert_eq!(errors[0].severity, Severity::Fatal);
    assert_eq!(errors[0].attributes.len(), 1);
    assert!(sink.artifacts.lock().unwrap().is_empty());
}

/// Test that an unknown hash algorithm in configuration is rejected
#[test]
fn test_unknown_hash_algorithm_rejected() {
    let config = "[normalize]\nhash_algorithm = \"md5\"\n";
    assert!(PipelineConfig::from_toml_str(config).is_err());
    assert_eq!("BLAKE3".parse::<HashAlgorithm>(), Ok(HashAlgorithm::Blake3));
}

/// Test that concurrent processing matches sequential processing
#[test]
fn test_concurrent_processing_matches_sequential() {
    let config = PipelineConfig::from_toml_str(CONFIG).expect("Failed to load config");
    let param = param(&config);
    let sink = Arc::new(RecordingSink::default());
    let pipeline = Pipeline::from_config(&config)
        .expect("Failed to build pipeline")
        .with_sink(sink.clone());

    let topics = ["auth", "routing", "logging", "storage", "metrics", "tls", "proxy", "cache"];
    let pages: Vec<PageInput> = topics.iter().map(|t| page(t)).collect();

    let sequential: Vec<String> = pages
        .iter()
        .map(|p| {
            pipeline
                .process(p, &param)
                .expect("Failed to process page")
                .to_markdown()
        })
        .collect();

    let concurrent: Vec<String> = thread::scope(|scope| {
        let handles: Vec<_> = pages
            .iter()
            .map(|p| {
                let pipeline = &pipeline;
                let param = &param;
                scope.spawn(move || {
                    pipeline
                        .process(p, param)
                        .expect("Failed to process page")
                        .to_markdown()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("worker panicked"))
            .collect()
    });

    assert_eq!(sequential, concurrent);
    assert_eq!(sink.artifacts.lock().unwrap().len(), topics.len() * 2);
    assert!(sink.errors.lock().unwrap().is_empty());
}
