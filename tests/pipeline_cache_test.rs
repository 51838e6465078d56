//! Integration tests for the load facade and its single-slot cache
//!
//! A call-counting sanitizer wraps the default one so the tests can see
//! exactly when a load re-runs sanitization.

use std::cell::Cell;

use richtext_pipeline::document::DocumentNode;
use richtext_pipeline::parser::RawContent;
use richtext_pipeline::pipeline::{ContentPipeline, LoadSource, PipelineOptions};
use richtext_pipeline::security::{DocumentSanitizer, Sanitizer};
use serde_json::json;

/// Sanitizer spy counting `sanitize` calls
struct CountingSanitizer {
    inner: Sanitizer,
    calls: Cell<usize>,
}

impl CountingSanitizer {
    fn new() -> Self {
        Self {
            inner: Sanitizer::new(),
            calls: Cell::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl DocumentSanitizer for CountingSanitizer {
    fn sanitize(&self, doc: &DocumentNode) -> DocumentNode {
        self.calls.set(self.calls.get() + 1);
        self.inner.sanitize(doc)
    }

    fn is_root_allowed(&self, doc: &DocumentNode) -> bool {
        self.inner.is_root_allowed(doc)
    }
}

fn spy_pipeline() -> ContentPipeline<CountingSanitizer> {
    ContentPipeline::with_sanitizer(
        PipelineOptions::for_context("description"),
        CountingSanitizer::new(),
    )
}

const R1: &str = r#"{"type":"doc","content":[{"type":"paragraph","attrs":{"onclick":"x"},"content":[{"type":"text","text":"Sunset cruise"}]}]}"#;
const R2: &str = r#"{"type":"doc","content":[{"type":"paragraph","content":[{"type":"text","text":"City walk"}]}]}"#;

/// Test that a repeated load is served from the cache without sanitizing
#[test]
fn test_cache_hit_skips_sanitizer() {
    let mut pipeline = spy_pipeline();

    let t1 = pipeline.load(Some(RawContent::Text(R1)));
    assert_eq!(pipeline.sanitizer().calls(), 1);

    let again = pipeline.load(Some(RawContent::Text(R1)));
    assert_eq!(again, t1);
    assert_eq!(pipeline.sanitizer().calls(), 1);
}

/// Test that loading different content evicts the previous entry
#[test]
fn test_different_input_evicts() {
    let mut pipeline = spy_pipeline();

    pipeline.load(Some(RawContent::Text(R1)));
    pipeline.load(Some(RawContent::Text(R2)));
    assert_eq!(pipeline.sanitizer().calls(), 2);

    let reloaded = pipeline.load_with_outcome(Some(RawContent::Text(R1)));
    assert_eq!(reloaded.source, LoadSource::Parsed);
    assert_eq!(pipeline.sanitizer().calls(), 3);
    assert_eq!(reloaded.document.plain_text(), "Sunset cruise");
}

/// Test that cached documents are independent copies
#[test]
fn test_cached_document_not_aliased() {
    let mut pipeline = spy_pipeline();

    let mut first = pipeline.load(Some(RawContent::Text(R1)));
    first.content = Some(vec![DocumentNode::text("edited in the editor")]);

    let second = pipeline.load(Some(RawContent::Text(R1)));
    assert_eq!(second.plain_text(), "Sunset cruise");
    assert_eq!(pipeline.sanitizer().calls(), 1);
}

/// Test that equal values in different key order share a cache entry
#[test]
fn test_value_inputs_use_stable_keys() {
    let mut pipeline = spy_pipeline();
    let a = json!({"type": "doc", "content": [{"type": "horizontalRule"}]});
    let b = json!({"content": [{"type": "horizontalRule"}], "type": "doc"});

    let first = pipeline.load(Some(RawContent::Value(&a)));
    let second = pipeline.load_with_outcome(Some(RawContent::Value(&b)));

    assert_eq!(second.source, LoadSource::Cached);
    assert_eq!(second.document, first);
    assert_eq!(pipeline.sanitizer().calls(), 1);
}

/// Test that empty and failed loads never reach the sanitizer or cache
#[test]
fn test_fallbacks_skip_sanitizer() {
    let mut pipeline = spy_pipeline();

    assert_eq!(pipeline.load(None), DocumentNode::empty_document());
    assert_eq!(
        pipeline.load(Some(RawContent::Text("{not json"))),
        DocumentNode::empty_document()
    );
    assert_eq!(
        pipeline.load(Some(RawContent::Text(r#"{"content":[]}"#))),
        DocumentNode::empty_document()
    );
    assert_eq!(pipeline.sanitizer().calls(), 0);

    let stats = pipeline.stats();
    assert_eq!(stats.loads, 3);
    assert_eq!(stats.fallbacks, 2);
    assert_eq!(stats.cache_hits, 0);
}

/// Test that a fallback is reported with the parse error message
#[test]
fn test_fallback_outcome_carries_error() {
    let mut pipeline = spy_pipeline();

    let loaded = pipeline.load_with_outcome(Some(RawContent::Text(r#"{"type":7}"#)));
    assert!(loaded.is_fallback());
    match loaded.source {
        LoadSource::Fallback(err) => assert_eq!(
            err.to_string(),
            "Invalid description structure: missing required fields or invalid types"
        ),
        other => panic!("expected fallback, got {other:?}"),
    }
}

/// Independent sessions own independent caches
#[test]
fn test_sessions_do_not_share_cache() {
    let mut first = spy_pipeline();
    let mut second = spy_pipeline();

    first.load(Some(RawContent::Text(R1)));
    let loaded = second.load_with_outcome(Some(RawContent::Text(R1)));

    assert_eq!(loaded.source, LoadSource::Parsed);
    assert_eq!(first.sanitizer().calls(), 1);
    assert_eq!(second.sanitizer().calls(), 1);
}

/// Test that a loaded document can be stored and loaded back unchanged
#[test]
fn test_store_then_load() {
    let mut pipeline = ContentPipeline::with_options(PipelineOptions::for_context("inclusions"));

    let doc = pipeline.load(Some(RawContent::Text(R1)));
    let saved = pipeline.store(&doc).expect("Failed to store document");
    let reloaded = pipeline.load(Some(RawContent::Text(&saved)));

    assert_eq!(reloaded, doc);
    assert!(!saved.contains("onclick"));
}

/// Byte input with a BOM loads like the equivalent text
#[test]
fn test_bytes_input_loads() {
    let mut pipeline = spy_pipeline();
    let mut bytes = b"\xEF\xBB\xBF".to_vec();
    bytes.extend_from_slice(R2.as_bytes());

    let from_bytes = pipeline.load(Some(RawContent::Bytes(&bytes)));
    let from_text = pipeline.load(Some(RawContent::Text(R2)));

    assert_eq!(from_bytes, from_text);
    assert_eq!(from_bytes.plain_text(), "City walk");
}
