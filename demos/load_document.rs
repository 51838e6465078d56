//! Loading stored tour content the way the editor does
//!
//! Run with `RUST_LOG`-style output enabled to see the diagnostics emitted
//! for rejected content.

use richtext_pipeline::parser::RawContent;
use richtext_pipeline::pipeline::{ContentPipeline, LoadSource, PipelineOptions};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Rich-Text Content Pipeline - Loading ===\n");

    let mut pipeline = ContentPipeline::with_options(PipelineOptions::for_context("description"));

    let inputs = [
        (
            "Stored description",
            r#"{"type":"doc","content":[{"type":"paragraph","content":[{"type":"text","text":"Snorkel the reef"}]}]}"#,
        ),
        (
            "Same description again (cached)",
            r#"{"type":"doc","content":[{"type":"paragraph","content":[{"type":"text","text":"Snorkel the reef"}]}]}"#,
        ),
        (
            "Embedded iframe",
            r#"{"type":"doc","content":[{"type":"iframe","attrs":{"src":"javascript:evil()"}},{"type":"paragraph","content":[{"type":"text","text":"hi"}]}]}"#,
        ),
        ("Corrupt JSON", r#"{"type":"doc","content":["#),
        ("Missing type", r#"{"content":[]}"#),
    ];

    for (label, raw) in inputs {
        println!("{label}:");
        let loaded = pipeline.load_with_outcome(Some(RawContent::Text(raw)));

        match &loaded.source {
            LoadSource::Fallback(err) => {
                println!("  warning shown to user: content could not be loaded ({err})")
            }
            source => println!("  source: {source:?}"),
        }

        match pipeline.store(&loaded.document) {
            Ok(json) => println!("  document: {json}"),
            Err(err) => println!("  could not serialize: {err}"),
        }
        println!("  text: {:?}\n", loaded.document.plain_text());
    }

    println!("stats: {:?}", pipeline.stats());
}
