//! Show what the sanitizer removes from a hostile document

use richtext_pipeline::document::DocumentNode;
use richtext_pipeline::security::{DocumentSanitizer, SanitizeOptions, Sanitizer};
use richtext_pipeline::serializer::safe_stringify_pretty;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Rich-Text Content Pipeline - Sanitizer ===\n");

    let hostile = serde_json::json!({
        "type": "doc",
        "content": [
            {"type": "paragraph", "attrs": {"onclick": "steal()", "class": "lead"}, "content": [
                {"type": "text", "text": "Book the sunset tour", "marks": [
                    {"type": "link", "attrs": {"href": "javascript:alert(document.cookie)"}}
                ]}
            ]},
            {"type": "script", "content": [{"type": "text", "text": "alert(1)"}]},
            {"type": "image", "attrs": {"src": " JaVaScRiPt:alert(1)", "alt": "Sunset"}}
        ]
    });

    let doc: DocumentNode = match serde_json::from_value(hostile) {
        Ok(doc) => doc,
        Err(err) => {
            eprintln!("invalid demo document: {err}");
            return;
        }
    };

    for (label, options) in [
        ("Default policy (marks opaque)", SanitizeOptions::default()),
        (
            "Strict policy (marks scrubbed)",
            SanitizeOptions {
                scrub_mark_attrs: true,
                ..Default::default()
            },
        ),
    ] {
        let clean = Sanitizer::with_options(options).sanitize(&doc);
        println!("{label}:");
        match safe_stringify_pretty(Some(&clean), "demo") {
            Ok(json) => println!("{json}\n"),
            Err(err) => println!("could not serialize: {err}\n"),
        }
    }
}
