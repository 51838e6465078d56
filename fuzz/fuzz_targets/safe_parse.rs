#![no_main]

use libfuzzer_sys::fuzz_target;
use richtext_pipeline::parser::{RawContent, safe_parse};
use richtext_pipeline::pipeline::ContentPipeline;

fuzz_target!(|data: &[u8]| {
    let _ = safe_parse(Some(RawContent::Bytes(data)), "fuzz");

    // Loading must always yield a document, whatever the input
    let mut pipeline = ContentPipeline::new();
    let doc = pipeline.load(Some(RawContent::Bytes(data)));
    assert!(!doc.node_type.is_empty());
});
