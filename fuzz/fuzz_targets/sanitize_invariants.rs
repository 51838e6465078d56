#![no_main]

use libfuzzer_sys::fuzz_target;
use richtext_pipeline::document::DocumentNode;
use richtext_pipeline::parser::{RawContent, safe_parse};
use richtext_pipeline::security::{DocumentSanitizer, SanitizeAction, Sanitizer};

fuzz_target!(|data: &[u8]| {
    let Ok(Some(doc)) = safe_parse(Some(RawContent::Bytes(data)), "fuzz") else {
        return;
    };

    let sanitizer = Sanitizer::new();
    let clean = sanitizer.sanitize(&doc);

    clean.walk(&mut |node: &DocumentNode| {
        assert_eq!(sanitizer.policy().check_node(&node.node_type), SanitizeAction::Allow);
        if let Some(attrs) = &node.attrs {
            assert_eq!(sanitizer.policy().check_attributes(attrs), SanitizeAction::Allow);
        }
    });

    assert_eq!(sanitizer.sanitize(&clean), clean);
});
