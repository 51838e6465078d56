//! Safe serialization of document trees back to JSON text
//!
//! The inverse of [`crate::parser::safe_parse`]. The tree is checked before
//! serialization so a corrupt document is never written back to the form
//! state that gets persisted.

use crate::document::DocumentNode;
use crate::error::{ContentError, ParseResult};

/// Serialize a document to compact JSON
///
/// `None` yields an empty string.
///
/// # Examples
///
/// ```
/// use richtext_pipeline::document::DocumentNode;
/// use richtext_pipeline::serializer::safe_stringify;
///
/// let json = safe_stringify(Some(&DocumentNode::empty_document()), "description").unwrap();
/// assert_eq!(json, r#"{"type":"doc","content":[]}"#);
/// assert_eq!(safe_stringify(None, "description").unwrap(), "");
///
/// let broken = DocumentNode::new("");
/// assert!(safe_stringify(Some(&broken), "description").is_err());
/// ```
pub fn safe_stringify(doc: Option<&DocumentNode>, context: &str) -> ParseResult<String> {
    stringify(doc, context, false)
}

/// Serialize a document to indented JSON
pub fn safe_stringify_pretty(doc: Option<&DocumentNode>, context: &str) -> ParseResult<String> {
    stringify(doc, context, true)
}

fn stringify(doc: Option<&DocumentNode>, context: &str, pretty: bool) -> ParseResult<String> {
    let Some(doc) = doc else {
        return Ok(String::new());
    };

    let result = check_shape(doc, context).and_then(|()| {
        let encoded = if pretty {
            serde_json::to_string_pretty(doc)
        } else {
            serde_json::to_string(doc)
        };
        encoded.map_err(|e| serialize_error(context, &e))
    });

    if let Err(err) = &result {
        tracing::warn!(
            context,
            node_type = %doc.node_type,
            error = %err,
            "failed to stringify document"
        );
    }
    result
}

/// Every node must have a non-empty `type`; the typed fields cover the rest
fn check_shape(doc: &DocumentNode, context: &str) -> ParseResult<()> {
    let mut stack = vec![doc];
    while let Some(node) = stack.pop() {
        if node.node_type.is_empty() {
            return Err(ContentError::Unserializable {
                context: context.to_string(),
            });
        }
        stack.extend(node.children());
    }
    Ok(())
}

fn serialize_error(context: &str, err: &serde_json::Error) -> ContentError {
    ContentError::Serialize {
        context: context.to_string(),
        message: err.to_string(),
    }
}
