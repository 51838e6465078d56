//! Structural shape checks for untrusted document values
//!
//! The predicate here is deliberately shallow: it checks the fields of a
//! single node and does not descend into `content`. Deeper problems are
//! caught when the value is decoded into a typed [`DocumentNode`].
//!
//! [`DocumentNode`]: crate::document::DocumentNode

use serde_json::Value;

/// Check that a value has the minimal document-node shape
///
/// - must be a JSON object
/// - `type` must be a non-empty string
/// - `content`, if present, must be an array
/// - `marks`, if present, must be an array
/// - `text`, if present, must be a string
///
/// # Examples
///
/// ```
/// use richtext_pipeline::validator::is_valid_document_node;
/// use serde_json::json;
///
/// assert!(is_valid_document_node(&json!({"type": "doc"})));
/// assert!(!is_valid_document_node(&json!({"content": []})));
/// assert!(!is_valid_document_node(&json!(null)));
/// ```
pub fn is_valid_document_node(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };

    match obj.get("type") {
        Some(Value::String(node_type)) if !node_type.is_empty() => {}
        _ => return false,
    }

    if obj.get("content").is_some_and(|content| !content.is_array()) {
        return false;
    }
    if obj.get("marks").is_some_and(|marks| !marks.is_array()) {
        return false;
    }
    if obj.get("text").is_some_and(|text| !text.is_string()) {
        return false;
    }

    true
}

/// Nesting depth of a document value, following `content` arrays only
///
/// Iterative so that hostile inputs cannot exhaust the stack. A value
/// without `content` has depth 1.
pub fn nesting_depth(value: &Value) -> usize {
    let mut max_depth = 0;
    let mut stack = vec![(value, 1usize)];

    while let Some((node, depth)) = stack.pop() {
        max_depth = max_depth.max(depth);
        if let Some(children) = node.get("content").and_then(Value::as_array) {
            stack.extend(children.iter().map(|child| (child, depth + 1)));
        }
    }

    max_depth
}

/// Nesting depth of a JSON value across all arrays and objects
///
/// Scalars have depth 0 and `{}` has depth 1. Iterative, like
/// [`nesting_depth`].
pub fn value_depth(value: &Value) -> usize {
    let mut max_depth = 0;
    let mut stack = vec![(value, 0usize)];

    while let Some((node, depth)) = stack.pop() {
        match node {
            Value::Array(items) => {
                max_depth = max_depth.max(depth + 1);
                stack.extend(items.iter().map(|item| (item, depth + 1)));
            }
            Value::Object(fields) => {
                max_depth = max_depth.max(depth + 1);
                stack.extend(fields.values().map(|field| (field, depth + 1)));
            }
            _ => {}
        }
    }

    max_depth
}
