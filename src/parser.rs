//! Safe parsing of stored editor content
//!
//! Stored content arrives either as JSON text (the usual case, straight
//! from a form field or API payload) or as an already-deserialized value.
//! [`safe_parse`] accepts both and never panics: every failure is returned
//! as a [`ContentError`] and logged with a bounded preview of the input.
//!
//! # Stages
//!
//! 1. **Decode**: byte input is decoded to text (see [`crate::charset`])
//! 2. **Deserialize**: text input is parsed as JSON
//! 3. **Shape check**: the root value must pass [`is_valid_document_node`]
//! 4. **Depth check**: nesting is limited by [`ParserOptions::max_depth`]
//! 5. **Typed decode**: the value becomes a [`DocumentNode`], which checks
//!    every descendant (including that each `type` is non-empty)
//!
//! The typed decode is recursive, so the depth check runs first. Text input
//! is additionally bounded by serde_json's recursion limit of 128 JSON
//! levels (two per node level, one for the node and one for its `content`
//! array). The default [`DEFAULT_MAX_DEPTH`] sits below that ceiling so
//! over-deep text reports [`ContentError::TooDeep`]. Pre-deserialized values
//! get the same 128-level bound on their total JSON nesting.
//!
//! # Examples
//!
//! ```rust
//! use richtext_pipeline::parser::{safe_parse, RawContent};
//!
//! let doc = safe_parse(Some(RawContent::Text(r#"{"type":"doc","content":[]}"#)), "description")
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(doc.node_type, "doc");
//!
//! let err = safe_parse(Some(RawContent::Text("{not json")), "description").unwrap_err();
//! assert!(err.to_string().starts_with("Failed to parse description"));
//!
//! assert_eq!(safe_parse(None, "description").unwrap(), None);
//! ```

use serde_json::Value;

use crate::charset::decode_content;
use crate::document::DocumentNode;
use crate::error::{ContentError, ParseResult};
use crate::validator::{is_valid_document_node, nesting_depth, value_depth};

/// Default limit on document nesting depth, in node levels
pub const DEFAULT_MAX_DEPTH: usize = 48;

/// Maximum JSON nesting (arrays and objects) of a pre-deserialized value.
/// Matches serde_json's recursion limit for text.
pub const MAX_VALUE_NESTING: usize = 128;

/// Maximum number of characters of offending input written to the log
const LOG_PREVIEW_CHARS: usize = 200;

/// Raw, untrusted document content
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawContent<'a> {
    /// JSON text
    Text(&'a str),
    /// JSON text as undecoded bytes
    Bytes(&'a [u8]),
    /// An already-deserialized JSON value
    Value(&'a Value),
}

impl RawContent<'_> {
    /// Whether the input carries no content at all
    ///
    /// Empty text or bytes, and the JSON values `null`, `false`, `0` and
    /// `""`, all mean "nothing stored".
    pub fn is_empty(&self) -> bool {
        match self {
            RawContent::Text(text) => text.is_empty(),
            RawContent::Bytes(bytes) => bytes.is_empty(),
            RawContent::Value(value) => match value {
                Value::Null => true,
                Value::Bool(b) => !b,
                Value::Number(n) => n.as_f64() == Some(0.0),
                Value::String(s) => s.is_empty(),
                Value::Array(_) | Value::Object(_) => false,
            },
        }
    }
}

impl<'a> From<&'a str> for RawContent<'a> {
    fn from(text: &'a str) -> Self {
        RawContent::Text(text)
    }
}

impl<'a> From<&'a String> for RawContent<'a> {
    fn from(text: &'a String) -> Self {
        RawContent::Text(text)
    }
}

impl<'a> From<&'a [u8]> for RawContent<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        RawContent::Bytes(bytes)
    }
}

impl<'a> From<&'a Value> for RawContent<'a> {
    fn from(value: &'a Value) -> Self {
        RawContent::Value(value)
    }
}

/// Parser options
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Maximum allowed nesting depth of `content` arrays
    ///
    /// Values above about 64 have no effect on text input, which serde_json
    /// already rejects as [`ContentError::Malformed`] at that depth.
    pub max_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Parse untrusted content with default options
///
/// `None` and JSON `null` mean "no content" and yield `Ok(None)`.
/// `context` names the field being parsed and appears in error messages.
pub fn safe_parse(
    input: Option<RawContent<'_>>,
    context: &str,
) -> ParseResult<Option<DocumentNode>> {
    safe_parse_with_options(input, context, &ParserOptions::default())
}

/// Parse untrusted content
///
/// # Errors
///
/// - `ContentError::Encoding`: byte input is not valid for its encoding
/// - `ContentError::Malformed`: text input is not valid JSON
/// - `ContentError::InvalidStructure`: deserialized text fails the shape
///   check or a descendant cannot be decoded
/// - `ContentError::InvalidValue`: a pre-deserialized value fails the
///   shape check or nests deeper than [`MAX_VALUE_NESTING`]
/// - `ContentError::TooDeep`: nesting exceeds `options.max_depth`
pub fn safe_parse_with_options(
    input: Option<RawContent<'_>>,
    context: &str,
    options: &ParserOptions,
) -> ParseResult<Option<DocumentNode>> {
    let Some(input) = input else {
        return Ok(None);
    };

    let result = match input {
        RawContent::Value(Value::Null) => return Ok(None),
        RawContent::Value(value) => parse_value(value, context, options),
        RawContent::Text(text) => parse_text(text, context, options),
        RawContent::Bytes(bytes) => match decode_content(bytes) {
            Ok(text) => parse_text(&text, context, options),
            Err(message) => Err(ContentError::Encoding {
                context: context.to_string(),
                message,
            }),
        },
    };

    match result {
        Ok(doc) => Ok(Some(doc)),
        Err(err) => {
            tracing::warn!(
                context,
                input = %input_preview(&input),
                error = %err,
                "failed to parse document content"
            );
            Err(err)
        }
    }
}

fn parse_text(text: &str, context: &str, options: &ParserOptions) -> ParseResult<DocumentNode> {
    let value: Value = serde_json::from_str(text).map_err(|e| ContentError::Malformed {
        context: context.to_string(),
        message: e.to_string(),
    })?;

    if !is_valid_document_node(&value) {
        return Err(ContentError::InvalidStructure {
            context: context.to_string(),
        });
    }

    check_depth(&value, context, options)?;
    decode_tree(value, context)
}

fn parse_value(value: &Value, context: &str, options: &ParserOptions) -> ParseResult<DocumentNode> {
    if !is_valid_document_node(value) {
        return Err(ContentError::InvalidValue {
            context: context.to_string(),
        });
    }

    check_depth(value, context, options)?;
    if value_depth(value) > MAX_VALUE_NESTING {
        return Err(ContentError::InvalidValue {
            context: context.to_string(),
        });
    }

    decode_tree(value.clone(), context)
}

fn check_depth(value: &Value, context: &str, options: &ParserOptions) -> ParseResult<()> {
    let depth = nesting_depth(value);
    if depth > options.max_depth {
        return Err(ContentError::TooDeep {
            context: context.to_string(),
            depth,
            max: options.max_depth,
        });
    }
    Ok(())
}

fn decode_tree(value: Value, context: &str) -> ParseResult<DocumentNode> {
    serde_json::from_value(value).map_err(|e| {
        tracing::debug!(context, error = %e, "typed decode of document failed");
        ContentError::InvalidStructure {
            context: context.to_string(),
        }
    })
}

/// Bounded rendering of raw input for log events
pub(crate) fn input_preview(input: &RawContent<'_>) -> String {
    let full = match input {
        RawContent::Text(text) => return truncate_chars(text),
        RawContent::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        RawContent::Value(value) => {
            let depth = value_depth(value);
            if depth > MAX_VALUE_NESTING {
                return format!("<JSON value nested {depth} levels>");
            }
            value.to_string()
        }
    };
    truncate_chars(&full)
}

fn truncate_chars(text: &str) -> String {
    match text.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((end, _)) => format!("{}…", &text[..end]),
        None => text.to_string(),
    }
}
