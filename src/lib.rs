//! Rich-Text Content Pipeline
//!
//! This library turns untrusted, stored rich-text editor content (tour
//! descriptions, inclusions, exclusions) into a validated, sanitized
//! document tree, and serializes trees back to JSON for saving.
//!
//! # Architecture
//!
//! The library is structured into several modules:
//! - `document`: The document tree model and the canonical empty document
//! - `validator`: Shallow structural shape checks on JSON values
//! - `charset`: BOM sniffing and decoding of byte inputs
//! - `parser`: Never-panicking parsing of raw content
//! - `serializer`: Checked serialization back to JSON
//! - `security`: Removal of blocked nodes, event handlers and unsafe URLs
//! - `cache`: Single-slot cache of the last sanitized tree
//! - `pipeline`: Per-session facade that always yields a usable document
//!
//! # Diagnostics
//!
//! Failures are reported through the `tracing` facade. The library never
//! installs a subscriber; that is left to the host application.

// Module declarations
pub mod cache;
pub mod charset;
pub mod document;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod security;
pub mod serializer;
pub mod validator;

// Re-export main types for convenience
pub use document::{DocumentNode, Mark};
pub use error::{ContentError, ParseResult};
pub use parser::{RawContent, safe_parse};
pub use pipeline::{ContentPipeline, Loaded, LoadSource, PipelineOptions};
pub use security::{DocumentSanitizer, Sanitizer};
pub use serializer::safe_stringify;
pub use validator::is_valid_document_node;
