//! Error types for document parsing and serialization

use thiserror::Error;

/// Errors produced by the parse and stringify stages
///
/// The `Display` text is the diagnostic message handed to callers and
/// written to the log. Each variant carries the context label of the field
/// being processed (e.g. "description", "inclusions").
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    /// Input was not valid JSON
    #[error("Failed to parse {context}: {message}")]
    Malformed { context: String, message: String },

    /// Byte input could not be decoded to text
    #[error("Failed to parse {context}: {message}")]
    Encoding { context: String, message: String },

    /// A pre-deserialized value failed the shape check
    #[error("Invalid {context} structure: not a valid document structure")]
    InvalidValue { context: String },

    /// Deserialized JSON failed the shape check or typed decoding
    #[error("Invalid {context} structure: missing required fields or invalid types")]
    InvalidStructure { context: String },

    /// Document nesting exceeds the configured limit
    #[error(
        "Invalid {context} structure: nesting depth {depth} exceeds maximum allowed depth {max}"
    )]
    TooDeep {
        context: String,
        depth: usize,
        max: usize,
    },

    /// Document failed the shape check before serialization
    #[error("Invalid {context} structure: cannot stringify")]
    Unserializable { context: String },

    /// serde_json refused to serialize the document
    #[error("Failed to stringify {context}: {message}")]
    Serialize { context: String, message: String },

    /// Root node is of a blocked type and cannot be sanitized into a container
    #[error("Invalid {context} structure: root node type '{node_type}' is not allowed")]
    UnsafeRoot { context: String, node_type: String },
}

impl ContentError {
    /// Context label the error was raised for
    pub fn context(&self) -> &str {
        match self {
            ContentError::Malformed { context, .. }
            | ContentError::Encoding { context, .. }
            | ContentError::InvalidValue { context }
            | ContentError::InvalidStructure { context }
            | ContentError::TooDeep { context, .. }
            | ContentError::Unserializable { context }
            | ContentError::Serialize { context, .. }
            | ContentError::UnsafeRoot { context, .. } => context,
        }
    }
}

/// Outcome of a parse or stringify operation
pub type ParseResult<T> = Result<T, ContentError>;
