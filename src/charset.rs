//! Byte-level decoding of stored document content
//!
//! JSON text is expected to be UTF-8, but content exported from other tools
//! occasionally arrives with a byte order mark or as UTF-16. Decoding
//! follows a two-step cascade:
//!
//! 1. **BOM sniffing**: a UTF-8, UTF-16LE or UTF-16BE byte order mark selects
//!    the encoding and is stripped
//! 2. **Default to UTF-8**: without a BOM the bytes must be valid UTF-8
//!
//! # Examples
//!
//! ```rust
//! use richtext_pipeline::charset::decode_content;
//!
//! let text = decode_content(b"\xEF\xBB\xBF{\"type\":\"doc\"}").unwrap();
//! assert_eq!(text, "{\"type\":\"doc\"}");
//!
//! assert!(decode_content(b"{\"type\":\"\xFF\"}").is_err());
//! ```

use encoding_rs::Encoding;
use std::borrow::Cow;

/// Decode raw content bytes to text
///
/// Returns a borrowed string for BOM-less UTF-8 input. Invalid byte
/// sequences are an error rather than being replaced, since a replacement
/// character inside a JSON string would silently alter stored content.
pub fn decode_content(bytes: &[u8]) -> Result<Cow<'_, str>, String> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return encoding
            .decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
            .ok_or_else(|| format!("Invalid byte sequence for charset '{}'", encoding.name()));
    }

    std::str::from_utf8(bytes).map(Cow::Borrowed).map_err(|e| {
        format!(
            "Invalid UTF-8 at byte position {}: {}",
            e.valid_up_to(),
            e
        )
    })
}
