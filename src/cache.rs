//! Single-slot parse cache
//!
//! An editor session re-renders the same stored content many times; the
//! cache remembers the sanitized tree for the most recent raw input so
//! repeated loads skip parsing and sanitization.
//!
//! # Keys
//!
//! Raw inputs are identified by a BLAKE3 digest of:
//!
//! - the text bytes for JSON text input
//! - the raw bytes for byte input
//! - the compact JSON text of pre-deserialized values (object keys are
//!   sorted, so equal values always produce equal keys). The text is
//!   streamed into the hasher without recursion, so a hostile value nested
//!   arbitrarily deep can still be keyed.
//!
//! # Ownership
//!
//! There is exactly one slot. A `put` replaces it wholesale, so the cache
//! never holds a key paired with a stale tree. Writes take `&mut self`;
//! one session owns one cache and nothing is shared between sessions.

use std::fmt;

use serde_json::Value;

use crate::document::DocumentNode;
use crate::parser::RawContent;

/// Identity of a raw input
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Compute the key for a raw input
    ///
    /// # Examples
    ///
    /// ```
    /// use richtext_pipeline::cache::CacheKey;
    /// use richtext_pipeline::parser::RawContent;
    /// use serde_json::json;
    ///
    /// let a = CacheKey::for_input(&RawContent::Text(r#"{"type":"doc"}"#));
    /// let b = CacheKey::for_input(&RawContent::Text(r#"{"type":"doc"}"#));
    /// assert_eq!(a, b);
    ///
    /// let value = json!({"type": "doc", "content": []});
    /// let reordered = json!({"content": [], "type": "doc"});
    /// assert_eq!(
    ///     CacheKey::for_input(&RawContent::Value(&value)),
    ///     CacheKey::for_input(&RawContent::Value(&reordered)),
    /// );
    /// ```
    pub fn for_input(input: &RawContent<'_>) -> Self {
        let hash = match input {
            RawContent::Text(text) => blake3::hash(text.as_bytes()),
            RawContent::Bytes(bytes) => blake3::hash(bytes),
            RawContent::Value(value) => hash_value(value),
        };
        Self(*hash.as_bytes())
    }

    /// Full digest as lowercase hex
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for CacheKey {
    /// First 64 bits as hex, enough to tell entries apart in logs
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0[..8]))
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({self})")
    }
}

enum Token<'a> {
    Value(&'a Value),
    Key(&'a str),
    Punct(&'static [u8]),
}

/// BLAKE3 of the compact JSON text of `value`, same bytes as `value.to_string()`
fn hash_value(value: &Value) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    let mut stack = vec![Token::Value(value)];

    while let Some(token) = stack.pop() {
        match token {
            Token::Punct(punct) => {
                hasher.update(punct);
            }
            Token::Key(key) => {
                hasher.update(Value::from(key).to_string().as_bytes());
                hasher.update(b":");
            }
            Token::Value(Value::Array(items)) => {
                hasher.update(b"[");
                stack.push(Token::Punct(b"]"));
                for (i, item) in items.iter().enumerate().rev() {
                    stack.push(Token::Value(item));
                    if i > 0 {
                        stack.push(Token::Punct(b","));
                    }
                }
            }
            Token::Value(Value::Object(fields)) => {
                hasher.update(b"{");
                stack.push(Token::Punct(b"}"));
                for (i, (key, field)) in fields.iter().enumerate().rev() {
                    stack.push(Token::Value(field));
                    stack.push(Token::Key(key));
                    if i > 0 {
                        stack.push(Token::Punct(b","));
                    }
                }
            }
            Token::Value(scalar) => {
                hasher.update(scalar.to_string().as_bytes());
            }
        }
    }

    hasher.finalize()
}

#[derive(Debug)]
struct CacheEntry {
    key: CacheKey,
    document: DocumentNode,
}

/// Most-recently-used parse result for one editor session
#[derive(Debug, Default)]
pub struct ParseCache {
    slot: Option<CacheEntry>,
}

impl ParseCache {
    pub fn new() -> Self {
        Self { slot: None }
    }

    /// Cached tree for `key`, if it is the current entry
    pub fn get(&self, key: &CacheKey) -> Option<&DocumentNode> {
        self.slot
            .as_ref()
            .filter(|entry| entry.key == *key)
            .map(|entry| &entry.document)
    }

    /// Replace the cached entry
    pub fn put(&mut self, key: CacheKey, document: DocumentNode) {
        self.slot = Some(CacheEntry { key, document });
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// Key of the current entry
    pub fn current_key(&self) -> Option<CacheKey> {
        self.slot.as_ref().map(|entry| entry.key)
    }
}
