//! Rich-text document tree
//!
//! The editor stores its content as a JSON tree of nodes, each tagged with a
//! `type` and optionally carrying ordered children (`content`), inline
//! formatting (`marks`), leaf text (`text`) and node-specific properties
//! (`attrs`):
//!
//! ```json
//! {"type": "doc", "content": [
//!   {"type": "paragraph", "content": [
//!     {"type": "text", "text": "Sunrise hike", "marks": [{"type": "bold"}]}
//!   ]}
//! ]}
//! ```
//!
//! Absent fields are omitted when serializing, so a parsed tree serializes
//! back to an equivalent document.

use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Node type of the document root
pub const DOC_NODE_TYPE: &str = "doc";

/// Node type of leaf text nodes
pub const TEXT_NODE_TYPE: &str = "text";

/// Nodes that hold text rather than being content themselves.
/// Any other node without `text` or `content` (image, horizontalRule, ...)
/// counts as visible content for [`DocumentNode::is_blank`].
const TEXT_CONTAINER_TYPES: &[&str] = &[
    DOC_NODE_TYPE,
    "paragraph",
    "heading",
    "blockquote",
    "bulletList",
    "orderedList",
    "listItem",
    "codeBlock",
    "hardBreak",
];

/// Inline formatting annotation attached to a text node (bold, link, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub mark_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,
}

impl Mark {
    pub fn new(mark_type: impl Into<String>) -> Self {
        Self {
            mark_type: mark_type.into(),
            attrs: None,
        }
    }

    /// Set an attribute, creating the attribute map if needed
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }
}

/// A node of the rich-text document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentNode {
    /// Node kind ("doc", "paragraph", "text", "image", ...), never empty
    #[serde(rename = "type", deserialize_with = "non_empty_type")]
    pub node_type: String,
    /// Ordered children, in reading order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<DocumentNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<Vec<Mark>>,
    /// Leaf text, only on text nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,
}

impl DocumentNode {
    /// Create a bare node of the given type
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            content: None,
            marks: None,
            text: None,
            attrs: None,
        }
    }

    /// Create a leaf text node
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(TEXT_NODE_TYPE)
        }
    }

    /// The canonical empty document: `{"type": "doc", "content": []}`
    ///
    /// Used as the fail-safe value whenever stored content cannot be
    /// turned into a trustworthy tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use richtext_pipeline::document::DocumentNode;
    ///
    /// let doc = DocumentNode::empty_document();
    /// assert_eq!(doc.node_type, "doc");
    /// assert_eq!(doc.content, Some(vec![]));
    /// assert!(doc.is_blank());
    /// ```
    pub fn empty_document() -> Self {
        Self::new(DOC_NODE_TYPE).with_content(Vec::new())
    }

    /// Replace the children of this node
    pub fn with_content(mut self, children: Vec<DocumentNode>) -> Self {
        self.content = Some(children);
        self
    }

    /// Set an attribute, creating the attribute map if needed
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Append a mark, creating the mark list if needed
    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.marks.get_or_insert_with(Vec::new).push(mark);
        self
    }

    /// Children of this node, empty for leaves
    pub fn children(&self) -> &[DocumentNode] {
        self.content.as_deref().unwrap_or(&[])
    }

    /// Maximum nesting depth of the tree (a lone node has depth 1)
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self, 1usize)];

        while let Some((node, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            for child in node.children() {
                stack.push((child, depth + 1));
            }
        }

        max_depth
    }

    /// Visit every node in pre-order
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a DocumentNode)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Plain text of the document in reading order
    ///
    /// Block-level children (nodes with `content`) start on a new line and
    /// `hardBreak` nodes become line breaks. Marks and attributes are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use richtext_pipeline::document::DocumentNode;
    ///
    /// let doc = DocumentNode::empty_document().with_content(vec![
    ///     DocumentNode::new("paragraph").with_content(vec![DocumentNode::text("Day 1")]),
    ///     DocumentNode::new("paragraph").with_content(vec![DocumentNode::text("Day 2")]),
    /// ]);
    /// assert_eq!(doc.plain_text(), "Day 1\nDay 2");
    /// ```
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.write_plain_text(&mut out);
        out
    }

    fn write_plain_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
            return;
        }
        if self.node_type == "hardBreak" {
            out.push('\n');
            return;
        }

        for child in self.children() {
            if child.content.is_some() && !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            child.write_plain_text(out);
        }
    }

    /// Whether the document has nothing a reader would see
    ///
    /// An editor cleared by the user typically still holds one empty
    /// paragraph; that counts as blank. Whitespace-only text is blank.
    /// Atom nodes such as images make the document non-blank.
    pub fn is_blank(&self) -> bool {
        let mut blank = true;
        self.walk(&mut |node| {
            if let Some(text) = &node.text {
                if !text.trim().is_empty() {
                    blank = false;
                }
            } else if node.content.is_none()
                && !TEXT_CONTAINER_TYPES.contains(&node.node_type.as_str())
            {
                blank = false;
            }
        });
        blank
    }
}

fn non_empty_type<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let node_type = String::deserialize(deserializer)?;
    if node_type.is_empty() {
        return Err(de::Error::invalid_value(
            Unexpected::Str(""),
            &"a non-empty node type",
        ));
    }
    Ok(node_type)
}

impl Default for DocumentNode {
    fn default() -> Self {
        Self::empty_document()
    }
}
