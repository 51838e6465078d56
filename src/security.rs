//! Sanitization of untrusted document trees
//!
//! Stored editor content is attacker-controlled: anyone who can write a
//! description field can put arbitrary nodes and attributes in it. Before
//! the tree reaches the editing surface or a public page, this module
//! removes:
//!
//! - **Blocked nodes** (`script`, `iframe`), together with their subtrees
//! - **Event handler attributes** (any key starting with `on`)
//! - **Dangerous URLs** in `href`/`src` (`javascript:`)
//!
//! # Threat Model
//!
//! Renderers map node attributes onto DOM attributes. An `onClick` attr,
//! a `javascript:` link or an embedded `iframe` would therefore execute in
//! the visitor's browser. URL checks mirror how browsers read URLs: leading
//! whitespace and control characters are skipped and embedded tab/newline
//! characters are ignored, so `" java\tscript:alert(1)"` is still caught.
//!
//! # Copy Semantics
//!
//! Sanitization builds a new tree and never touches its input. The same
//! tree may be held by the parse cache and by the live editor model at
//! once, so in-place mutation is not an option.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use crate::document::{DocumentNode, Mark};

/// Node types removed together with their subtree
pub const DEFAULT_BLOCKED_NODE_TYPES: &[&str] = &["script", "iframe"];

/// URL schemes stripped from URL-bearing attributes
pub const DEFAULT_BLOCKED_URL_SCHEMES: &[&str] = &["javascript:"];

/// Attributes whose values are treated as URLs
pub const DEFAULT_URL_ATTRIBUTES: &[&str] = &["href", "src"];

/// Action to take for a node or its attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizeAction {
    /// Keep as-is
    Allow,
    /// Remove the node and all its children
    Remove,
    /// Strip event handler attributes but keep the node
    StripAttributes,
    /// Strip a dangerous URL from a URL attribute
    StripUrl,
}

/// Sanitizer configuration
#[derive(Debug, Clone)]
pub struct SanitizeOptions {
    /// Node types dropped with their subtree (exact match)
    pub blocked_node_types: Vec<String>,
    /// URL schemes, including the trailing colon, matched case-insensitively
    pub blocked_url_schemes: Vec<String>,
    /// Attribute names checked for dangerous URLs
    pub url_attributes: Vec<String>,
    /// Remove attributes whose name starts with `on`
    pub strip_event_handlers: bool,
    /// Apply attribute scrubbing to mark attrs as well (marks are opaque otherwise)
    pub scrub_mark_attrs: bool,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            blocked_node_types: to_strings(DEFAULT_BLOCKED_NODE_TYPES),
            blocked_url_schemes: to_strings(DEFAULT_BLOCKED_URL_SCHEMES),
            url_attributes: to_strings(DEFAULT_URL_ATTRIBUTES),
            strip_event_handlers: true,
            scrub_mark_attrs: false,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Classifies node types, attribute names and URL values
pub struct SecurityPolicy {
    options: SanitizeOptions,
}

impl SecurityPolicy {
    /// Create a policy with default settings
    pub fn new() -> Self {
        Self::with_options(SanitizeOptions::default())
    }

    /// Create a policy with custom settings
    pub fn with_options(options: SanitizeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SanitizeOptions {
        &self.options
    }

    /// Check whether a node of this type may stay in the tree
    ///
    /// # Examples
    ///
    /// ```
    /// use richtext_pipeline::security::{SanitizeAction, SecurityPolicy};
    ///
    /// let policy = SecurityPolicy::new();
    /// assert_eq!(policy.check_node("script"), SanitizeAction::Remove);
    /// assert_eq!(policy.check_node("paragraph"), SanitizeAction::Allow);
    /// ```
    pub fn check_node(&self, node_type: &str) -> SanitizeAction {
        if self.options.blocked_node_types.iter().any(|t| t == node_type) {
            SanitizeAction::Remove
        } else {
            SanitizeAction::Allow
        }
    }

    /// Check if an attribute name follows the event handler convention
    ///
    /// # Examples
    ///
    /// ```
    /// use richtext_pipeline::security::SecurityPolicy;
    ///
    /// let policy = SecurityPolicy::new();
    /// assert!(policy.is_event_handler("onClick"));
    /// assert!(policy.is_event_handler("onload"));
    /// assert!(!policy.is_event_handler("href"));
    /// ```
    pub fn is_event_handler(&self, attr_name: &str) -> bool {
        self.options.strip_event_handlers
            && attr_name
                .get(..2)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case("on"))
    }

    /// Check if a URL uses a blocked scheme
    ///
    /// # Examples
    ///
    /// ```
    /// use richtext_pipeline::security::SecurityPolicy;
    ///
    /// let policy = SecurityPolicy::new();
    /// assert!(policy.is_dangerous_url("javascript:alert(1)"));
    /// assert!(policy.is_dangerous_url("  JavaScript:alert(1)"));
    /// assert!(policy.is_dangerous_url("java\tscript:alert(1)"));
    /// assert!(!policy.is_dangerous_url("https://example.com/tours"));
    /// assert!(!policy.is_dangerous_url("/relative/javascript:x"));
    /// ```
    pub fn is_dangerous_url(&self, url: &str) -> bool {
        let normalized = normalize_url(url);

        let Some(scheme) = url_scheme(&normalized) else {
            return false;
        };

        self.options.blocked_url_schemes.iter().any(|blocked| {
            let blocked = blocked.as_str();
            blocked
                .strip_suffix(':')
                .unwrap_or(blocked)
                .eq_ignore_ascii_case(scheme)
        })
    }

    /// Return the URL if it is safe, `None` if it must be dropped
    pub fn sanitize_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        if self.is_dangerous_url(url) {
            None
        } else {
            Some(url)
        }
    }

    /// Check if attributes contain event handlers or dangerous URLs
    pub fn check_attributes(&self, attrs: &Map<String, Value>) -> SanitizeAction {
        for (name, value) in attrs {
            if self.is_event_handler(name) {
                return SanitizeAction::StripAttributes;
            }
            if self.is_dangerous_url_attribute(name, value) {
                return SanitizeAction::StripUrl;
            }
        }

        SanitizeAction::Allow
    }

    /// Names of the attributes that must be removed
    pub fn attributes_to_remove(&self, attrs: &Map<String, Value>) -> Vec<String> {
        attrs
            .iter()
            .filter(|(name, value)| {
                self.is_event_handler(name) || self.is_dangerous_url_attribute(name, value)
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn is_dangerous_url_attribute(&self, name: &str, value: &Value) -> bool {
        self.options.url_attributes.iter().any(|attr| attr == name)
            && value.as_str().is_some_and(|url| self.is_dangerous_url(url))
    }

    /// Copy of `attrs` without the attributes that must be removed
    fn scrub_attributes(&self, attrs: &Map<String, Value>) -> Map<String, Value> {
        attrs
            .iter()
            .filter(|(name, value)| {
                !self.is_event_handler(name) && !self.is_dangerous_url_attribute(name, value)
            })
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Skip leading whitespace/control characters and drop embedded tab and
/// newline characters, the way browsers read URL attributes.
fn normalize_url(url: &str) -> String {
    url.trim_start_matches(|c: char| c <= ' ')
        .chars()
        .filter(|c| !matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

/// Scheme of an absolute URL, without the colon
fn url_scheme(url: &str) -> Option<&str> {
    static SCHEME_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let regex = SCHEME_REGEX
        .get_or_init(|| Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]*):").ok())
        .as_ref()?;

    regex
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Produces a sanitized copy of a document tree
pub trait DocumentSanitizer {
    fn sanitize(&self, doc: &DocumentNode) -> DocumentNode;

    /// Whether `doc` may be used as a document root
    fn is_root_allowed(&self, doc: &DocumentNode) -> bool;
}

/// Default sanitizer driven by a [`SecurityPolicy`]
pub struct Sanitizer {
    policy: SecurityPolicy,
}

impl Sanitizer {
    /// Create a sanitizer with default settings
    pub fn new() -> Self {
        Self {
            policy: SecurityPolicy::new(),
        }
    }

    /// Create a sanitizer with custom settings
    pub fn with_options(options: SanitizeOptions) -> Self {
        Self {
            policy: SecurityPolicy::with_options(options),
        }
    }

    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    /// Sanitized copy of one node, or `None` if the node is dropped
    fn sanitize_node(&self, node: &DocumentNode) -> Option<DocumentNode> {
        if self.policy.check_node(&node.node_type) == SanitizeAction::Remove {
            tracing::debug!(node_type = %node.node_type, "dropping blocked node");
            return None;
        }

        let attrs = node.attrs.as_ref().map(|attrs| {
            if self.policy.check_attributes(attrs) == SanitizeAction::Allow {
                return attrs.clone();
            }
            tracing::debug!(
                node_type = %node.node_type,
                removed = ?self.policy.attributes_to_remove(attrs),
                "stripping unsafe attributes"
            );
            self.policy.scrub_attributes(attrs)
        });

        let marks = node.marks.as_ref().map(|marks| {
            if self.policy.options.scrub_mark_attrs {
                marks.iter().map(|mark| self.sanitize_mark(mark)).collect()
            } else {
                marks.clone()
            }
        });

        let content = node.content.as_ref().map(|children| {
            children
                .iter()
                .filter_map(|child| self.sanitize_node(child))
                .collect()
        });

        Some(DocumentNode {
            node_type: node.node_type.clone(),
            content,
            marks,
            text: node.text.clone(),
            attrs,
        })
    }

    fn sanitize_mark(&self, mark: &Mark) -> Mark {
        Mark {
            mark_type: mark.mark_type.clone(),
            attrs: mark
                .attrs
                .as_ref()
                .map(|attrs| self.policy.scrub_attributes(attrs)),
        }
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentSanitizer for Sanitizer {
    /// Sanitized deep copy of `doc`
    ///
    /// A root of a blocked type cannot be sanitized into anything useful;
    /// the empty document is returned for it.
    ///
    /// # Examples
    ///
    /// ```
    /// use richtext_pipeline::document::DocumentNode;
    /// use richtext_pipeline::security::{DocumentSanitizer, Sanitizer};
    ///
    /// let doc = DocumentNode::empty_document().with_content(vec![
    ///     DocumentNode::new("script").with_content(vec![DocumentNode::text("alert(1)")]),
    ///     DocumentNode::new("paragraph").with_attr("onclick", "steal()"),
    /// ]);
    ///
    /// let clean = Sanitizer::new().sanitize(&doc);
    /// assert_eq!(clean.children().len(), 1);
    /// assert_eq!(clean.children()[0].attrs, Some(Default::default()));
    /// ```
    fn sanitize(&self, doc: &DocumentNode) -> DocumentNode {
        self.sanitize_node(doc).unwrap_or_else(|| {
            tracing::warn!(
                node_type = %doc.node_type,
                "document root has a blocked type, using empty document"
            );
            DocumentNode::empty_document()
        })
    }

    fn is_root_allowed(&self, doc: &DocumentNode) -> bool {
        self.policy.check_node(&doc.node_type) == SanitizeAction::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn paragraph(text: &str) -> DocumentNode {
        DocumentNode::new("paragraph").with_content(vec![DocumentNode::text(text)])
    }

    #[test]
    fn test_blocked_nodes() {
        let policy = SecurityPolicy::new();

        assert_eq!(policy.check_node("script"), SanitizeAction::Remove);
        assert_eq!(policy.check_node("iframe"), SanitizeAction::Remove);

        assert_eq!(policy.check_node("paragraph"), SanitizeAction::Allow);
        assert_eq!(policy.check_node("image"), SanitizeAction::Allow);
        assert_eq!(policy.check_node("Script"), SanitizeAction::Allow);
    }

    #[test]
    fn test_event_handlers() {
        let policy = SecurityPolicy::new();

        assert!(policy.is_event_handler("onclick"));
        assert!(policy.is_event_handler("onClick"));
        assert!(policy.is_event_handler("ONERROR"));
        assert!(policy.is_event_handler("on"));

        assert!(!policy.is_event_handler("href"));
        assert!(!policy.is_event_handler("o"));
        assert!(!policy.is_event_handler(""));
        assert!(!policy.is_event_handler("class"));
    }

    #[test]
    fn test_event_handlers_can_be_kept() {
        let policy = SecurityPolicy::with_options(SanitizeOptions {
            strip_event_handlers: false,
            ..Default::default()
        });
        assert!(!policy.is_event_handler("onclick"));
    }

    #[test]
    fn test_dangerous_urls() {
        let policy = SecurityPolicy::new();

        assert!(policy.is_dangerous_url("javascript:alert('xss')"));
        assert!(policy.is_dangerous_url("JAVASCRIPT:alert('xss')"));
        assert!(policy.is_dangerous_url("\u{0001} javascript:x"));
        assert!(policy.is_dangerous_url("java\nscript:x"));
        assert!(policy.is_dangerous_url("javascript\r:x"));

        // Only javascript: is blocked by default
        assert!(!policy.is_dangerous_url("data:text/html,<script>"));
        assert!(!policy.is_dangerous_url("https://example.com"));
        assert!(!policy.is_dangerous_url("mailto:tours@example.com"));
        assert!(!policy.is_dangerous_url("/path?next=javascript:x"));
        assert!(!policy.is_dangerous_url("#anchor"));
        assert!(!policy.is_dangerous_url(""));
    }

    #[test]
    fn test_custom_blocked_schemes() {
        let policy = SecurityPolicy::with_options(SanitizeOptions {
            blocked_url_schemes: vec!["javascript:".to_string(), "data:".to_string()],
            ..Default::default()
        });
        assert!(policy.is_dangerous_url("data:text/html,<script>"));
        assert!(policy.is_dangerous_url("DATA:image/png;base64,AAAA"));
    }

    #[test]
    fn test_sanitize_url() {
        let policy = SecurityPolicy::new();

        assert_eq!(policy.sanitize_url("javascript:alert('xss')"), None);
        assert_eq!(
            policy.sanitize_url("https://example.com"),
            Some("https://example.com")
        );
    }

    #[test]
    fn test_check_attributes() {
        let policy = SecurityPolicy::new();
        let attrs = |v: Value| v.as_object().cloned().unwrap();

        assert_eq!(
            policy.check_attributes(&attrs(json!({"title": "ok"}))),
            SanitizeAction::Allow
        );
        assert_eq!(
            policy.check_attributes(&attrs(json!({"onmouseover": "x"}))),
            SanitizeAction::StripAttributes
        );
        assert_eq!(
            policy.check_attributes(&attrs(json!({"src": "javascript:x"}))),
            SanitizeAction::StripUrl
        );
        // Non-string URL attributes are left alone
        assert_eq!(
            policy.check_attributes(&attrs(json!({"href": null}))),
            SanitizeAction::Allow
        );
    }

    #[test]
    fn test_attribute_scrubbing_exact() {
        let node = DocumentNode::new("link")
            .with_attr("onClick", "x")
            .with_attr("href", "javascript:alert(1)")
            .with_attr("title", "ok");

        let clean = Sanitizer::new().sanitize(&node);
        assert_eq!(clean.attrs, json!({"title": "ok"}).as_object().cloned());
    }

    #[test]
    fn test_safe_urls_preserved() {
        let node = DocumentNode::new("image")
            .with_attr("src", "https://cdn.example.com/a.png")
            .with_attr("alt", "Beach");
        let clean = Sanitizer::new().sanitize(&node);
        assert_eq!(clean, node);
    }

    #[test]
    fn test_nested_blocked_nodes_removed_siblings_kept() {
        let doc = DocumentNode::empty_document().with_content(vec![
            paragraph("one"),
            DocumentNode::new("blockquote").with_content(vec![
                DocumentNode::new("iframe").with_attr("src", "https://evil.example"),
                paragraph("two"),
                DocumentNode::new("script"),
            ]),
            paragraph("three"),
        ]);

        let clean = Sanitizer::new().sanitize(&doc);
        let expected = DocumentNode::empty_document().with_content(vec![
            paragraph("one"),
            DocumentNode::new("blockquote").with_content(vec![paragraph("two")]),
            paragraph("three"),
        ]);
        assert_eq!(clean, expected);
    }

    #[test]
    fn test_input_not_mutated() {
        let doc = DocumentNode::empty_document().with_content(vec![
            DocumentNode::new("script"),
            paragraph("x").with_attr("onload", "y"),
        ]);
        let before = doc.clone();
        let _ = Sanitizer::new().sanitize(&doc);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_blocked_root_becomes_empty_document() {
        let sanitizer = Sanitizer::new();
        let root = DocumentNode::new("script").with_content(vec![paragraph("x")]);

        assert!(!sanitizer.is_root_allowed(&root));
        assert!(sanitizer.is_root_allowed(&DocumentNode::empty_document()));
        assert_eq!(sanitizer.sanitize(&root), DocumentNode::empty_document());
    }

    #[test]
    fn test_marks_opaque_by_default() {
        let node = DocumentNode::text("click")
            .with_mark(Mark::new("link").with_attr("href", "javascript:alert(1)"));
        let clean = Sanitizer::new().sanitize(&node);
        assert_eq!(clean.marks, node.marks);
    }

    #[test]
    fn test_mark_scrubbing_when_enabled() {
        let node = DocumentNode::text("click").with_mark(
            Mark::new("link")
                .with_attr("href", "javascript:alert(1)")
                .with_attr("target", "_blank"),
        );
        let sanitizer = Sanitizer::with_options(SanitizeOptions {
            scrub_mark_attrs: true,
            ..Default::default()
        });
        let clean = sanitizer.sanitize(&node);
        let marks = clean.marks.unwrap();
        assert_eq!(marks[0].attrs, json!({"target": "_blank"}).as_object().cloned());
    }

    fn arb_node_type() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("paragraph".to_string()),
            Just("heading".to_string()),
            Just("image".to_string()),
            Just("script".to_string()),
            Just("iframe".to_string()),
        ]
    }

    fn arb_attrs() -> impl Strategy<Value = Map<String, Value>> {
        prop::collection::btree_map(
            prop_oneof![
                Just("href".to_string()),
                Just("src".to_string()),
                Just("onClick".to_string()),
                Just("title".to_string()),
            ],
            prop_oneof![
                Just(json!("javascript:alert(1)")),
                Just(json!("https://example.com")),
                Just(json!(7)),
            ],
            0..4,
        )
        .prop_map(|attrs| attrs.into_iter().collect())
    }

    fn arb_tree() -> impl Strategy<Value = DocumentNode> {
        let leaf = "[a-z]{0,8}".prop_map(|text| DocumentNode::text(text));
        leaf.prop_recursive(5, 64, 5, |inner| {
            (arb_node_type(), prop::collection::vec(inner, 0..5), arb_attrs()).prop_map(
                |(node_type, children, attrs)| DocumentNode {
                    attrs: Some(attrs),
                    ..DocumentNode::new(node_type).with_content(children)
                },
            )
        })
    }

    fn assert_clean(node: &DocumentNode, policy: &SecurityPolicy) -> Result<(), TestCaseError> {
        prop_assert_eq!(policy.check_node(&node.node_type), SanitizeAction::Allow);
        if let Some(attrs) = &node.attrs {
            prop_assert_eq!(policy.check_attributes(attrs), SanitizeAction::Allow);
        }
        for child in node.children() {
            assert_clean(child, policy)?;
        }
        Ok(())
    }

    fn count_allowed(node: &DocumentNode, policy: &SecurityPolicy) -> usize {
        if policy.check_node(&node.node_type) == SanitizeAction::Remove {
            return 0;
        }
        1 + node
            .children()
            .iter()
            .map(|child| count_allowed(child, policy))
            .sum::<usize>()
    }

    proptest! {
        /// Sanitizing twice is the same as sanitizing once
        #[test]
        fn prop_sanitize_idempotent(children in prop::collection::vec(arb_tree(), 0..4)) {
            let doc = DocumentNode::empty_document().with_content(children);
            let sanitizer = Sanitizer::new();
            let once = sanitizer.sanitize(&doc);
            let twice = sanitizer.sanitize(&once);
            prop_assert_eq!(once, twice);
        }

        /// No blocked node or unsafe attribute survives, and every allowed
        /// node reachable through allowed ancestors is kept
        #[test]
        fn prop_sanitized_tree_is_clean(children in prop::collection::vec(arb_tree(), 0..4)) {
            let doc = DocumentNode::empty_document().with_content(children);
            let sanitizer = Sanitizer::new();
            let clean = sanitizer.sanitize(&doc);

            assert_clean(&clean, sanitizer.policy())?;
            prop_assert_eq!(
                count_allowed(&doc, sanitizer.policy()),
                count_allowed(&clean, sanitizer.policy())
            );
        }

        /// Blocked URL schemes are caught regardless of case and leading whitespace
        #[test]
        fn prop_javascript_urls_detected(
            leading_ws in "[ \\t\\n\\r]{0,3}",
            payload in "[A-Za-z0-9_/?=&:%#.()-]{0,64}",
            uppercase in any::<bool>(),
        ) {
            let policy = SecurityPolicy::new();
            let scheme = if uppercase { "JAVASCRIPT:" } else { "javascript:" };
            let candidate = format!("{leading_ws}{scheme}{payload}");

            prop_assert!(policy.is_dangerous_url(&candidate), "not detected: {:?}", candidate);
            prop_assert_eq!(policy.sanitize_url(&candidate), None);
        }
    }
}
