//! Document loading facade
//!
//! [`ContentPipeline`] ties the stages together for one editor session:
//!
//! ```text
//! raw input ──▶ cache lookup ──hit──────────────────────────────▶ tree
//!                    │
//!                   miss
//!                    ▼
//!               safe_parse ──error──▶ empty document (+ warning)
//!                    │
//!               root check ──blocked──▶ empty document (+ warning)
//!                    ▼
//!                sanitize ──▶ cache put ──────────────────────────▶ tree
//! ```
//!
//! Loading never fails from the caller's point of view: any problem turns
//! into the canonical empty document, so the editing surface can render
//! unconditionally. [`ContentPipeline::load_with_outcome`] additionally
//! reports what happened, so the host application can show its "content
//! could not be loaded" notice and avoid saving the fallback over the
//! stored content.
//!
//! # Example
//!
//! ```rust
//! use richtext_pipeline::pipeline::ContentPipeline;
//! use richtext_pipeline::parser::RawContent;
//!
//! let mut pipeline = ContentPipeline::new();
//! let stored = r#"{"type":"doc","content":[{"type":"script"},{"type":"paragraph"}]}"#;
//!
//! let doc = pipeline.load(Some(RawContent::Text(stored)));
//! assert_eq!(doc.children().len(), 1);
//!
//! // Second load of the same content is served from the cache
//! pipeline.load(Some(RawContent::Text(stored)));
//! assert_eq!(pipeline.stats().cache_hits, 1);
//! ```

use crate::cache::{CacheKey, ParseCache};
use crate::document::DocumentNode;
use crate::error::{ContentError, ParseResult};
use crate::parser::{ParserOptions, RawContent, safe_parse_with_options};
use crate::security::{DocumentSanitizer, SanitizeOptions, Sanitizer};
use crate::serializer::safe_stringify;

/// Context label used when none is configured
pub const DEFAULT_CONTEXT: &str = "content";

/// Pipeline options
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Name of the field being edited, used in diagnostics
    pub context: String,
    pub parser: ParserOptions,
    pub sanitize: SanitizeOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            context: DEFAULT_CONTEXT.to_string(),
            parser: ParserOptions::default(),
            sanitize: SanitizeOptions::default(),
        }
    }
}

impl PipelineOptions {
    /// Default options with the given context label
    pub fn for_context(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            ..Default::default()
        }
    }
}

/// Where a loaded document came from
#[derive(Debug, Clone, PartialEq)]
pub enum LoadSource {
    /// Nothing was stored; the empty document was returned
    Empty,
    /// Served from the parse cache
    Cached,
    /// Parsed and sanitized from the raw input
    Parsed,
    /// The raw input was rejected; the empty document was returned
    Fallback(ContentError),
}

/// A loaded document and how it was obtained
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub document: DocumentNode,
    pub source: LoadSource,
}

impl Loaded {
    /// Whether the stored content was unusable
    ///
    /// Callers should warn the user and must not persist `document` over
    /// the stored content unless the user explicitly saves.
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, LoadSource::Fallback(_))
    }
}

/// Load counters for one pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub loads: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub sanitize_runs: u64,
    pub fallbacks: u64,
}

/// Parse, sanitize and cache pipeline for one editor session
///
/// Owns its cache. Create one pipeline per session; loads take `&mut self`
/// so a pipeline cannot be written from two places at once.
pub struct ContentPipeline<S: DocumentSanitizer = Sanitizer> {
    context: String,
    parser_options: ParserOptions,
    sanitizer: S,
    cache: ParseCache,
    stats: PipelineStats,
}

impl ContentPipeline<Sanitizer> {
    /// Create a pipeline with default options
    pub fn new() -> Self {
        Self::with_options(PipelineOptions::default())
    }

    /// Create a pipeline with custom options
    pub fn with_options(options: PipelineOptions) -> Self {
        let sanitizer = Sanitizer::with_options(options.sanitize.clone());
        Self::with_sanitizer(options, sanitizer)
    }
}

impl Default for ContentPipeline<Sanitizer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: DocumentSanitizer> ContentPipeline<S> {
    /// Create a pipeline around a custom sanitizer
    ///
    /// `options.sanitize` is ignored; the sanitizer carries its own policy.
    pub fn with_sanitizer(options: PipelineOptions, sanitizer: S) -> Self {
        Self {
            context: options.context,
            parser_options: options.parser,
            sanitizer,
            cache: ParseCache::new(),
            stats: PipelineStats::default(),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn sanitizer(&self) -> &S {
        &self.sanitizer
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Load raw content into a safe document tree
    ///
    /// Always returns a usable document; see [`Self::load_with_outcome`].
    pub fn load(&mut self, raw: Option<RawContent<'_>>) -> DocumentNode {
        self.load_with_outcome(raw).document
    }

    /// Load raw content and report where the result came from
    pub fn load_with_outcome(&mut self, raw: Option<RawContent<'_>>) -> Loaded {
        self.stats.loads += 1;

        let raw = match raw {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                return Loaded {
                    document: DocumentNode::empty_document(),
                    source: LoadSource::Empty,
                };
            }
        };

        let key = CacheKey::for_input(&raw);
        if let Some(document) = self.cache.get(&key) {
            self.stats.cache_hits += 1;
            tracing::debug!(context = %self.context, %key, "document cache hit");
            return Loaded {
                document: document.clone(),
                source: LoadSource::Cached,
            };
        }
        self.stats.cache_misses += 1;
        tracing::debug!(context = %self.context, %key, "document cache miss");

        let parsed = match safe_parse_with_options(Some(raw), &self.context, &self.parser_options)
        {
            Ok(Some(document)) => document,
            // null input is already caught by `is_empty`
            Ok(None) => {
                return Loaded {
                    document: DocumentNode::empty_document(),
                    source: LoadSource::Empty,
                };
            }
            Err(err) => return self.fallback(err),
        };

        if !self.sanitizer.is_root_allowed(&parsed) {
            return self.fallback(ContentError::UnsafeRoot {
                context: self.context.clone(),
                node_type: parsed.node_type,
            });
        }

        self.stats.sanitize_runs += 1;
        let document = self.sanitizer.sanitize(&parsed);
        self.cache.put(key, document.clone());

        Loaded {
            document,
            source: LoadSource::Parsed,
        }
    }

    /// Serialize a document for persistence
    pub fn store(&self, document: &DocumentNode) -> ParseResult<String> {
        safe_stringify(Some(document), &self.context)
    }

    /// Drop the cached entry, forcing the next load to re-parse
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    fn fallback(&mut self, err: ContentError) -> Loaded {
        self.stats.fallbacks += 1;
        tracing::warn!(
            context = %self.context,
            error = %err,
            "could not load document content, falling back to empty document"
        );
        Loaded {
            document: DocumentNode::empty_document(),
            source: LoadSource::Fallback(err),
        }
    }
}
