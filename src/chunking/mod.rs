//! Deterministic document chunking.
//!
//! ```text
//!   raw text ──▶ normalize ──▶ sections ──▶ units ──▶ token packing
//!                                                          │
//!                 chunks ◀── index/id assignment ◀── ≥50-char filter
//! ```
//!
//! [`DocumentChunker`] is pure: the same `(text, filename, document_id)`
//! always yields the same chunks, in the same order, with the same ids.
//! Section metadata (heading, level, span) rides along onto every chunk
//! packed from that section.

pub mod normalize;
pub mod packer;
pub mod sections;
pub mod tokenizer;
pub mod units;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::Chunk;
use normalize::normalize;
use packer::pack_units;
use sections::split_sections;
use tokenizer::{TokenCounter, default_tokenizer};
use units::split_units;

/// Chunks whose trimmed text is shorter than this are dropped.
pub const MIN_CHUNK_CHARS: usize = 50;

// ── ChunkerConfig ──────────────────────────────────────────────────────

/// Chunking parameters.
///
/// Uses a builder pattern — all setters are `#[must_use]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChunkerConfig {
    /// Token budget per chunk. Default: 800.
    pub chunk_size: usize,
    /// Overlap trigger: when non-zero, each flush re-seeds the next chunk
    /// with the whole previous unit. Default: 120.
    pub overlap: usize,
    /// Whether to decode entities and strip `<...>` tags (default `true`).
    pub strip_markup: bool,
    /// Whether to split on markdown headings (default `true`).
    pub markdown_aware: bool,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            overlap: 120,
            strip_markup: true,
            markdown_aware: true,
        }
    }
}

impl ChunkerConfig {
    /// Create a new config with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-chunk token budget.
    #[must_use]
    pub fn chunk_size(mut self, tokens: usize) -> Self {
        self.chunk_size = tokens;
        self
    }

    /// Set the overlap trigger.
    #[must_use]
    pub fn overlap(mut self, tokens: usize) -> Self {
        self.overlap = tokens;
        self
    }

    /// Enable or disable markup stripping.
    #[must_use]
    pub fn strip_markup(mut self, enabled: bool) -> Self {
        self.strip_markup = enabled;
        self
    }

    /// Enable or disable markdown section awareness.
    #[must_use]
    pub fn markdown_aware(mut self, enabled: bool) -> Self {
        self.markdown_aware = enabled;
        self
    }
}

// ── DocumentChunker ────────────────────────────────────────────────────

/// Splits documents into retrieval-sized chunks.
pub struct DocumentChunker {
    config: ChunkerConfig,
    tokenizer: Arc<dyn TokenCounter>,
}

impl DocumentChunker {
    #[must_use]
    pub fn new(config: ChunkerConfig, tokenizer: Arc<dyn TokenCounter>) -> Self {
        Self { config, tokenizer }
    }

    /// Default config with the best available tokenizer.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ChunkerConfig::default(), default_tokenizer())
    }

    #[must_use]
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunk a document. Empty or all-markup input yields an empty vec;
    /// callers decide whether that is an error.
    pub fn chunk(&self, text: &str, filename: &str, document_id: u64) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }
        let text = normalize(text, self.config.strip_markup);
        if text.is_empty() {
            return Vec::new();
        }

        let mut drafts: Vec<(String, String, u8, (usize, usize))> = Vec::new();
        for section in split_sections(&text, self.config.markdown_aware) {
            let body = &text[section.start..section.end];
            let units = split_units(body);
            for packed in pack_units(
                &units,
                self.tokenizer.as_ref(),
                self.config.chunk_size,
                self.config.overlap,
            ) {
                drafts.push((
                    packed,
                    section.heading.clone(),
                    section.level,
                    (section.start, section.end),
                ));
            }
        }

        let kept: Vec<_> = drafts
            .into_iter()
            .filter_map(|(text, heading, level, span)| {
                let trimmed = text.trim().to_string();
                (trimmed.chars().count() >= MIN_CHUNK_CHARS)
                    .then_some((trimmed, heading, level, span))
            })
            .collect();

        let total = kept.len();
        kept.into_iter()
            .enumerate()
            .map(|(i, (text, heading, level, span))| Chunk {
                chunk_id: format!("{document_id}:{i}"),
                text,
                heading,
                level,
                span,
                chunk_index: i,
                chunk_total: total,
                filename: filename.to_string(),
                document_id,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::tokenizer::HashingTokenizer;
    use super::*;

    fn chunker() -> DocumentChunker {
        DocumentChunker::new(ChunkerConfig::default(), Arc::new(HashingTokenizer))
    }

    fn small_chunker(chunk_size: usize, overlap: usize) -> DocumentChunker {
        DocumentChunker::new(
            ChunkerConfig::new().chunk_size(chunk_size).overlap(overlap),
            Arc::new(HashingTokenizer),
        )
    }

    const DOC: &str = "# Title\n\nThis opening paragraph talks about the system at length \
                       and easily clears the minimum chunk size.\n\n\
                       ## Details\n\nThe details section also carries enough prose to be kept \
                       as a chunk on its own after packing.";

    // 1. Identical input, identical output.
    #[test]
    fn chunking_is_deterministic() {
        let c = chunker();
        assert_eq!(c.chunk(DOC, "doc.md", 7), c.chunk(DOC, "doc.md", 7));
    }

    // 2. Indices are contiguous, totals consistent, ids well-formed.
    #[test]
    fn indices_and_ids_are_consistent() {
        let chunks = chunker().chunk(DOC, "doc.md", 7);
        assert!(!chunks.is_empty());
        let total = chunks.len();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
            assert_eq!(chunk.chunk_total, total);
            assert_eq!(chunk.chunk_id, format!("7:{i}"));
            assert_eq!(chunk.document_id, 7);
            assert_eq!(chunk.filename, "doc.md");
        }
    }

    // 3. Section metadata lands on chunks; spans never decrease.
    #[test]
    fn headings_and_spans_propagate() {
        let chunks = chunker().chunk(DOC, "doc.md", 7);
        assert_eq!(chunks[0].heading, "Title");
        assert_eq!(chunks[0].level, 1);
        assert!(chunks.iter().any(|c| c.heading == "Details" && c.level == 2));
        for pair in chunks.windows(2) {
            assert!(pair[0].span.0 <= pair[1].span.0);
        }
    }

    // 4. Sub-50-char output is filtered.
    #[test]
    fn short_chunks_are_dropped() {
        let chunks = chunker().chunk("# Tiny\n\nToo short.", "t.md", 1);
        assert!(chunks.is_empty());
    }

    // 5. Empty and all-markup input produce nothing.
    #[test]
    fn degenerate_input_yields_nothing() {
        let c = chunker();
        assert!(c.chunk("", "e.md", 1).is_empty());
        assert!(c.chunk("<div><span></span></div>", "m.md", 1).is_empty());
    }

    // 6. Every chunk text meets the minimum length.
    #[test]
    fn all_chunks_meet_minimum_length() {
        for chunk in chunker().chunk(DOC, "doc.md", 7) {
            assert!(chunk.text.chars().count() >= MIN_CHUNK_CHARS);
            assert_eq!(chunk.text, chunk.text.trim());
        }
    }

    // 7. Tight budgets produce several chunks from one section, and with
    //    overlap on, consecutive chunks share the carried unit's text.
    #[test]
    fn overlap_repeats_boundary_unit() {
        let text = "# Log\n\nAlpha sentence number one runs well past forty characters in \
                    total length. Beta sentence number two also runs well past forty \
                    characters in total length. Gamma sentence number three also runs well \
                    past forty characters in total length.";
        let chunks = small_chunker(30, 5).chunk(text, "log.md", 2);
        assert!(chunks.len() >= 2, "expected multiple chunks, got {}", chunks.len());
        for pair in chunks.windows(2) {
            let prev_tail: String = {
                let words: Vec<&str> = pair[0].text.split_whitespace().collect();
                words[words.len().saturating_sub(4)..].join(" ")
            };
            assert!(
                pair[1].text.contains(&prev_tail),
                "chunk did not re-open with carried unit: {:?}",
                pair[1].text
            );
        }
    }

    // 8. Markdown awareness off: headings are just text, one section.
    #[test]
    fn markdown_aware_off_single_section() {
        let c = DocumentChunker::new(
            ChunkerConfig::new().markdown_aware(false),
            Arc::new(HashingTokenizer),
        );
        let chunks = c.chunk(DOC, "doc.md", 3);
        assert!(!chunks.is_empty());
        for chunk in chunks {
            assert_eq!(chunk.heading, "");
            assert_eq!(chunk.level, 0);
        }
    }
}
