//! Context assembly: turning candidates into prompt fragments and
//! provenance references.
//!
//! Each candidate resolves to text either from its own payload or from the
//! durable chunk store; candidates that resolve to nothing are skipped from
//! both outputs, so `contexts` and `references` stay index-aligned. All
//! failures here are the caller's to degrade on — the assembler itself
//! reports them as plain `Err`.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::capabilities::{CapabilityError, ChunkStore};
use crate::retrieval::Candidate;
use crate::types::Reference;

/// Reference previews keep this many characters.
pub const PREVIEW_CHARS: usize = 200;

/// Index-aligned contexts and references for one request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssembledContext {
    pub contexts: Vec<String>,
    pub references: Vec<Reference>,
}

/// Resolves candidates to context text plus [`Reference`] rows.
pub struct ContextAssembler {
    store: Arc<dyn ChunkStore>,
    max_context_len: usize,
}

impl ContextAssembler {
    #[must_use]
    pub fn new(store: Arc<dyn ChunkStore>, max_context_len: usize) -> Self {
        Self {
            store,
            max_context_len,
        }
    }

    /// Assemble contexts and references from candidates, in order.
    ///
    /// Text resolution prefers the candidate payload's `text` field; absent
    /// that, the chunk store is consulted by id (skipped for the `"unknown"`
    /// placeholder). Context text is truncated to `max_context_len` chars;
    /// previews to [`PREVIEW_CHARS`].
    ///
    /// The whole candidate list is processed; bounding its length is the
    /// caller's job (the answer pipeline passes at most `first_k`
    /// candidates).
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError`] when a store lookup fails.
    pub async fn assemble(
        &self,
        candidates: &[Candidate],
    ) -> Result<AssembledContext, CapabilityError> {
        let mut out = AssembledContext::default();

        for cand in candidates {
            let mut text = nonempty_string(cand.payload.get("text"));
            let mut meta: Map<String, Value> = cand
                .payload
                .get("meta")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();

            if text.is_none() && cand.has_chunk_id() {
                if let Some(record) = self.store.get(&cand.chunk_id).await? {
                    if !record.text.is_empty() {
                        text = Some(record.text);
                    }
                    if !record.meta.is_empty() {
                        meta = record.meta;
                    }
                }
            }

            let Some(text) = text else {
                continue;
            };

            let safe_text = truncate_chars(&text, self.max_context_len);
            out.references.push(Reference {
                document_id: meta_string(&meta, "document_id"),
                filename: meta_string(&meta, "filename"),
                score: cand.score,
                chunk_ord: meta_ordinal(&meta),
                preview: truncate_chars(safe_text, PREVIEW_CHARS).to_string(),
            });
            out.contexts.push(safe_text.to_string());
        }

        Ok(out)
    }
}

/// Slice off the first `max_chars` characters at a char boundary.
fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn nonempty_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Metadata string with the `"unknown"` default; numbers stringify.
fn meta_string(meta: &Map<String, Value>, key: &str) -> String {
    match meta.get(key) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "unknown".to_string(),
    }
}

/// Chunk ordinal from `chunk_ord` or `chunk_index`, number or numeric
/// string, defaulting to 0.
fn meta_ordinal(meta: &Map<String, Value>) -> usize {
    ["chunk_ord", "chunk_index"]
        .iter()
        .find_map(|key| match meta.get(*key) {
            Some(Value::Number(n)) => n.as_u64().map(|v| v as usize),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        })
        .unwrap_or(0)
}
