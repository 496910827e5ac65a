//! Core data model shared across the chunking, retrieval, and answer
//! pipelines, plus the crate-level error type.
//!
//! Everything here is plain data: serializable, cheap to clone, and free of
//! backend handles. Request-scoped values ([`Reference`], [`AnswerReply`])
//! are built fresh per query and never cached.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Chunk ──────────────────────────────────────────────────────────────

/// One packed chunk of a source document.
///
/// `chunk_id` is `"{document_id}:{chunk_index}"` and is stable for a given
/// `(filename, content)` pair: the same input bytes always produce the same
/// chunk ids, texts, and ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable id, `"{document_id}:{chunk_index}"`.
    pub chunk_id: String,
    /// Packed chunk text (trimmed, at least 50 chars).
    pub text: String,
    /// Heading of the section this chunk came from; empty for preamble text
    /// or documents without headings.
    pub heading: String,
    /// Heading level 1–6, or 0 when there is no heading.
    pub level: u8,
    /// Offsets of the enclosing section in the normalized document. These
    /// are byte positions, not char positions; the two differ on non-ASCII
    /// text.
    pub span: (usize, usize),
    /// Zero-based position within the document, assigned after filtering.
    pub chunk_index: usize,
    /// Total number of chunks emitted for the document.
    pub chunk_total: usize,
    /// Source filename.
    pub filename: String,
    /// Derived document id, shared by every chunk of the document.
    pub document_id: u64,
}

// ── Reference ──────────────────────────────────────────────────────────

/// Provenance row returned alongside an answer, index-aligned with the
/// context fragment it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    /// Document id from chunk metadata, `"unknown"` when absent.
    pub document_id: String,
    /// Source filename, `"unknown"` when absent.
    pub filename: String,
    /// Retrieval (or rerank) score of the candidate.
    pub score: f32,
    /// Chunk ordinal within its document, 0 when absent.
    pub chunk_ord: usize,
    /// First 200 chars of the context fragment.
    pub preview: String,
}

// ── Boundary shapes ────────────────────────────────────────────────────

/// Result of ingesting one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub ok: bool,
    pub document_id: u64,
    /// Lowercase hex SHA-256 of the raw document bytes.
    pub document_hash: String,
    pub filename: String,
    /// Number of chunks stored and indexed.
    pub chunks: usize,
}

/// Result of answering one question.
///
/// `degraded` records every stage that failed and was recovered locally; an
/// empty vec means the full pipeline ran clean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerReply {
    pub answer: String,
    pub references: Vec<Reference>,
    pub degraded: Vec<StageDegrade>,
}

/// A pipeline stage that failed and was substituted with a safe default.
///
/// These are returned on [`AnswerReply`] rather than surfaced as request
/// failures; the payload is the human-readable cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "stage", content = "reason")]
pub enum StageDegrade {
    /// Retrieval failed; the answer was generated without context.
    Retrieval(String),
    /// Context assembly failed; contexts and references were dropped.
    Assembly(String),
    /// Rerank scoring failed; retrieval order was kept.
    Rerank(String),
    /// Generation failed or returned nothing; the fallback answer was used.
    Generation(String),
}

// ── Errors ─────────────────────────────────────────────────────────────

/// Terminal errors of the ingest and answer pipelines.
///
/// Validation variants reject bad input before any capability is touched.
/// [`RagError::LengthMismatch`] indicates a broken capability contract and
/// is raised immediately rather than recovered.
#[derive(Debug, Error)]
pub enum RagError {
    /// The question was empty after trimming.
    #[error("question is empty")]
    EmptyQuestion,

    /// The uploaded document had no bytes.
    #[error("document '{filename}' is empty")]
    EmptyDocument { filename: String },

    /// The uploaded document was not valid UTF-8 text.
    #[error("document '{filename}' is not valid UTF-8 text")]
    InvalidEncoding {
        filename: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Chunking produced nothing usable (e.g. the document was all markup
    /// or shorter than the minimum chunk length).
    #[error("no chunks produced from document '{filename}'")]
    NoChunks { filename: String },

    /// Two parallel collections that must be index-aligned were not.
    #[error("length mismatch between {what}: {left} != {right}")]
    LengthMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    /// A required capability failed in a context where there is no safe
    /// degraded behavior (ingest writes, for example).
    #[error(transparent)]
    Capability(#[from] crate::capabilities::CapabilityError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_degrade_serializes_tagged() {
        let d = StageDegrade::Rerank("scorer timed out".into());
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, r#"{"stage":"rerank","reason":"scorer timed out"}"#);
    }

    #[test]
    fn chunk_round_trips_through_json() {
        let chunk = Chunk {
            chunk_id: "42:0".into(),
            text: "body".into(),
            heading: "Intro".into(),
            level: 1,
            span: (0, 4),
            chunk_index: 0,
            chunk_total: 1,
            filename: "doc.md".into(),
            document_id: 42,
        };
        let json = serde_json::to_string(&chunk).unwrap();
        let back: Chunk = serde_json::from_str(&json).unwrap();
        assert_eq!(back, chunk);
    }

    #[test]
    fn length_mismatch_message_names_both_sides() {
        let err = RagError::LengthMismatch {
            what: "chunks and embeddings",
            left: 3,
            right: 2,
        };
        assert_eq!(
            err.to_string(),
            "length mismatch between chunks and embeddings: 3 != 2"
        );
    }
}
