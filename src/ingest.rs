//! Document ingestion: identity, chunking, storage, and vector indexing.
//!
//! Validation is fail-closed — empty, non-UTF-8, or chunkless documents are
//! rejected before anything is written. After validation the flow is
//! chunk → store records → batch embed → upsert points, with deterministic
//! UUIDv5 point ids so re-ingesting a document overwrites its own points
//! instead of duplicating them.

use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::capabilities::{CapabilityRegistry, StoredChunk, VectorPoint};
use crate::chunking::DocumentChunker;
use crate::types::{Chunk, IngestReceipt, RagError};

/// Fixed namespace for deterministic point ids.
const POINT_NAMESPACE: Uuid = Uuid::from_u128(0x1111_1111_2222_3333_4444_5555_5555_5555);

/// Stable identity of a document's content.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DocumentIdentity {
    pub document_id: u64,
    /// Lowercase hex SHA-256 of the raw bytes.
    pub content_hash: String,
}

/// Derive the identity of `(filename, bytes)`.
///
/// `document_id` is the first eight bytes of SHA-256 over
/// `"{filename}:{content_hash}"`, so identical input always maps to the
/// same id. Uniqueness is best-effort: the id is a truncated digest and
/// collisions are not handled.
#[must_use]
pub fn document_identity(filename: &str, bytes: &[u8]) -> DocumentIdentity {
    let content_hash = hex_string(&Sha256::digest(bytes));
    let digest = Sha256::digest(format!("{filename}:{content_hash}").as_bytes());
    let mut id_bytes = [0u8; 8];
    id_bytes.copy_from_slice(&digest[..8]);
    DocumentIdentity {
        document_id: u64::from_be_bytes(id_bytes),
        content_hash,
    }
}

/// Deterministic UUIDv5 point id for a chunk id.
#[must_use]
pub fn point_id_for(chunk_id: &str) -> String {
    Uuid::new_v5(&POINT_NAMESPACE, chunk_id.as_bytes()).to_string()
}

fn hex_string(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(
        String::with_capacity(bytes.len() * 2),
        |mut out, b| {
            let _ = write!(out, "{b:02x}");
            out
        },
    )
}

// ── DocumentIngestor ───────────────────────────────────────────────────

/// Chunks documents and writes them to the store and the vector index.
pub struct DocumentIngestor {
    registry: CapabilityRegistry,
    chunker: DocumentChunker,
}

impl DocumentIngestor {
    #[must_use]
    pub fn new(registry: CapabilityRegistry, chunker: DocumentChunker) -> Self {
        Self { registry, chunker }
    }

    /// Ingest one document.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyDocument`] for zero-byte input.
    /// - [`RagError::InvalidEncoding`] for non-UTF-8 input.
    /// - [`RagError::NoChunks`] when chunking yields nothing usable.
    /// - [`RagError::LengthMismatch`] when the embedding provider breaks
    ///   its alignment contract.
    /// - [`RagError::Capability`] when a store or index write fails.
    pub async fn ingest(
        &self,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<IngestReceipt, RagError> {
        if bytes.is_empty() {
            return Err(RagError::EmptyDocument {
                filename: filename.to_string(),
            });
        }
        let text = String::from_utf8(bytes.to_vec()).map_err(|source| {
            RagError::InvalidEncoding {
                filename: filename.to_string(),
                source,
            }
        })?;

        let identity = document_identity(filename, bytes);
        let chunks = self.chunker.chunk(&text, filename, identity.document_id);
        if chunks.is_empty() {
            return Err(RagError::NoChunks {
                filename: filename.to_string(),
            });
        }

        let mut texts = Vec::with_capacity(chunks.len());
        let mut metas = Vec::with_capacity(chunks.len());
        let mut records = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let meta = chunk_meta(chunk, &identity, content_type, bytes.len());
            records.push((
                chunk.chunk_id.clone(),
                StoredChunk {
                    text: chunk.text.clone(),
                    meta: meta.clone(),
                },
            ));
            metas.push(meta);
            texts.push(chunk.text.clone());
        }

        self.registry.store().bulk_put(records).await?;
        let indexed = self.upsert_vectors(&texts, metas).await?;

        tracing::debug!(
            filename,
            document_id = identity.document_id,
            chunks = indexed,
            "document ingested"
        );
        Ok(IngestReceipt {
            ok: true,
            document_id: identity.document_id,
            document_hash: identity.content_hash,
            filename: filename.to_string(),
            chunks: indexed,
        })
    }

    /// Embed chunk texts and upsert one point per chunk.
    async fn upsert_vectors(
        &self,
        texts: &[String],
        metas: Vec<Map<String, Value>>,
    ) -> Result<usize, RagError> {
        if texts.len() != metas.len() {
            return Err(RagError::LengthMismatch {
                what: "chunks and metas",
                left: texts.len(),
                right: metas.len(),
            });
        }
        if texts.is_empty() {
            return Ok(0);
        }

        let vectors = self.registry.embeddings().embed(texts).await?;
        if vectors.len() != texts.len() {
            return Err(RagError::LengthMismatch {
                what: "chunks and embeddings",
                left: texts.len(),
                right: vectors.len(),
            });
        }

        let points = metas
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(i, (mut meta, vector))| {
                let chunk_id = meta
                    .get("chunk_id")
                    .and_then(Value::as_str)
                    .map_or_else(|| format!("missing:{i}"), str::to_string);
                let point_id = point_id_for(&chunk_id);
                meta.insert("chunk_id".into(), chunk_id.into());
                meta.insert("point_id".into(), point_id.clone().into());
                VectorPoint {
                    id: point_id,
                    vector,
                    payload: meta,
                }
            })
            .collect();

        self.registry.index().upsert(points).await?;
        Ok(texts.len())
    }
}

fn chunk_meta(
    chunk: &Chunk,
    identity: &DocumentIdentity,
    content_type: &str,
    document_size: usize,
) -> Map<String, Value> {
    let value = json!({
        "chunk_id": chunk.chunk_id,
        "chunk_index": chunk.chunk_index,
        "chunk_total": chunk.chunk_total,
        "filename": chunk.filename,
        "document_id": chunk.document_id,
        "heading": chunk.heading,
        "level": chunk.level,
        "span": [chunk.span.0, chunk.span.1],
        "document_sha256": identity.content_hash,
        "document_size": document_size,
        "content_type": content_type,
    });
    value.as_object().cloned().unwrap_or_default()
}
