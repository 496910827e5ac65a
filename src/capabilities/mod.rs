//! Capability seams between the retrieval core and its backends.
//!
//! ```text
//!   DocumentIngestor ──▶ ChunkStore      (durable chunk text + meta)
//!          │
//!          └──────────▶ Embeddings ──▶ VectorIndex
//!
//!   AnswerPipeline ───▶ Embeddings / VectorIndex / ChunkStore
//!          │
//!          ├──────────▶ RerankScorer    (optional)
//!          └──────────▶ Generator
//! ```
//!
//! Every backend arrives through one of these traits; the crate holds no
//! global state. A [`CapabilityRegistry`] is built once at startup and
//! shared by `Arc`, so there is no lazy construction to race on.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Failure of an external capability. The message carries whatever the
/// backend reported; the variant says which seam failed.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("embedding provider failed: {0}")]
    Embedding(String),

    #[error("vector index failed: {0}")]
    Index(String),

    #[error("chunk store failed: {0}")]
    Store(String),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("rerank scoring failed: {0}")]
    Rerank(String),
}

// ── Wire shapes ────────────────────────────────────────────────────────

/// One scored hit returned by a vector search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Opaque payload stored at upsert time.
    pub payload: Map<String, Value>,
    /// Backend similarity score, higher is better.
    pub score: f32,
}

/// One vector point to upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: Map<String, Value>,
}

/// A durable chunk record: text plus its metadata map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChunk {
    pub text: String,
    pub meta: Map<String, Value>,
}

impl StoredChunk {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            meta: Map::new(),
        }
    }

    /// Attach a metadata field.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }
}

// ── Capability traits ──────────────────────────────────────────────────

/// Text embedding provider.
#[async_trait]
pub trait Embeddings: Send + Sync {
    /// Embed each text; the result is index-aligned with `texts`.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CapabilityError>;
}

/// Vector search backend.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace points by id.
    async fn upsert(&self, points: Vec<VectorPoint>) -> Result<(), CapabilityError>;

    /// Return up to `limit` hits for `vector`. Ordering is backend-defined;
    /// callers re-sort locally.
    async fn search(&self, vector: &[f32], limit: usize)
    -> Result<Vec<SearchHit>, CapabilityError>;
}

/// Durable chunk text store.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    async fn get(&self, chunk_id: &str) -> Result<Option<StoredChunk>, CapabilityError>;

    async fn bulk_put(&self, records: Vec<(String, StoredChunk)>) -> Result<(), CapabilityError>;
}

/// Answer generator (LLM or otherwise).
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, CapabilityError>;
}

/// Cross-encoder style relevance scorer.
#[async_trait]
pub trait RerankScorer: Send + Sync {
    /// One score per document, index-aligned with `documents`.
    async fn score(&self, query: &str, documents: &[String])
    -> Result<Vec<f32>, CapabilityError>;
}

// ── CapabilityRegistry ─────────────────────────────────────────────────

/// Shared handle bundle for every external capability.
///
/// Built once with [`CapabilityRegistryBuilder`], then cloned (cheaply, all
/// fields are `Arc`) into whichever pipeline needs it. The reranker is the
/// only optional capability.
#[derive(Clone)]
pub struct CapabilityRegistry {
    embeddings: Arc<dyn Embeddings>,
    index: Arc<dyn VectorIndex>,
    store: Arc<dyn ChunkStore>,
    generator: Arc<dyn Generator>,
    reranker: Option<Arc<dyn RerankScorer>>,
}

impl CapabilityRegistry {
    #[must_use]
    pub fn builder() -> CapabilityRegistryBuilder {
        CapabilityRegistryBuilder::default()
    }

    #[must_use]
    pub fn embeddings(&self) -> &Arc<dyn Embeddings> {
        &self.embeddings
    }

    #[must_use]
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn ChunkStore> {
        &self.store
    }

    #[must_use]
    pub fn generator(&self) -> &Arc<dyn Generator> {
        &self.generator
    }

    #[must_use]
    pub fn reranker(&self) -> Option<&Arc<dyn RerankScorer>> {
        self.reranker.as_ref()
    }
}

/// Builder for [`CapabilityRegistry`].
#[derive(Default)]
pub struct CapabilityRegistryBuilder {
    embeddings: Option<Arc<dyn Embeddings>>,
    index: Option<Arc<dyn VectorIndex>>,
    store: Option<Arc<dyn ChunkStore>>,
    generator: Option<Arc<dyn Generator>>,
    reranker: Option<Arc<dyn RerankScorer>>,
}

impl CapabilityRegistryBuilder {
    #[must_use]
    pub fn embeddings(mut self, embeddings: Arc<dyn Embeddings>) -> Self {
        self.embeddings = Some(embeddings);
        self
    }

    #[must_use]
    pub fn index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    #[must_use]
    pub fn store(mut self, store: Arc<dyn ChunkStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    #[must_use]
    pub fn reranker(mut self, reranker: Arc<dyn RerankScorer>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// Build, returning `None` when a required capability is missing.
    #[must_use]
    pub fn try_build(self) -> Option<CapabilityRegistry> {
        Some(CapabilityRegistry {
            embeddings: self.embeddings?,
            index: self.index?,
            store: self.store?,
            generator: self.generator?,
            reranker: self.reranker,
        })
    }

    /// Build the registry.
    ///
    /// # Panics
    ///
    /// Panics when a required capability (everything except the reranker)
    /// was not provided. Use [`Self::try_build`] to handle that case.
    #[must_use]
    pub fn build(self) -> CapabilityRegistry {
        self.try_build()
            .expect("embeddings, index, store, and generator are required")
    }
}
