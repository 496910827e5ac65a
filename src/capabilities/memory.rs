//! In-memory reference providers.
//!
//! Deterministic, dependency-free implementations of the embedding, index,
//! and store capabilities. They back the integration tests and give callers
//! a working pipeline before any real backend is wired in; none of them are
//! suitable for large corpora.

use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHasher};

use super::{
    CapabilityError, ChunkStore, Embeddings, SearchHit, StoredChunk, VectorIndex, VectorPoint,
};

// ── HashEmbeddings ─────────────────────────────────────────────────────

/// Bag-of-words hashing embeddings.
///
/// Lowercased whitespace tokens are hashed into `dim` buckets and the
/// resulting count vector is L2-normalized. Identical text always embeds to
/// the identical vector, which is what the determinism tests rely on.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbeddings {
    dim: usize,
}

impl Default for HashEmbeddings {
    fn default() -> Self {
        Self { dim: 384 }
    }
}

impl HashEmbeddings {
    /// # Panics
    ///
    /// Panics when `dim` is zero.
    #[must_use]
    pub fn new(dim: usize) -> Self {
        assert!(dim > 0, "embedding dimension must be positive");
        Self { dim }
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut buckets = vec![0.0f32; self.dim];
        for token in text.to_lowercase().split_whitespace() {
            let mut hasher = FxHasher::default();
            token.hash(&mut hasher);
            let slot = (hasher.finish() % self.dim as u64) as usize;
            buckets[slot] += 1.0;
        }
        let norm = buckets.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut buckets {
                *v /= norm;
            }
        }
        buckets
    }
}

#[async_trait]
impl Embeddings for HashEmbeddings {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CapabilityError> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }
}

// ── InMemoryVectorIndex ────────────────────────────────────────────────

/// Cosine-similarity index over an in-process point list.
#[derive(Default)]
pub struct InMemoryVectorIndex {
    points: RwLock<Vec<VectorPoint>>,
}

impl InMemoryVectorIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.read().is_empty()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, points: Vec<VectorPoint>) -> Result<(), CapabilityError> {
        let mut guard = self.points.write();
        for point in points {
            if let Some(existing) = guard.iter_mut().find(|p| p.id == point.id) {
                *existing = point;
            } else {
                guard.push(point);
            }
        }
        Ok(())
    }

    async fn search(
        &self,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchHit>, CapabilityError> {
        let guard = self.points.read();
        let mut hits: Vec<SearchHit> = guard
            .iter()
            .map(|p| SearchHit {
                payload: p.payload.clone(),
                score: cosine(vector, &p.vector),
            })
            .collect();
        // Stable sort: insertion order breaks score ties.
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }
}

// ── InMemoryChunkStore ─────────────────────────────────────────────────

/// Chunk-id keyed map of stored chunk records.
#[derive(Default)]
pub struct InMemoryChunkStore {
    records: RwLock<FxHashMap<String, StoredChunk>>,
}

impl InMemoryChunkStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl ChunkStore for InMemoryChunkStore {
    async fn get(&self, chunk_id: &str) -> Result<Option<StoredChunk>, CapabilityError> {
        Ok(self.records.read().get(chunk_id).cloned())
    }

    async fn bulk_put(&self, records: Vec<(String, StoredChunk)>) -> Result<(), CapabilityError> {
        let mut guard = self.records.write();
        for (id, record) in records {
            guard.insert(id, record);
        }
        Ok(())
    }
}
