//! Hybrid retrieval: embed the question, pull a wide candidate pool, and
//! re-rank locally.
//!
//! The backend's ordering is never trusted: hits are re-sorted by score
//! locally (stable, so backend order breaks ties) before truncation to
//! `top_k`. Hits whose payload lacks a chunk id are dropped — they cannot be
//! resolved to text later.

pub mod candidate;

use std::sync::Arc;

use serde_json::{Value, json};

use crate::capabilities::{CapabilityError, Embeddings, VectorIndex};
pub use candidate::{Candidate, UNKNOWN_ID};

/// `top_k` is clamped to this range.
pub const TOP_K_RANGE: (usize, usize) = (1, 20);

/// Dense retriever over an embedding provider and a vector index.
pub struct HybridRetriever {
    embeddings: Arc<dyn Embeddings>,
    index: Arc<dyn VectorIndex>,
    top_pool: usize,
}

impl HybridRetriever {
    #[must_use]
    pub fn new(embeddings: Arc<dyn Embeddings>, index: Arc<dyn VectorIndex>, top_pool: usize) -> Self {
        Self {
            embeddings,
            index,
            top_pool,
        }
    }

    /// Retrieve up to `top_k` candidates for `question`.
    ///
    /// Exactly one embed call and one search call per invocation; no
    /// retries. Capability failures propagate as `Err` for the caller to
    /// degrade on.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError`] when embedding or search fails, or when
    /// the embedding provider returns no vector.
    pub async fn search(
        &self,
        question: &str,
        top_k: usize,
    ) -> Result<Vec<Candidate>, CapabilityError> {
        let top_k = top_k.clamp(TOP_K_RANGE.0, TOP_K_RANGE.1);

        let vectors = self.embeddings.embed(&[question.to_string()]).await?;
        let query_vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| CapabilityError::Embedding("provider returned no vector".into()))?;

        let mut hits = self.index.search(&query_vector, self.top_pool).await?;
        // Stable sort: ties keep the backend's order.
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);

        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            let raw = json!({
                "id": hit.payload.get("chunk_id").cloned().unwrap_or(Value::Null),
                "payload": hit.payload,
                "score": hit.score,
            });
            let cand = Candidate::normalize(&raw);
            if cand.has_chunk_id() {
                results.push(cand);
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{SearchHit, VectorPoint};
    use async_trait::async_trait;
    use serde_json::Map;

    struct FixedEmbeddings;

    #[async_trait]
    impl Embeddings for FixedEmbeddings {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CapabilityError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    /// Returns a canned hit list, ignoring the query vector.
    struct CannedIndex {
        hits: Vec<SearchHit>,
    }

    #[async_trait]
    impl VectorIndex for CannedIndex {
        async fn upsert(&self, _points: Vec<VectorPoint>) -> Result<(), CapabilityError> {
            Ok(())
        }

        async fn search(
            &self,
            _vector: &[f32],
            limit: usize,
        ) -> Result<Vec<SearchHit>, CapabilityError> {
            let mut hits = self.hits.clone();
            hits.truncate(limit);
            Ok(hits)
        }
    }

    struct FailingIndex;

    #[async_trait]
    impl VectorIndex for FailingIndex {
        async fn upsert(&self, _points: Vec<VectorPoint>) -> Result<(), CapabilityError> {
            Ok(())
        }

        async fn search(
            &self,
            _vector: &[f32],
            _limit: usize,
        ) -> Result<Vec<SearchHit>, CapabilityError> {
            Err(CapabilityError::Index("connection refused".into()))
        }
    }

    fn hit(chunk_id: Option<&str>, score: f32) -> SearchHit {
        let mut payload = Map::new();
        if let Some(id) = chunk_id {
            payload.insert("chunk_id".into(), id.into());
        }
        SearchHit { payload, score }
    }

    fn retriever(hits: Vec<SearchHit>) -> HybridRetriever {
        HybridRetriever::new(Arc::new(FixedEmbeddings), Arc::new(CannedIndex { hits }), 24)
    }

    // 1. Backend order is not trusted: results come back score-descending.
    #[tokio::test]
    async fn resorts_descending() {
        let r = retriever(vec![hit(Some("low"), 0.1), hit(Some("high"), 0.9), hit(Some("mid"), 0.5)]);
        let out = r.search("q", 6).await.unwrap();
        let ids: Vec<&str> = out.iter().map(|c| c.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid", "low"]);
    }

    // 2. Equal scores keep first-seen order.
    #[tokio::test]
    async fn ties_keep_backend_order() {
        let r = retriever(vec![hit(Some("first"), 0.5), hit(Some("second"), 0.5)]);
        let out = r.search("q", 6).await.unwrap();
        let ids: Vec<&str> = out.iter().map(|c| c.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    // 3. top_k clamps to [1, 20].
    #[tokio::test]
    async fn top_k_clamps() {
        let many: Vec<SearchHit> = (0..24).map(|i| hit(Some(&format!("c{i}")), 1.0 - i as f32 / 100.0)).collect();
        let r = retriever(many.clone());
        assert_eq!(r.search("q", 0).await.unwrap().len(), 1);
        let r = retriever(many);
        assert_eq!(r.search("q", 1000).await.unwrap().len(), 20);
    }

    // 4. Hits without a chunk id are dropped after truncation.
    #[tokio::test]
    async fn drops_idless_hits() {
        let r = retriever(vec![hit(Some("kept"), 0.9), hit(None, 0.8), hit(Some("also"), 0.7)]);
        let out = r.search("q", 6).await.unwrap();
        let ids: Vec<&str> = out.iter().map(|c| c.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["kept", "also"]);
    }

    // 5. Index failure propagates for the caller to degrade on.
    #[tokio::test]
    async fn index_failure_propagates() {
        let r = HybridRetriever::new(Arc::new(FixedEmbeddings), Arc::new(FailingIndex), 24);
        assert!(r.search("q", 6).await.is_err());
    }

    // 6. Candidates carry the hit payload and score through.
    #[tokio::test]
    async fn payload_and_score_carried() {
        let mut payload = Map::new();
        payload.insert("chunk_id".into(), "9:2".into());
        payload.insert("filename".into(), "doc.md".into());
        let r = retriever(vec![SearchHit { payload, score: 0.42 }]);
        let out = r.search("q", 6).await.unwrap();
        assert_eq!(out[0].chunk_id, "9:2");
        assert_eq!(out[0].payload["filename"], "doc.md");
        assert!((out[0].score - 0.42).abs() < 1e-6);
    }
}
