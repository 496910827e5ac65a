//! Optional rerank pass between retrieval and generation.
//!
//! [`RerankStrategy`] produces an index permutation over the assembled
//! contexts. The identity strategy is the default and the fallback: when a
//! scorer fails, the caller substitutes [`RerankStrategy::identity_order`]
//! and records the degrade — retrieval order is always a valid answer
//! ordering.

use std::sync::Arc;

use crate::capabilities::{CapabilityError, CapabilityRegistry, RerankScorer};

/// Context ordering strategy.
#[derive(Clone)]
pub enum RerankStrategy {
    /// Keep retrieval order.
    Identity,
    /// Score with a cross-encoder and sort descending (stable, so ties keep
    /// retrieval order).
    Scored(Arc<dyn RerankScorer>),
}

impl RerankStrategy {
    /// Strategy for a registry: scored when a reranker is registered,
    /// identity otherwise.
    #[must_use]
    pub fn from_registry(registry: &CapabilityRegistry) -> Self {
        match registry.reranker() {
            Some(scorer) => Self::Scored(Arc::clone(scorer)),
            None => Self::Identity,
        }
    }

    /// The permutation `[0, 1, .., n-1]`.
    #[must_use]
    pub fn identity_order(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    /// Compute the context ordering for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError`] when the scorer fails or returns a score
    /// list that is not index-aligned with `contexts`. The identity
    /// strategy never errors.
    pub async fn reorder(
        &self,
        query: &str,
        contexts: &[String],
    ) -> Result<Vec<usize>, CapabilityError> {
        match self {
            Self::Identity => Ok(Self::identity_order(contexts.len())),
            Self::Scored(scorer) => {
                let scores = scorer.score(query, contexts).await?;
                if scores.len() != contexts.len() {
                    return Err(CapabilityError::Rerank(format!(
                        "expected {} scores, got {}",
                        contexts.len(),
                        scores.len()
                    )));
                }
                let mut order = Self::identity_order(contexts.len());
                order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
                Ok(order)
            }
        }
    }
}
