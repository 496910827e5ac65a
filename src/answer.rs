//! The question-answering pipeline.
//!
//! ```text
//!   question ──▶ retrieve ──▶ assemble ──▶ rerank ──▶ generate ──▶ reply
//!                   │             │           │            │
//!                   └──── degrade & continue (typed) ──────┘
//! ```
//!
//! The only terminal failure is an empty question. Every downstream stage
//! degrades instead of failing: retrieval errors become an empty candidate
//! set, assembly errors drop contexts, rerank errors keep retrieval order,
//! and generation errors (or empty answers) substitute the fallback
//! literal. Each recovery is logged and recorded on the reply as a
//! [`StageDegrade`] so callers can see exactly what was skipped.

use crate::assembly::{AssembledContext, ContextAssembler};
use crate::capabilities::CapabilityRegistry;
use crate::config::RagConfig;
use crate::prompt::{FALLBACK_ANSWER, build_user_prompt, system_instruction};
use crate::rerank::RerankStrategy;
use crate::retrieval::HybridRetriever;
use crate::types::{AnswerReply, RagError, Reference, StageDegrade};

/// End-to-end answer flow over a capability registry.
pub struct AnswerPipeline {
    registry: CapabilityRegistry,
    config: RagConfig,
    retriever: HybridRetriever,
    assembler: ContextAssembler,
    strategy: RerankStrategy,
}

impl AnswerPipeline {
    #[must_use]
    pub fn new(registry: CapabilityRegistry, config: RagConfig) -> Self {
        let retriever = HybridRetriever::new(
            registry.embeddings().clone(),
            registry.index().clone(),
            config.top_pool,
        );
        let assembler = ContextAssembler::new(registry.store().clone(), config.max_context_len);
        let strategy = RerankStrategy::from_registry(&registry);
        Self {
            registry,
            config,
            retriever,
            assembler,
            strategy,
        }
    }

    /// Answer a question.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyQuestion`] when the question is empty after
    /// trimming — the only terminal failure of this pipeline.
    pub async fn answer(&self, question: &str) -> Result<AnswerReply, RagError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::EmptyQuestion);
        }

        let mut degraded: Vec<StageDegrade> = Vec::new();

        // Retrieval: failure means answering without context.
        let candidates = match self.retriever.search(question, self.config.first_k).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(stage = "retrieval", error = %e, "continuing without candidates");
                degraded.push(StageDegrade::Retrieval(e.to_string()));
                Vec::new()
            }
        };

        // Assembly: failure drops contexts and references.
        let assembled = match self.assembler.assemble(&candidates).await {
            Ok(assembled) => assembled,
            Err(e) => {
                tracing::warn!(stage = "assembly", error = %e, "continuing without contexts");
                degraded.push(StageDegrade::Assembly(e.to_string()));
                AssembledContext::default()
            }
        };

        let instruction = system_instruction(self.config.prompt);

        // No usable context: still generate, with an instruction-only prompt.
        if assembled.contexts.is_empty() {
            let prompt = build_user_prompt(question, &[], &instruction);
            let answer = self.generate_or_fallback(&prompt, &mut degraded).await;
            return Ok(AnswerReply {
                answer,
                references: Vec::new(),
                degraded,
            });
        }

        // Rerank: failure keeps retrieval order.
        let order = match self.strategy.reorder(question, &assembled.contexts).await {
            Ok(order) => order,
            Err(e) => {
                tracing::warn!(stage = "rerank", error = %e, "keeping retrieval order");
                degraded.push(StageDegrade::Rerank(e.to_string()));
                RerankStrategy::identity_order(assembled.contexts.len())
            }
        };

        let k = self.config.final_k.min(order.len());
        let contexts: Vec<String> = order[..k]
            .iter()
            .map(|&i| assembled.contexts[i].clone())
            .collect();
        let references: Vec<Reference> = order[..k]
            .iter()
            .map(|&i| assembled.references[i].clone())
            .collect();

        let prompt = build_user_prompt(question, &contexts, &instruction);
        let answer = self.generate_or_fallback(&prompt, &mut degraded).await;

        Ok(AnswerReply {
            answer,
            references,
            degraded,
        })
    }

    async fn generate_or_fallback(
        &self,
        prompt: &str,
        degraded: &mut Vec<StageDegrade>,
    ) -> String {
        match self.registry.generator().generate(prompt).await {
            Ok(answer) => {
                let trimmed = answer.trim();
                if trimmed.is_empty() {
                    degraded.push(StageDegrade::Generation("empty answer".into()));
                    FALLBACK_ANSWER.to_string()
                } else {
                    trimmed.to_string()
                }
            }
            Err(e) => {
                tracing::warn!(stage = "generation", error = %e, "using fallback answer");
                degraded.push(StageDegrade::Generation(e.to_string()));
                FALLBACK_ANSWER.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::memory::{HashEmbeddings, InMemoryChunkStore, InMemoryVectorIndex};
    use crate::capabilities::{CapabilityError, Generator};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, CapabilityError> {
            Ok("an answer".into())
        }
    }

    fn pipeline() -> AnswerPipeline {
        let registry = CapabilityRegistry::builder()
            .embeddings(Arc::new(HashEmbeddings::new(32)))
            .index(Arc::new(InMemoryVectorIndex::new()))
            .store(Arc::new(InMemoryChunkStore::new()))
            .generator(Arc::new(EchoGenerator))
            .build();
        AnswerPipeline::new(registry, RagConfig::default())
    }

    // 1. Empty or whitespace questions are the one terminal error.
    #[tokio::test]
    async fn empty_question_is_terminal() {
        let p = pipeline();
        assert!(matches!(p.answer("").await, Err(RagError::EmptyQuestion)));
        assert!(matches!(p.answer("   \n ").await, Err(RagError::EmptyQuestion)));
    }

    // 2. An empty index still yields an answer with no references.
    #[tokio::test]
    async fn empty_index_answers_without_references() {
        let reply = pipeline().answer("anything?").await.unwrap();
        assert_eq!(reply.answer, "an answer");
        assert!(reply.references.is_empty());
        assert!(reply.degraded.is_empty());
    }
}
