//! Deterministic document chunking, hybrid retrieval, and context assembly
//! for retrieval-augmented generation.
//!
//! ragweld is the core of a RAG service with the transport peeled off:
//! it owns the text processing and the retrieval ordering, and talks to
//! everything stateful (embeddings, vector index, chunk store, generator,
//! reranker) through narrow async traits.
//!
//! ```text
//!                 ┌────────────────────────────────────────────┐
//!   document ────▶│ DocumentChunker                            │
//!                 │  normalize ▶ sections ▶ units ▶ packing    │
//!                 └───────────────┬────────────────────────────┘
//!                                 ▼
//!                 DocumentIngestor ──▶ ChunkStore + VectorIndex
//!
//!   question ────▶ AnswerPipeline
//!                   retrieve ▶ assemble ▶ rerank ▶ generate
//!                   (every stage degrades instead of failing)
//! ```
//!
//! Determinism is the load-bearing property: the same document bytes always
//! produce the same chunks, ids, and vector points, and the same question
//! against the same index always produces the same ordering.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use ragweld::capabilities::CapabilityRegistry;
//! use ragweld::capabilities::memory::{HashEmbeddings, InMemoryChunkStore, InMemoryVectorIndex};
//! use ragweld::{AnswerPipeline, DocumentChunker, DocumentIngestor, RagConfig};
//! # use ragweld::capabilities::{CapabilityError, Generator};
//! # struct StaticGenerator;
//! # #[async_trait::async_trait]
//! # impl Generator for StaticGenerator {
//! #     async fn generate(&self, _prompt: &str) -> Result<String, CapabilityError> {
//! #         Ok("answer".into())
//! #     }
//! # }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = CapabilityRegistry::builder()
//!     .embeddings(Arc::new(HashEmbeddings::default()))
//!     .index(Arc::new(InMemoryVectorIndex::new()))
//!     .store(Arc::new(InMemoryChunkStore::new()))
//!     .generator(Arc::new(StaticGenerator))
//!     .build();
//!
//! let ingestor = DocumentIngestor::new(registry.clone(), DocumentChunker::with_defaults());
//! let receipt = ingestor
//!     .ingest("guide.md", "text/markdown", include_bytes!("../README.md"))
//!     .await?;
//! println!("indexed {} chunks", receipt.chunks);
//!
//! let pipeline = AnswerPipeline::new(registry, RagConfig::default());
//! let reply = pipeline.answer("What does the guide cover?").await?;
//! println!("{}", reply.answer);
//! # Ok(())
//! # }
//! ```

pub mod answer;
pub mod assembly;
pub mod capabilities;
pub mod chunking;
pub mod config;
pub mod ingest;
pub mod prompt;
pub mod rerank;
pub mod retrieval;
pub mod types;

pub use answer::AnswerPipeline;
pub use assembly::{AssembledContext, ContextAssembler};
pub use capabilities::{CapabilityError, CapabilityRegistry, CapabilityRegistryBuilder};
pub use chunking::{ChunkerConfig, DocumentChunker};
pub use config::{ConfigError, RagConfig};
pub use ingest::{DocumentIdentity, DocumentIngestor, document_identity};
pub use prompt::{FALLBACK_ANSWER, PromptOptions};
pub use rerank::RerankStrategy;
pub use retrieval::{Candidate, HybridRetriever};
pub use types::{AnswerReply, Chunk, IngestReceipt, RagError, Reference, StageDegrade};
