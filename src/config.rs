//! Pipeline configuration.
//!
//! Compiled defaults match the production tuning of the retrieval flow;
//! every knob can be overridden with a `RAGWELD_*` environment variable
//! (a `.env` file is honored when present).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chunking::ChunkerConfig;
use crate::prompt::PromptOptions;

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable parsing error.
    #[error("failed to parse environment variable {key}: {message}")]
    EnvParse {
        /// Environment variable key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Retrieval and answer pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RagConfig {
    /// Candidate pool width requested from the vector index. Default: 24.
    pub top_pool: usize,
    /// Candidates retrieved before rerank. Default: 12.
    pub first_k: usize,
    /// Contexts kept after rerank. Default: 6.
    pub final_k: usize,
    /// Per-context character cap. Default: 4000.
    pub max_context_len: usize,
    /// Dimension for the hashing embedding fallback. Default: 384.
    pub embed_dim: usize,
    /// Chunking parameters.
    pub chunker: ChunkerConfig,
    /// System-instruction toggles.
    pub prompt: PromptOptions,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_pool: 24,
            first_k: 12,
            final_k: 6,
            max_context_len: 4000,
            embed_dim: 384,
            chunker: ChunkerConfig::default(),
            prompt: PromptOptions::default(),
        }
    }
}

impl RagConfig {
    /// Create a config with compiled defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `RAGWELD_*` environment variables.
    ///
    /// Recognized keys: `RAGWELD_TOP_POOL`, `RAGWELD_FIRST_K`,
    /// `RAGWELD_FINAL_K`, `RAGWELD_MAX_CONTEXT_LEN`, `RAGWELD_EMBED_DIM`,
    /// `RAGWELD_CHUNK_SIZE`, `RAGWELD_OVERLAP`, `RAGWELD_STRIP_MARKUP`,
    /// `RAGWELD_MARKDOWN_AWARE`, `RAGWELD_PROMPT_STRICT`,
    /// `RAGWELD_PROMPT_CITE`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EnvParse`] when a set variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        override_var("RAGWELD_TOP_POOL", &mut config.top_pool)?;
        override_var("RAGWELD_FIRST_K", &mut config.first_k)?;
        override_var("RAGWELD_FINAL_K", &mut config.final_k)?;
        override_var("RAGWELD_MAX_CONTEXT_LEN", &mut config.max_context_len)?;
        override_var("RAGWELD_EMBED_DIM", &mut config.embed_dim)?;
        override_var("RAGWELD_CHUNK_SIZE", &mut config.chunker.chunk_size)?;
        override_var("RAGWELD_OVERLAP", &mut config.chunker.overlap)?;
        override_var("RAGWELD_STRIP_MARKUP", &mut config.chunker.strip_markup)?;
        override_var("RAGWELD_MARKDOWN_AWARE", &mut config.chunker.markdown_aware)?;
        override_var("RAGWELD_PROMPT_STRICT", &mut config.prompt.strict)?;
        override_var("RAGWELD_PROMPT_CITE", &mut config.prompt.cite)?;
        Ok(config)
    }
}

fn override_var<T: std::str::FromStr>(key: &str, slot: &mut T) -> Result<(), ConfigError>
where
    T::Err: std::fmt::Display,
{
    if let Ok(raw) = std::env::var(key) {
        *slot = raw.parse().map_err(|e: T::Err| ConfigError::EnvParse {
            key: key.to_string(),
            message: e.to_string(),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tuning() {
        let config = RagConfig::default();
        assert_eq!(config.top_pool, 24);
        assert_eq!(config.first_k, 12);
        assert_eq!(config.final_k, 6);
        assert_eq!(config.max_context_len, 4000);
        assert_eq!(config.embed_dim, 384);
        assert_eq!(config.chunker.chunk_size, 800);
        assert_eq!(config.chunker.overlap, 120);
        assert!(config.prompt.strict);
        assert!(config.prompt.cite);
    }

    #[test]
    fn override_var_parses_and_reports() {
        let mut slot = 5usize;
        // Unset variable leaves the slot alone.
        override_var("RAGWELD_TEST_UNSET_KEY", &mut slot).unwrap();
        assert_eq!(slot, 5);
    }

    #[test]
    fn config_serializes_snake_case() {
        let json = serde_json::to_value(RagConfig::default()).unwrap();
        assert_eq!(json["top_pool"], 24);
        assert_eq!(json["chunker"]["chunk_size"], 800);
    }
}
