//! Token counting for the budget packer.
//!
//! [`TokenCounter`] is the capability seam: the packer only needs token
//! counts, never token text. The default is a cl100k tiktoken encoder
//! (behind the `tokenizer-tiktoken` feature); [`HashingTokenizer`] is the
//! dependency-free fallback that buckets surface tokens into a fixed id
//! space. Fallback ids cannot be decoded back to text — they exist purely
//! so counting behaves like a real tokenizer.

use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use rustc_hash::FxHasher;
use thiserror::Error;

/// Fallback token ids live in `[0, 2^20)`.
pub const FALLBACK_BUCKETS: u64 = 1 << 20;

/// Counting-only tokenizer interface.
pub trait TokenCounter: Send + Sync {
    /// Encode text into token ids.
    fn encode(&self, text: &str) -> Vec<u32>;

    /// Number of tokens in `text`.
    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }
}

#[derive(Debug, Error)]
pub enum TokenizerError {
    /// The tiktoken encoder tables failed to load.
    #[error("failed to load tiktoken encoder: {0}")]
    Load(String),
}

// ── Hashing fallback ───────────────────────────────────────────────────

/// Word-or-punctuation tokens hashed into [`FALLBACK_BUCKETS`] buckets.
///
/// `FxHasher` is seed-free, so counts are identical across processes and
/// platforms.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashingTokenizer;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+|[^\w\s]").unwrap());

impl TokenCounter for HashingTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        TOKEN_RE
            .find_iter(text)
            .map(|m| {
                let mut hasher = FxHasher::default();
                m.as_str().hash(&mut hasher);
                (hasher.finish() % FALLBACK_BUCKETS) as u32
            })
            .collect()
    }
}

// ── Tiktoken ───────────────────────────────────────────────────────────

/// cl100k_base tiktoken encoder.
#[cfg(feature = "tokenizer-tiktoken")]
pub struct TiktokenCounter {
    bpe: tiktoken_rs::CoreBPE,
}

#[cfg(feature = "tokenizer-tiktoken")]
impl TiktokenCounter {
    /// Load the cl100k_base encoding.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::Load`] if the encoder tables cannot be
    /// built.
    pub fn cl100k() -> Result<Self, TokenizerError> {
        tiktoken_rs::cl100k_base()
            .map(|bpe| Self { bpe })
            .map_err(|e| TokenizerError::Load(e.to_string()))
    }
}

#[cfg(feature = "tokenizer-tiktoken")]
impl TokenCounter for TiktokenCounter {
    fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe
            .encode_with_special_tokens(text)
            .into_iter()
            .map(|t| t as u32)
            .collect()
    }
}

/// Best available tokenizer: tiktoken when the feature is on and its tables
/// load, the hashing fallback otherwise.
pub fn default_tokenizer() -> Arc<dyn TokenCounter> {
    #[cfg(feature = "tokenizer-tiktoken")]
    {
        match TiktokenCounter::cl100k() {
            Ok(counter) => return Arc::new(counter),
            Err(e) => {
                tracing::warn!(error = %e, "tiktoken unavailable, using hashing fallback");
            }
        }
    }
    Arc::new(HashingTokenizer)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1. Same text, same ids.
    #[test]
    fn hashing_is_deterministic() {
        let tok = HashingTokenizer;
        assert_eq!(tok.encode("alpha beta, gamma."), tok.encode("alpha beta, gamma."));
    }

    // 2. Ids stay inside the bucket range.
    #[test]
    fn hashing_ids_within_buckets() {
        let tok = HashingTokenizer;
        for id in tok.encode("The quick brown fox; jumps! over 42 lazy dogs?") {
            assert!(u64::from(id) < FALLBACK_BUCKETS);
        }
    }

    // 3. Words and punctuation each count as one token.
    #[test]
    fn hashing_counts_words_and_punctuation() {
        let tok = HashingTokenizer;
        assert_eq!(tok.count("hello, world!"), 4);
        assert_eq!(tok.count(""), 0);
        assert_eq!(tok.count("   "), 0);
    }

    // 4. Different words land on different ids (for these inputs).
    #[test]
    fn hashing_distinguishes_tokens() {
        let tok = HashingTokenizer;
        assert_ne!(tok.encode("alpha"), tok.encode("beta"));
    }

    #[cfg(feature = "tokenizer-tiktoken")]
    #[test]
    fn tiktoken_counts_nonempty_text() {
        let tok = TiktokenCounter::cl100k().unwrap();
        assert!(tok.count("hello world") >= 1);
        assert_eq!(tok.count(""), 0);
    }
}
