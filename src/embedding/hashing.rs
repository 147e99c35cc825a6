//! Deterministic feature-hashing text embedder.
//!
//! Tokens and adjacent-token bigrams are hashed into a fixed-dimension
//! signed feature vector, then L2-normalized. No training phase: the same
//! text always embeds to the same vector for a given configuration, which
//! is what keeps index rebuilds idempotent.

use std::hash::{BuildHasher, Hash, Hasher};

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use crate::embedding::TextEmbedder;
use crate::error::Result;
use crate::vector::Vector;

// Fixed seeds: embeddings must be stable across processes so that a loaded
// snapshot stays comparable with freshly embedded queries.
const HASH_SEEDS: (u64, u64, u64, u64) = (
    0x9e37_79b9_7f4a_7c15,
    0x2545_f491_4f6c_dd1d,
    0x27d4_eb2f_1656_67c5,
    0x1656_67b1_9e37_79f9,
);

/// Configuration for the hashing embedder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashingEmbedderConfig {
    /// Output vector dimension.
    pub dimension: usize,
    /// Weight given to adjacent-token bigram features.
    pub bigram_weight: f32,
    /// Minimum token length to keep after stripping punctuation.
    pub min_token_len: usize,
}

impl Default for HashingEmbedderConfig {
    fn default() -> Self {
        Self {
            dimension: 256,
            bigram_weight: 0.5,
            min_token_len: 2,
        }
    }
}

/// Deterministic feature-hashing embedder.
pub struct HashingEmbedder {
    config: HashingEmbedderConfig,
    hasher: RandomState,
    model_name: String,
}

impl HashingEmbedder {
    /// Create a new hashing embedder with the given configuration.
    pub fn new(config: HashingEmbedderConfig) -> Self {
        let model_name = format!("feature-hashing-v1-d{}", config.dimension);
        let hasher = RandomState::with_seeds(
            HASH_SEEDS.0,
            HASH_SEEDS.1,
            HASH_SEEDS.2,
            HASH_SEEDS.3,
        );
        Self {
            config,
            hasher,
            model_name,
        }
    }

    /// Tokenize text into lowercase alphanumeric terms.
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split_whitespace()
            .map(|s| s.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|s| s.len() >= self.config.min_token_len)
            .map(|s| s.to_string())
            .collect()
    }

    fn accumulate(&self, feature: &str, weight: f32, data: &mut [f32]) {
        let mut hasher = self.hasher.build_hasher();
        feature.hash(&mut hasher);
        let hash = hasher.finish();

        let index = (hash % data.len() as u64) as usize;
        // One hash bit decides the sign, reducing collision bias.
        let sign = if hash & (1 << 63) == 0 { 1.0 } else { -1.0 };
        data[index] += sign * weight;
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(HashingEmbedderConfig::default())
    }
}

impl TextEmbedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vector> {
        let tokens = self.tokenize(text);
        let mut data = vec![0.0; self.config.dimension];

        for token in &tokens {
            self.accumulate(token, 1.0, &mut data);
        }
        for pair in tokens.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            self.accumulate(&bigram, self.config.bigram_weight, &mut data);
        }

        let mut vector = Vector::new(data);
        vector.normalize();
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::cosine_similarity;

    #[test]
    fn test_embedding_is_deterministic() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed("blue running shoe").unwrap();
        let b = embedder.embed("blue running shoe").unwrap();
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn test_embedding_is_normalized() {
        let embedder = HashingEmbedder::default();
        let vector = embedder.embed("lightweight trail running shoes").unwrap();
        assert_eq!(vector.dimension(), 256);
        assert!((vector.norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_shared_tokens_raise_similarity() {
        let embedder = HashingEmbedder::default();
        let shoe = embedder.embed("blue running shoe").unwrap();
        let query = embedder.embed("running shoe").unwrap();
        let unrelated = embedder.embed("stainless steel kettle").unwrap();

        let close = cosine_similarity(&query.data, &shoe.data).unwrap();
        let far = cosine_similarity(&query.data, &unrelated.data).unwrap();
        assert!(close > far);
        assert!(close > 0.3);
    }

    #[test]
    fn test_empty_text_embeds_to_zero_vector() {
        let embedder = HashingEmbedder::default();
        let vector = embedder.embed("").unwrap();
        assert_eq!(vector.norm(), 0.0);
    }

    #[test]
    fn test_short_tokens_dropped() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed("a tv").unwrap();
        let b = embedder.embed("tv").unwrap();
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn test_model_name_includes_dimension() {
        let embedder = HashingEmbedder::new(HashingEmbedderConfig {
            dimension: 64,
            ..Default::default()
        });
        assert_eq!(embedder.model_name(), "feature-hashing-v1-d64");
        assert_eq!(embedder.dimension(), 64);
    }
}
