//! Text embedding for the semantic search pipeline.
//!
//! The engine consumes embeddings through the [`TextEmbedder`] trait so that
//! local models, API-based services, or the built-in hashing embedder can
//! plug into the vector index interchangeably.

pub mod hashing;

pub use hashing::{HashingEmbedder, HashingEmbedderConfig};

use crate::error::{MercatoError, Result};
use crate::vector::Vector;

/// Trait for converting text to vector embeddings.
///
/// Implementations must be deterministic for a fixed model and must return
/// L2-normalized vectors, so that inner product equals cosine similarity.
pub trait TextEmbedder: Send + Sync {
    /// Generate an embedding vector from text.
    fn embed(&self, text: &str) -> Result<Vector>;

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;

    /// Get the model identity, recorded in index snapshots.
    fn model_name(&self) -> &str;

    /// Whether the embedder can currently serve requests.
    ///
    /// Checked once per call site; an unavailable embedder makes semantic
    /// search degrade to keyword search rather than fail.
    fn is_available(&self) -> bool {
        true
    }
}

/// An embedder that is permanently unavailable.
///
/// Null Object implementation used when no encoder is configured; every
/// embed call fails with a dependency error, and `is_available` reports
/// `false` so callers can degrade to keyword-only search up front.
#[derive(Debug, Default)]
pub struct UnavailableEmbedder;

impl UnavailableEmbedder {
    /// Create a new unavailable embedder.
    pub fn new() -> Self {
        Self
    }
}

impl TextEmbedder for UnavailableEmbedder {
    fn embed(&self, _text: &str) -> Result<Vector> {
        Err(MercatoError::unavailable("no text encoder configured"))
    }

    fn dimension(&self) -> usize {
        0
    }

    fn model_name(&self) -> &str {
        "unavailable"
    }

    fn is_available(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_embedder() {
        let embedder = UnavailableEmbedder::new();
        assert!(!embedder.is_available());
        assert_eq!(embedder.dimension(), 0);

        match embedder.embed("anything") {
            Err(MercatoError::DependencyUnavailable(_)) => {}
            other => panic!("Expected DependencyUnavailable, got {other:?}"),
        }
    }
}
