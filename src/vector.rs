//! Dense vector representation and similarity calculation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{MercatoError, Result};

/// Metadata key used to store the source text a vector was embedded from.
pub const SOURCE_TEXT_METADATA_KEY: &str = "source_text";

/// Metadata key used to store the time a vector was embedded.
pub const UPDATED_AT_METADATA_KEY: &str = "updated_at";

/// A dense vector representation for similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    /// The vector dimensions as floating point values.
    pub data: Vec<f32>,
    /// Optional metadata associated with this vector.
    pub metadata: HashMap<String, String>,
}

impl Vector {
    /// Create a new vector with the given dimensions.
    pub fn new(data: Vec<f32>) -> Self {
        Self {
            data,
            metadata: HashMap::new(),
        }
    }

    /// Get the dimensionality of this vector.
    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    /// Calculate the L2 norm (magnitude) of this vector.
    pub fn norm(&self) -> f32 {
        self.data.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Normalize this vector to unit length.
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for value in &mut self.data {
                *value /= norm;
            }
        }
    }

    /// Store the source text this vector was embedded from.
    pub fn set_source_text<T: Into<String>>(&mut self, text: T) {
        self.metadata
            .insert(SOURCE_TEXT_METADATA_KEY.to_string(), text.into());
    }

    /// Convenience accessor for the stored source text.
    pub fn source_text(&self) -> Option<&str> {
        self.metadata
            .get(SOURCE_TEXT_METADATA_KEY)
            .map(|s| s.as_str())
    }

    /// Validate that this vector has the expected dimension.
    pub fn validate_dimension(&self, expected_dim: usize) -> Result<()> {
        if self.data.len() != expected_dim {
            return Err(MercatoError::index(format!(
                "Vector dimension mismatch: expected {}, got {}",
                expected_dim,
                self.data.len()
            )));
        }
        Ok(())
    }

    /// Check if this vector contains any NaN or infinite values.
    pub fn is_valid(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }
}

/// Calculate cosine similarity between two vectors.
///
/// Returns a value in [-1, 1]; zero vectors yield 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(MercatoError::index(
            "Vector dimensions must match for similarity calculation".to_string(),
        ));
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        Ok(0.0)
    } else {
        Ok(dot_product / (norm_a * norm_b))
    }
}
