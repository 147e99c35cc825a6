//! Vector index over product embeddings.
//!
//! [`FlatVectorIndex`] is the similarity structure itself; [`snapshot`]
//! persists it to disk; [`IndexManager`] owns the live index reference and
//! performs atomic build-then-swap rebuilds.

pub mod flat;
pub mod manager;
pub mod snapshot;

pub use flat::FlatVectorIndex;
pub use manager::IndexManager;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary statistics for the live vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of products currently searchable.
    pub total_products: usize,
    /// Embedding dimension of the index.
    pub embedding_dimension: usize,
    /// Identity of the encoder model the vectors came from.
    pub model_name: String,
    /// Time of the last successful add or rebuild.
    pub last_updated: DateTime<Utc>,
    /// Soft-deleted entries awaiting compaction.
    pub tombstones: usize,
}
