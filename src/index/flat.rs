//! Flat (exhaustive-scan) vector index.

use ahash::AHashSet;
use chrono::{DateTime, Utc};

use crate::error::{MercatoError, Result};
use crate::index::IndexStats;
use crate::vector::{Vector, cosine_similarity};

/// A flat vector index: an ordered vector collection plus a parallel
/// product-id list.
///
/// Invariant: `product_ids.len() == vectors.len()` at all times. Removal is
/// a soft delete — the id is tombstoned and its stale vector stays in place
/// until [`FlatVectorIndex::compact`] or a rebuild drops it.
#[derive(Debug, Clone)]
pub struct FlatVectorIndex {
    dimension: usize,
    model_name: String,
    vectors: Vec<Vector>,
    product_ids: Vec<u64>,
    tombstones: AHashSet<u64>,
    last_updated: DateTime<Utc>,
}

impl FlatVectorIndex {
    /// Create an empty index for the given encoder model.
    pub fn new(dimension: usize, model_name: &str) -> Self {
        Self {
            dimension,
            model_name: model_name.to_string(),
            vectors: Vec::new(),
            product_ids: Vec::new(),
            tombstones: AHashSet::new(),
            last_updated: Utc::now(),
        }
    }

    /// Reassemble an index from persisted parts.
    pub(crate) fn from_parts(
        dimension: usize,
        model_name: String,
        vectors: Vec<Vector>,
        product_ids: Vec<u64>,
        last_updated: DateTime<Utc>,
    ) -> Self {
        debug_assert_eq!(vectors.len(), product_ids.len());
        Self {
            dimension,
            model_name,
            vectors,
            product_ids,
            tombstones: AHashSet::new(),
            last_updated,
        }
    }

    /// Number of live (non-tombstoned) entries.
    pub fn len(&self) -> usize {
        self.product_ids.len() - self.tombstones.len()
    }

    /// Whether the index has no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of soft-deleted entries awaiting compaction.
    pub fn tombstone_count(&self) -> usize {
        self.tombstones.len()
    }

    /// Embedding dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Encoder model identity.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Time of the last mutation.
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Whether a product is live in the index.
    pub fn contains(&self, product_id: u64) -> bool {
        !self.tombstones.contains(&product_id) && self.product_ids.contains(&product_id)
    }

    /// Add or replace a product embedding.
    ///
    /// Product ids are unique: adding an id that is already present
    /// replaces its vector in place, and adding a tombstoned id revives it.
    pub fn add(&mut self, vector: Vector, product_id: u64) -> Result<()> {
        vector.validate_dimension(self.dimension)?;
        if !vector.is_valid() {
            return Err(MercatoError::index(format!(
                "Vector for product {product_id} contains non-finite values"
            )));
        }

        if let Some(position) = self.product_ids.iter().position(|&id| id == product_id) {
            self.vectors[position] = vector;
            self.tombstones.remove(&product_id);
        } else {
            self.vectors.push(vector);
            self.product_ids.push(product_id);
        }

        self.last_updated = Utc::now();
        debug_assert_eq!(self.vectors.len(), self.product_ids.len());
        Ok(())
    }

    /// Find the most similar live entries.
    ///
    /// Returns at most `min(k, len())` `(product_id, similarity)` pairs,
    /// all with similarity >= `threshold` (clamped to [0, 1]), ordered by
    /// similarity descending.
    pub fn search(&self, query: &[f32], k: usize, threshold: f32) -> Result<Vec<(u64, f32)>> {
        let threshold = threshold.clamp(0.0, 1.0);
        let mut matches = Vec::new();

        for (vector, &product_id) in self.vectors.iter().zip(self.product_ids.iter()) {
            if self.tombstones.contains(&product_id) {
                continue;
            }

            let similarity = cosine_similarity(query, &vector.data)?;
            if similarity >= threshold {
                matches.push((product_id, similarity));
            }
        }

        matches.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(k);
        Ok(matches)
    }

    /// Soft-delete a product. The stale vector stays until compaction.
    ///
    /// Returns `true` if the product was live.
    pub fn remove(&mut self, product_id: u64) -> bool {
        if !self.product_ids.contains(&product_id) || self.tombstones.contains(&product_id) {
            return false;
        }
        self.tombstones.insert(product_id);
        self.last_updated = Utc::now();
        true
    }

    /// Drop tombstoned entries, shrinking both parallel lists together.
    pub fn compact(&mut self) {
        if self.tombstones.is_empty() {
            return;
        }

        let mut vectors = Vec::with_capacity(self.len());
        let mut product_ids = Vec::with_capacity(self.len());
        for (vector, product_id) in self.vectors.drain(..).zip(self.product_ids.drain(..)) {
            if !self.tombstones.contains(&product_id) {
                vectors.push(vector);
                product_ids.push(product_id);
            }
        }

        self.vectors = vectors;
        self.product_ids = product_ids;
        self.tombstones.clear();
        self.last_updated = Utc::now();
        debug_assert_eq!(self.vectors.len(), self.product_ids.len());
    }

    /// Live `(product_id, vector)` entries, in insertion order.
    pub fn live_entries(&self) -> impl Iterator<Item = (u64, &Vector)> {
        self.product_ids
            .iter()
            .zip(self.vectors.iter())
            .filter(|(id, _)| !self.tombstones.contains(id))
            .map(|(&id, vector)| (id, vector))
    }

    /// Summary statistics.
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_products: self.len(),
            embedding_dimension: self.dimension,
            model_name: self.model_name.clone(),
            last_updated: self.last_updated,
            tombstones: self.tombstones.len(),
        }
    }
}
