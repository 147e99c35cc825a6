//! Ownership and maintenance of the live vector index.
//!
//! The manager is the only component that mutates index state. Searches
//! clone the live `Arc` and never observe a partially-built index: rebuilds
//! construct a fresh index off to the side and atomically swap it in.

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;

use crate::catalog::CatalogItem;
use crate::embedding::TextEmbedder;
use crate::error::{MercatoError, Result};
use crate::index::snapshot;
use crate::index::{FlatVectorIndex, IndexStats};
use crate::vector::Vector;

/// Number of items embedded per rayon batch during rebuild.
const REBUILD_BATCH_SIZE: usize = 64;

/// Owns the live [`FlatVectorIndex`] and runs all maintenance operations.
pub struct IndexManager {
    embedder: Arc<dyn TextEmbedder>,
    active: RwLock<Arc<FlatVectorIndex>>,
    snapshot_dir: Option<PathBuf>,
    // Serializes the whole clone-mutate-swap-persist sequence of every
    // mutator, so concurrent mutations cannot base themselves on the same
    // index and lose each other's changes. Readers never take this.
    mutation_lock: Mutex<()>,
}

impl IndexManager {
    /// Create a manager with an empty index.
    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        let index = FlatVectorIndex::new(embedder.dimension(), embedder.model_name());
        Self {
            embedder,
            active: RwLock::new(Arc::new(index)),
            snapshot_dir: None,
            mutation_lock: Mutex::new(()),
        }
    }

    /// Create a manager that persists snapshots under `snapshot_dir`.
    ///
    /// An existing snapshot is loaded at startup; a corrupt or mismatched
    /// one is logged and discarded, and the manager starts empty so that
    /// search degrades to keyword-only rather than failing.
    pub fn with_snapshot_dir(embedder: Arc<dyn TextEmbedder>, snapshot_dir: PathBuf) -> Self {
        let index = match snapshot::load(&snapshot_dir) {
            Ok(Some(index)) => {
                if index.dimension() != embedder.dimension()
                    || index.model_name() != embedder.model_name()
                {
                    warn!(
                        "index snapshot was built by model '{}' (dim {}), expected '{}' (dim {}); starting empty",
                        index.model_name(),
                        index.dimension(),
                        embedder.model_name(),
                        embedder.dimension()
                    );
                    FlatVectorIndex::new(embedder.dimension(), embedder.model_name())
                } else {
                    debug!("loaded index snapshot with {} products", index.len());
                    index
                }
            }
            Ok(None) => FlatVectorIndex::new(embedder.dimension(), embedder.model_name()),
            Err(e) => {
                warn!("discarding corrupt index snapshot: {e}");
                FlatVectorIndex::new(embedder.dimension(), embedder.model_name())
            }
        };

        Self {
            embedder,
            active: RwLock::new(Arc::new(index)),
            snapshot_dir: Some(snapshot_dir),
            mutation_lock: Mutex::new(()),
        }
    }

    /// Whether the semantic leg can serve requests.
    pub fn is_available(&self) -> bool {
        self.embedder.is_available()
    }

    /// Whether the live index has no entries.
    pub fn is_empty(&self) -> bool {
        self.active.read().is_empty()
    }

    /// Snapshot of the live index reference.
    pub fn current(&self) -> Arc<FlatVectorIndex> {
        Arc::clone(&self.active.read())
    }

    /// Text a product is embedded from: name, short description, long
    /// description and tags. Kept stable so rebuilds are idempotent.
    pub fn source_text(item: &CatalogItem) -> String {
        let mut parts = vec![item.name.clone()];
        if !item.short_description.is_empty() {
            parts.push(item.short_description.clone());
        }
        if !item.description.is_empty() {
            parts.push(item.description.clone());
        }
        if !item.tags.is_empty() {
            parts.push(item.tags.join(" "));
        }
        parts.join(" ")
    }

    fn embed_item(&self, item: &CatalogItem) -> Result<Vector> {
        let source_text = Self::source_text(item);
        let mut vector = self.embedder.embed(&source_text)?;
        vector.set_source_text(source_text);
        vector
            .metadata
            .insert(
                crate::vector::UPDATED_AT_METADATA_KEY.to_string(),
                chrono::Utc::now().to_rfc3339(),
            );
        Ok(vector)
    }

    /// Rebuild the index from scratch over the given items.
    ///
    /// Items are embedded in batches; a single failed embedding is skipped
    /// with a warning and never aborts the rebuild. The new index replaces
    /// the live one only once fully built. Returns the number of products
    /// indexed.
    pub fn rebuild(&self, items: &[CatalogItem]) -> Result<usize> {
        if !self.embedder.is_available() {
            return Err(MercatoError::unavailable(
                "text encoder unavailable, cannot rebuild index",
            ));
        }
        let _guard = self.mutation_lock.lock();

        let embedded: Vec<(u64, Vector)> = items
            .par_chunks(REBUILD_BATCH_SIZE)
            .flat_map_iter(|chunk| {
                chunk.iter().filter_map(|item| match self.embed_item(item) {
                    Ok(vector) => Some((item.id, vector)),
                    Err(e) => {
                        warn!("skipping product {} during rebuild: {e}", item.id);
                        None
                    }
                })
            })
            .collect();

        let mut index = FlatVectorIndex::new(self.embedder.dimension(), self.embedder.model_name());
        for (product_id, vector) in embedded {
            index.add(vector, product_id)?;
        }
        let products_indexed = index.len();
        debug!(
            "rebuilt index: {products_indexed} of {} products embedded",
            items.len()
        );

        self.swap_and_persist(index);
        Ok(products_indexed)
    }

    /// Embed one product and add it to the live index.
    pub fn add_item(&self, item: &CatalogItem) -> Result<()> {
        if !self.embedder.is_available() {
            return Err(MercatoError::unavailable(
                "text encoder unavailable, cannot index product",
            ));
        }

        let vector = self.embed_item(item)?;
        let _guard = self.mutation_lock.lock();
        let mut index = (*self.current()).clone();
        index.add(vector, item.id)?;
        self.swap_and_persist(index);
        Ok(())
    }

    /// Soft-delete a product from the live index.
    ///
    /// Returns `true` if the product was indexed.
    pub fn remove(&self, product_id: u64) -> bool {
        let _guard = self.mutation_lock.lock();
        let mut index = (*self.current()).clone();
        let removed = index.remove(product_id);
        if removed {
            self.swap_and_persist(index);
        }
        removed
    }

    /// Compact tombstoned entries out of the live index.
    pub fn compact(&self) {
        let _guard = self.mutation_lock.lock();
        let mut index = (*self.current()).clone();
        if index.tombstone_count() == 0 {
            return;
        }
        index.compact();
        self.swap_and_persist(index);
    }

    /// Search the live index with raw query text.
    pub fn search(&self, query_text: &str, k: usize, threshold: f32) -> Result<Vec<(u64, f32)>> {
        if !self.embedder.is_available() {
            return Err(MercatoError::unavailable("text encoder unavailable"));
        }

        let query_vector = self.embedder.embed(query_text)?;
        // Search runs against a snapshot of the live reference, outside any
        // lock, so a concurrent rebuild cannot be observed mid-build.
        let index = self.current();
        index.search(&query_vector.data, k, threshold)
    }

    /// Summary statistics for the live index.
    pub fn stats(&self) -> IndexStats {
        self.active.read().stats()
    }

    // Callers must hold `mutation_lock`, which also keeps snapshot writes
    // in the same order as the swaps they belong to.
    fn swap_and_persist(&self, index: FlatVectorIndex) {
        let index = Arc::new(index);
        *self.active.write() = Arc::clone(&index);

        if let Some(ref dir) = self.snapshot_dir {
            if let Err(e) = snapshot::save(&index, dir) {
                // The in-memory index is already current; losing the
                // snapshot only costs a rebuild at next startup.
                warn!("failed to persist index snapshot: {e}");
            }
        }
    }
}
