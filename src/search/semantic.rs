//! Semantic (embedding-similarity) search.

use log::debug;

use crate::catalog::{CatalogItem, CatalogReader};
use crate::error::Result;
use crate::index::IndexManager;

/// A catalog item with its embedding similarity to the query.
#[derive(Debug, Clone)]
pub struct SemanticMatch {
    /// Snapshot of the catalog item.
    pub item: CatalogItem,
    /// Cosine similarity to the query embedding.
    pub similarity: f32,
}

/// Run a semantic search: embed the query, search the vector index, then
/// load each match from the catalog.
///
/// Index membership alone is not trusted: an id whose catalog record has
/// vanished (deleted or deactivated since the last rebuild) is dropped
/// here, so stale index entries never reach a response.
pub fn semantic_search(
    catalog: &dyn CatalogReader,
    index: &IndexManager,
    query: &str,
    k: usize,
    threshold: f32,
) -> Result<Vec<SemanticMatch>> {
    let hits = index.search(query, k, threshold)?;

    let mut matches = Vec::with_capacity(hits.len());
    for (product_id, similarity) in hits {
        match catalog.get_product(product_id)? {
            Some(item) => matches.push(SemanticMatch { item, similarity }),
            None => {
                debug!("dropping stale index entry for product {product_id}");
            }
        }
    }

    // Index results are already similarity-descending; catalog loading
    // preserves that order.
    Ok(matches)
}
