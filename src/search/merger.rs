//! Merging keyword and semantic result sets into one ranking.

use ahash::AHashMap;

use crate::catalog::CatalogItem;
use crate::search::config::HybridConfig;
use crate::search::semantic::SemanticMatch;
use crate::search::types::{SearchCandidate, SearchSource};

/// Merges the two independent rankings.
///
/// Keyword relevance scores are min-max normalized against the best score
/// in the list so they combine on the same [0, 1] scale as similarities.
/// Each list contributes a positional term `1 - rank/N`; a candidate found
/// by both methods keeps the better of its two positions and gets the
/// agreement boost.
pub struct HybridMerger {
    config: HybridConfig,
}

impl HybridMerger {
    /// Create a merger with the given configuration.
    pub fn new(config: HybridConfig) -> Self {
        Self { config }
    }

    /// Combine both rankings into one list, sorted by combined score
    /// descending and truncated to `limit`.
    pub fn merge(
        &self,
        keyword: Vec<(CatalogItem, f32)>,
        semantic: Vec<SemanticMatch>,
        limit: usize,
    ) -> Vec<SearchCandidate> {
        let semantic_weight = self.config.semantic_weight.clamp(0.0, 1.0);
        let keyword_weight = 1.0 - semantic_weight;

        let keyword_max = keyword
            .iter()
            .map(|(_, score)| *score)
            .fold(0.0_f32, f32::max);
        let keyword_len = keyword.len();
        let semantic_len = semantic.len();

        let mut merged: AHashMap<u64, SearchCandidate> = AHashMap::new();

        for (rank, (item, score)) in keyword.into_iter().enumerate() {
            let normalized = if keyword_max > 0.0 {
                score / keyword_max
            } else {
                0.0
            };
            let mut candidate = SearchCandidate::from_keyword(item, normalized);
            candidate.position_score = position_score(rank, keyword_len);
            merged.insert(candidate.item.id, candidate);
        }

        for (rank, entry) in semantic.into_iter().enumerate() {
            let position = position_score(rank, semantic_len);
            match merged.get_mut(&entry.item.id) {
                Some(existing) => {
                    existing.semantic_score = entry.similarity;
                    existing.position_score = existing.position_score.max(position);
                    existing.search_source = SearchSource::Both;
                }
                None => {
                    let mut candidate =
                        SearchCandidate::from_semantic(entry.item, entry.similarity);
                    candidate.position_score = position;
                    merged.insert(candidate.item.id, candidate);
                }
            }
        }

        let mut candidates: Vec<SearchCandidate> = merged.into_values().collect();
        for candidate in &mut candidates {
            let mut combined = semantic_weight * candidate.semantic_score
                + keyword_weight * candidate.keyword_score
                + self.config.position_weight * candidate.position_score;
            if candidate.search_source == SearchSource::Both {
                combined *= self.config.both_source_boost;
            }
            candidate.combined_score = combined;
        }

        candidates.sort_by(|a, b| {
            b.combined_score
                .partial_cmp(&a.combined_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(limit);
        candidates
    }
}

fn position_score(rank: usize, len: usize) -> f32 {
    if len == 0 {
        return 0.0;
    }
    1.0 - (rank as f32 / len as f32)
}
