//! Types and data structures for the search pipeline.

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogItem, PriceRange, ProductFilter};

/// Which retrieval strategy a search request uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Lexical AND-of-terms matching only.
    Keyword,
    /// Embedding similarity only.
    Semantic,
    /// Both, merged into one ranking.
    #[default]
    Hybrid,
}

/// Which retrieval method(s) produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSource {
    /// Found by keyword search only.
    Keyword,
    /// Found by semantic search only.
    Semantic,
    /// Found by both methods.
    Both,
}

/// A scored candidate in a search response.
///
/// Created per query and discarded after the response; the catalog remains
/// the source of truth for the item itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCandidate {
    /// Snapshot of the catalog item.
    pub item: CatalogItem,
    /// Normalized keyword relevance in [0, 1] (0 when not keyword-matched).
    pub keyword_score: f32,
    /// Embedding similarity in [0, 1] (0 when not semantically matched).
    pub semantic_score: f32,
    /// Positional stability term from the source ranking(s).
    pub position_score: f32,
    /// Final ranking score.
    pub combined_score: f32,
    /// Which method(s) found this candidate.
    pub search_source: SearchSource,
}

impl SearchCandidate {
    /// Candidate produced by the keyword leg.
    pub fn from_keyword(item: CatalogItem, keyword_score: f32) -> Self {
        Self {
            item,
            keyword_score,
            semantic_score: 0.0,
            position_score: 0.0,
            combined_score: keyword_score,
            search_source: SearchSource::Keyword,
        }
    }

    /// Candidate produced by the semantic leg.
    pub fn from_semantic(item: CatalogItem, similarity: f32) -> Self {
        Self {
            item,
            keyword_score: 0.0,
            semantic_score: similarity,
            position_score: 0.0,
            combined_score: similarity,
            search_source: SearchSource::Semantic,
        }
    }
}

/// A search request at the engine boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text query. Required.
    pub query: String,
    /// Retrieval strategy.
    pub mode: SearchMode,
    /// 1-based page number.
    pub page: usize,
    /// Results per page.
    pub per_page: usize,
    /// Structured constraints applied as hard filters.
    pub filter: ProductFilter,
    /// User to personalize for, if any.
    pub user_id: Option<u64>,
}

impl SearchRequest {
    /// Create a hybrid-mode request with default pagination.
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            mode: SearchMode::Hybrid,
            page: 1,
            per_page: 20,
            filter: ProductFilter::default(),
            user_id: None,
        }
    }

    /// Set the retrieval mode.
    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set pagination.
    pub fn with_page(mut self, page: usize, per_page: usize) -> Self {
        self.page = page;
        self.per_page = per_page;
        self
    }

    /// Set structured filters.
    pub fn with_filter(mut self, filter: ProductFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Personalize results for a user.
    pub fn with_user(mut self, user_id: u64) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// Pagination info for a response page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page number.
    pub page: usize,
    /// Results per page.
    pub per_page: usize,
    /// Total matching candidates before paging.
    pub total_items: usize,
    /// Total pages.
    pub total_pages: usize,
}

impl Pagination {
    /// Compute pagination for a result set.
    pub fn new(page: usize, per_page: usize, total_items: usize) -> Self {
        let per_page = per_page.max(1);
        let total_pages = total_items.div_ceil(per_page);
        Self {
            page: page.max(1),
            per_page,
            total_items,
            total_pages,
        }
    }
}

/// Diagnostic metadata attached to every search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMetadata {
    /// The query as received.
    pub query: String,
    /// Retrieval strategy used.
    pub mode: SearchMode,
    /// Price range extracted from the query, if any.
    pub price_range: Option<PriceRange>,
    /// Categories hinted at by the query.
    pub category_hints: Vec<u64>,
    /// Candidates found by the keyword leg.
    pub keyword_matches: usize,
    /// Candidates found by the semantic leg.
    pub semantic_matches: usize,
    /// Whether the engine fell back a tier (semantic -> keyword).
    pub degraded: bool,
    /// Query processing time in milliseconds.
    pub took_ms: u64,
}

/// A full search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The requested page of ranked candidates.
    pub items: Vec<SearchCandidate>,
    /// Pagination info.
    pub pagination: Pagination,
    /// Diagnostic metadata.
    pub search_metadata: SearchMetadata,
}

/// Outcome of an administrative index rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildReport {
    /// Whether the rebuild completed.
    pub success: bool,
    /// Products successfully embedded and indexed.
    pub products_indexed: usize,
    /// Wall-clock rebuild time in milliseconds.
    pub rebuild_time_ms: u64,
}
