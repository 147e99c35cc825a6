//! The search engine facade.
//!
//! Owns the query-time pipeline (interpret -> retrieve -> score ->
//! personalize -> merge) and the administrative index operations. Failure
//! of the semantic tier degrades to keyword results; only malformed input
//! and total unavailability surface to the caller.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ahash::AHashMap;
use log::{debug, warn};

use crate::catalog::{Brand, CatalogItem, CatalogReader, Category, ProductFilter};
use crate::embedding::TextEmbedder;
use crate::error::{MercatoError, Result};
use crate::fuzzy::FuzzyMatcher;
use crate::history::{NoHistory, PurchaseHistory};
use crate::index::{IndexManager, IndexStats};
use crate::query::QueryInterpreter;
use crate::search::config::{HybridConfig, PersonalizationConfig, ScoringWeights};
use crate::search::keyword::keyword_search;
use crate::search::merger::HybridMerger;
use crate::search::personalize::PersonalizationAdjuster;
use crate::search::scorer::{RelevanceScorer, SignalCache, SignalSource};
use crate::search::semantic::semantic_search;
use crate::search::types::{
    Pagination, RebuildReport, SearchCandidate, SearchMetadata, SearchMode, SearchRequest,
    SearchResponse,
};

/// Engine-wide configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Hybrid merge parameters.
    pub hybrid: HybridConfig,
    /// Relevance scoring weights.
    pub scoring: ScoringWeights,
    /// Personalization parameters.
    pub personalization: PersonalizationConfig,
    /// Directory for index snapshots; `None` disables persistence.
    pub snapshot_dir: Option<PathBuf>,
}

/// Hybrid product search engine.
pub struct SearchEngine {
    catalog: Arc<dyn CatalogReader>,
    index: IndexManager,
    interpreter: QueryInterpreter,
    scorer: RelevanceScorer,
    merger: HybridMerger,
    personalizer: PersonalizationAdjuster,
    config: HybridConfig,
}

impl SearchEngine {
    /// Create a new engine over a catalog and a text encoder.
    ///
    /// If a snapshot directory is configured, an existing snapshot is
    /// loaded; a corrupt one is discarded with a warning and the engine
    /// starts with an empty index.
    pub fn new(
        catalog: Arc<dyn CatalogReader>,
        embedder: Arc<dyn TextEmbedder>,
        config: EngineConfig,
    ) -> Result<Self> {
        let index = match config.snapshot_dir {
            Some(ref dir) => IndexManager::with_snapshot_dir(Arc::clone(&embedder), dir.clone()),
            None => IndexManager::new(Arc::clone(&embedder)),
        };

        Ok(Self {
            catalog,
            index,
            interpreter: QueryInterpreter::new()?,
            scorer: RelevanceScorer::new(config.scoring),
            merger: HybridMerger::new(config.hybrid.clone()),
            personalizer: PersonalizationAdjuster::new(
                Arc::new(NoHistory::new()),
                config.personalization,
            ),
            config: config.hybrid,
        })
    }

    /// Attach a purchase-history backend for personalization.
    pub fn with_history(
        mut self,
        history: Arc<dyn PurchaseHistory>,
        config: PersonalizationConfig,
    ) -> Self {
        self.personalizer = PersonalizationAdjuster::new(history, config);
        self
    }

    /// Attach a fuzzy-matching capability to the scorer.
    pub fn with_fuzzy(mut self, fuzzy: Arc<dyn FuzzyMatcher>) -> Self {
        self.scorer = self.scorer.with_fuzzy(fuzzy);
        self
    }

    /// Attach a review-signal source, cached with the given TTL.
    pub fn with_signals(mut self, source: Arc<dyn SignalSource>, ttl: Duration) -> Self {
        self.scorer = self.scorer.with_signals(source, ttl);
        self
    }

    /// Attach a review-signal source with the default one-hour TTL.
    pub fn with_default_signal_ttl(self, source: Arc<dyn SignalSource>) -> Self {
        self.with_signals(source, SignalCache::DEFAULT_TTL)
    }

    /// Run a search request through the full pipeline.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let start = Instant::now();
        let query = request.query.trim();
        if query.is_empty() {
            return Err(MercatoError::query("query text is required"));
        }

        let categories = match self.catalog.get_categories() {
            Ok(categories) => categories,
            Err(e) => {
                debug!("category lookup failed during intent extraction: {e}");
                Vec::new()
            }
        };
        let intent = self.interpreter.interpret(query, &categories);

        let mut filter = request.filter.clone();
        if filter.price_range.is_none() {
            filter.price_range = intent.price_range;
        }

        let outcome = match request.mode {
            SearchMode::Keyword => self.run_keyword(query, &filter)?,
            SearchMode::Semantic => self.run_semantic(query, &filter)?,
            SearchMode::Hybrid => self.run_hybrid(query, &filter)?,
        };
        let PipelineOutcome {
            mut candidates,
            keyword_matches,
            semantic_matches,
            degraded,
        } = outcome;

        self.personalizer.adjust(&mut candidates, request.user_id);

        let pagination = Pagination::new(request.page, request.per_page, candidates.len());
        let offset = (pagination.page - 1) * pagination.per_page;
        let items: Vec<SearchCandidate> = candidates
            .into_iter()
            .skip(offset)
            .take(pagination.per_page)
            .collect();

        Ok(SearchResponse {
            items,
            pagination,
            search_metadata: SearchMetadata {
                query: query.to_string(),
                mode: request.mode,
                price_range: intent.price_range,
                category_hints: intent.category_hints,
                keyword_matches,
                semantic_matches,
                degraded,
                took_ms: start.elapsed().as_millis() as u64,
            },
        })
    }

    /// Autocomplete suggestions for a partial query.
    ///
    /// Degrades to an empty list on any failure; never errors.
    pub fn suggest(&self, partial_query: &str, limit: usize) -> Vec<String> {
        let partial = partial_query.trim().to_lowercase();
        if partial.is_empty() || limit == 0 {
            return Vec::new();
        }

        let products = match self.catalog.get_active_products(&ProductFilter::default()) {
            Ok(products) => products,
            Err(e) => {
                debug!("suggestion lookup failed: {e}");
                return Vec::new();
            }
        };

        let mut suggestions: Vec<String> = Vec::new();
        let mut seen: Vec<String> = Vec::new();
        // Prefix matches first, then word-prefix, then plain substring.
        let passes: [&dyn Fn(&str) -> bool; 3] = [
            &|name: &str| name.starts_with(&partial),
            &|name: &str| name.split_whitespace().any(|word| word.starts_with(&partial)),
            &|name: &str| name.contains(&partial),
        ];

        for pass in passes {
            for product in &products {
                if suggestions.len() >= limit {
                    return suggestions;
                }
                let lowered = product.name.to_lowercase();
                if pass(&lowered) && !seen.contains(&lowered) {
                    seen.push(lowered);
                    suggestions.push(product.name.clone());
                }
            }
        }
        suggestions
    }

    /// Rebuild the vector index from the full active catalog.
    ///
    /// Runs to completion inside this call; concurrent searches keep using
    /// the previous index until the swap.
    pub fn rebuild_index(&self) -> Result<RebuildReport> {
        let start = Instant::now();
        let items = self.catalog.get_active_products(&ProductFilter::default())?;
        let products_indexed = self.index.rebuild(&items)?;

        Ok(RebuildReport {
            success: true,
            products_indexed,
            rebuild_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Embed and index one product incrementally.
    pub fn add_product(&self, item: &CatalogItem) -> Result<()> {
        self.index.add_item(item)
    }

    /// Soft-delete a product from the index.
    pub fn remove_product(&self, product_id: u64) -> bool {
        self.index.remove(product_id)
    }

    /// Compact soft-deleted entries out of the index.
    pub fn compact_index(&self) {
        self.index.compact()
    }

    /// Summary statistics for the live index.
    pub fn index_stats(&self) -> IndexStats {
        self.index.stats()
    }

    fn run_keyword(&self, query: &str, filter: &ProductFilter) -> Result<PipelineOutcome> {
        let items = keyword_search(self.catalog.as_ref(), query, filter)?;
        let keyword_matches = items.len();
        let candidates = self
            .score_items(items, query)
            .into_iter()
            .map(|(item, score)| SearchCandidate::from_keyword(item, score))
            .collect();

        Ok(PipelineOutcome {
            candidates,
            keyword_matches,
            semantic_matches: 0,
            degraded: false,
        })
    }

    fn run_semantic(&self, query: &str, filter: &ProductFilter) -> Result<PipelineOutcome> {
        let k = self.config.semantic_k;
        match semantic_search(
            self.catalog.as_ref(),
            &self.index,
            query,
            k,
            self.config.similarity_threshold,
        ) {
            Ok(matches) => {
                let semantic_matches = matches.len();
                let candidates = matches
                    .into_iter()
                    .map(|entry| SearchCandidate::from_semantic(entry.item, entry.similarity))
                    .collect();
                Ok(PipelineOutcome {
                    candidates,
                    keyword_matches: 0,
                    semantic_matches,
                    degraded: false,
                })
            }
            Err(MercatoError::DependencyUnavailable(reason)) => {
                debug!("semantic search unavailable ({reason}), falling back to keyword");
                let mut outcome = self.run_keyword(query, filter)?;
                outcome.candidates.truncate(k);
                outcome.degraded = true;
                Ok(outcome)
            }
            Err(e) => Err(e),
        }
    }

    fn run_hybrid(&self, query: &str, filter: &ProductFilter) -> Result<PipelineOutcome> {
        let keyword_items = keyword_search(self.catalog.as_ref(), query, filter)?;
        let keyword_matches = keyword_items.len();

        let merged = self.try_hybrid_merge(query, keyword_items.clone());
        match merged {
            Ok((candidates, semantic_matches)) => Ok(PipelineOutcome {
                candidates,
                keyword_matches,
                semantic_matches,
                degraded: false,
            }),
            Err(e) => {
                // Scoring and merging must never error out to the caller;
                // plain keyword results are the floor.
                warn!("hybrid ranking failed, degrading to keyword results: {e}");
                let candidates = keyword_items
                    .into_iter()
                    .map(|item| SearchCandidate::from_keyword(item, 0.0))
                    .collect();
                Ok(PipelineOutcome {
                    candidates,
                    keyword_matches,
                    semantic_matches: 0,
                    degraded: true,
                })
            }
        }
    }

    fn try_hybrid_merge(
        &self,
        query: &str,
        keyword_items: Vec<CatalogItem>,
    ) -> Result<(Vec<SearchCandidate>, usize)> {
        let scored = self.score_items(keyword_items, query);

        let semantic = if self.index.is_available() && !self.index.is_empty() {
            semantic_search(
                self.catalog.as_ref(),
                &self.index,
                query,
                self.config.semantic_k,
                self.config.similarity_threshold,
            )?
        } else {
            Vec::new()
        };
        let semantic_matches = semantic.len();

        let candidates = self.merger.merge(scored, semantic, self.config.max_results);
        Ok((candidates, semantic_matches))
    }

    /// Score items, resolving category and brand names once per query.
    fn score_items(&self, items: Vec<CatalogItem>, query: &str) -> Vec<(CatalogItem, f32)> {
        let mut categories: AHashMap<u64, Option<Category>> = AHashMap::new();
        let mut brands: AHashMap<u64, Option<Brand>> = AHashMap::new();

        items
            .into_iter()
            .map(|item| {
                let category = item.category_id.and_then(|id| {
                    categories
                        .entry(id)
                        .or_insert_with(|| self.catalog.get_category(id).ok().flatten())
                        .clone()
                });
                let brand = item.brand_id.and_then(|id| {
                    brands
                        .entry(id)
                        .or_insert_with(|| self.catalog.get_brand(id).ok().flatten())
                        .clone()
                });
                let score = self
                    .scorer
                    .score(&item, query, category.as_ref(), brand.as_ref());
                (item, score)
            })
            .collect()
    }
}

struct PipelineOutcome {
    candidates: Vec<SearchCandidate>,
    keyword_matches: usize,
    semantic_matches: usize,
    degraded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::embedding::{HashingEmbedder, UnavailableEmbedder};
    use crate::search::types::SearchSource;

    fn engine_with_catalog() -> (Arc<MemoryCatalog>, SearchEngine) {
        let catalog = MemoryCatalog::shared();
        catalog.put_product(
            CatalogItem::new(1, "Blue Running Shoe")
                .with_description("Cushioned shoe for daily road running")
                .with_tags(&["running", "shoes"])
                .with_price(90.0)
                .with_stock(12),
        );
        catalog.put_product(
            CatalogItem::new(2, "Budget Espresso Machine")
                .with_description("15 bar pump espresso maker")
                .with_price(300.0)
                .with_stock(4),
        );

        let engine = SearchEngine::new(
            Arc::clone(&catalog) as Arc<dyn CatalogReader>,
            Arc::new(HashingEmbedder::default()),
            EngineConfig::default(),
        )
        .unwrap();
        (catalog, engine)
    }

    #[test]
    fn test_empty_query_rejected() {
        let (_, engine) = engine_with_catalog();
        let result = engine.search(&SearchRequest::new("   "));
        assert!(matches!(result, Err(MercatoError::Query(_))));
    }

    #[test]
    fn test_keyword_mode_returns_match() {
        let (_, engine) = engine_with_catalog();
        let response = engine
            .search(&SearchRequest::new("running shoe").with_mode(SearchMode::Keyword))
            .unwrap();

        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].item.id, 1);
        assert_eq!(response.items[0].search_source, SearchSource::Keyword);
        assert_eq!(response.search_metadata.semantic_matches, 0);
    }

    #[test]
    fn test_hybrid_mode_tags_agreement() {
        let (_, engine) = engine_with_catalog();
        engine.rebuild_index().unwrap();

        let response = engine.search(&SearchRequest::new("running shoe")).unwrap();
        assert_eq!(response.items[0].item.id, 1);
        assert_eq!(response.items[0].search_source, SearchSource::Both);
        assert!(!response.search_metadata.degraded);
    }

    #[test]
    fn test_semantic_mode_falls_back_without_encoder() {
        let catalog = MemoryCatalog::shared();
        catalog.put_product(CatalogItem::new(1, "Blue Running Shoe"));

        let engine = SearchEngine::new(
            Arc::clone(&catalog) as Arc<dyn CatalogReader>,
            Arc::new(UnavailableEmbedder::new()),
            EngineConfig::default(),
        )
        .unwrap();

        let response = engine
            .search(&SearchRequest::new("running shoe").with_mode(SearchMode::Semantic))
            .unwrap();
        assert!(response.search_metadata.degraded);
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].search_source, SearchSource::Keyword);
    }

    #[test]
    fn test_rebuild_without_encoder_fails_fast() {
        let catalog = MemoryCatalog::shared();
        let engine = SearchEngine::new(
            Arc::clone(&catalog) as Arc<dyn CatalogReader>,
            Arc::new(UnavailableEmbedder::new()),
            EngineConfig::default(),
        )
        .unwrap();

        assert!(matches!(
            engine.rebuild_index(),
            Err(MercatoError::DependencyUnavailable(_))
        ));
    }

    #[test]
    fn test_price_intent_becomes_filter() {
        let (_, engine) = engine_with_catalog();
        // "budget" maps to the (0, 150) bucket; the machine costs 300.
        let response = engine
            .search(&SearchRequest::new("budget machine").with_mode(SearchMode::Keyword))
            .unwrap();
        assert!(response.items.is_empty());
        assert!(response.search_metadata.price_range.is_some());
    }

    #[test]
    fn test_explicit_filter_wins_over_intent() {
        let (_, engine) = engine_with_catalog();
        let filter = ProductFilter {
            price_range: Some(crate::catalog::PriceRange::new(0.0, 1000.0)),
            ..Default::default()
        };
        let response = engine
            .search(
                &SearchRequest::new("budget machine")
                    .with_mode(SearchMode::Keyword)
                    .with_filter(filter),
            )
            .unwrap();
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].item.id, 2);
    }

    #[test]
    fn test_pagination() {
        let catalog = MemoryCatalog::shared();
        for id in 1..=25 {
            catalog.put_product(CatalogItem::new(id, &format!("Widget {id}")));
        }
        let engine = SearchEngine::new(
            Arc::clone(&catalog) as Arc<dyn CatalogReader>,
            Arc::new(HashingEmbedder::default()),
            EngineConfig::default(),
        )
        .unwrap();

        let response = engine
            .search(
                &SearchRequest::new("widget")
                    .with_mode(SearchMode::Keyword)
                    .with_page(2, 10),
            )
            .unwrap();
        assert_eq!(response.items.len(), 10);
        assert_eq!(response.pagination.total_items, 25);
        assert_eq!(response.pagination.total_pages, 3);
    }

    #[test]
    fn test_suggest_prefers_prefix_matches() {
        let (catalog, engine) = engine_with_catalog();
        catalog.put_product(CatalogItem::new(3, "Runaway Kite"));

        let suggestions = engine.suggest("run", 5);
        assert!(!suggestions.is_empty());
        // Word-prefix and prefix matches come before substring-only ones.
        assert!(suggestions.contains(&"Runaway Kite".to_string()));
        assert!(suggestions.contains(&"Blue Running Shoe".to_string()));
    }

    #[test]
    fn test_suggest_empty_input() {
        let (_, engine) = engine_with_catalog();
        assert!(engine.suggest("", 5).is_empty());
        assert!(engine.suggest("run", 0).is_empty());
    }

    #[test]
    fn test_signal_source_raises_keyword_scores() {
        use crate::search::scorer::ProductSignals;

        struct StaticSignals;
        impl SignalSource for StaticSignals {
            fn product_signals(&self, _product_id: u64) -> crate::error::Result<ProductSignals> {
                Ok(ProductSignals {
                    rating: 5.0,
                    review_count: 40,
                })
            }
        }

        let (catalog, plain) = engine_with_catalog();
        let rated = SearchEngine::new(
            Arc::clone(&catalog) as Arc<dyn CatalogReader>,
            Arc::new(HashingEmbedder::default()),
            EngineConfig::default(),
        )
        .unwrap()
        .with_default_signal_ttl(Arc::new(StaticSignals));

        let request = SearchRequest::new("running shoe").with_mode(SearchMode::Keyword);
        let base = plain.search(&request).unwrap().items[0].combined_score;
        let boosted = rated.search(&request).unwrap().items[0].combined_score;
        // rating 5.0 * 1.5 plus the capped review contribution of 3.0
        assert!((boosted - base - 10.5).abs() < 1e-4);
    }

    #[test]
    fn test_index_stats_after_rebuild() {
        let (_, engine) = engine_with_catalog();
        let report = engine.rebuild_index().unwrap();
        assert!(report.success);
        assert_eq!(report.products_indexed, 2);

        let stats = engine.index_stats();
        assert_eq!(stats.total_products, 2);
        assert_eq!(stats.embedding_dimension, 256);
    }

    #[test]
    fn test_remove_product_soft_deletes() {
        let (_, engine) = engine_with_catalog();
        engine.rebuild_index().unwrap();

        assert!(engine.remove_product(1));
        assert_eq!(engine.index_stats().total_products, 1);
        assert_eq!(engine.index_stats().tombstones, 1);

        engine.compact_index();
        assert_eq!(engine.index_stats().tombstones, 0);
    }
}
