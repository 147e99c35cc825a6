//! Multi-signal relevance scoring.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ahash::AHashMap;
use log::debug;
use parking_lot::Mutex;

use crate::catalog::{Brand, CatalogItem, Category};
use crate::error::Result;
use crate::fuzzy::FuzzyMatcher;
use crate::search::config::ScoringWeights;

/// Aggregate review signals for one product.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductSignals {
    /// Average rating, typically 0-5.
    pub rating: f32,
    /// Number of reviews.
    pub review_count: u32,
}

/// Source of per-product aggregate signals (ratings, review counts).
///
/// These aggregates are expensive to compute, so the scorer reads them
/// through a short-TTL cache; staleness within the window is accepted.
pub trait SignalSource: Send + Sync {
    /// Aggregate signals for one product.
    fn product_signals(&self, product_id: u64) -> Result<ProductSignals>;
}

/// TTL cache in front of a [`SignalSource`].
pub struct SignalCache {
    source: Arc<dyn SignalSource>,
    ttl: Duration,
    entries: Mutex<AHashMap<u64, (Instant, ProductSignals)>>,
}

impl SignalCache {
    /// Default time-to-live for cached signals.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

    /// Create a cache over a signal source.
    pub fn new(source: Arc<dyn SignalSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entries: Mutex::new(AHashMap::new()),
        }
    }

    /// Fetch signals, serving from cache within the TTL. A failed lookup
    /// yields `None` so scoring can continue without the signal.
    pub fn get(&self, product_id: u64) -> Option<ProductSignals> {
        {
            let entries = self.entries.lock();
            if let Some((cached_at, signals)) = entries.get(&product_id)
                && cached_at.elapsed() < self.ttl
            {
                return Some(*signals);
            }
        }

        match self.source.product_signals(product_id) {
            Ok(signals) => {
                self.entries
                    .lock()
                    .insert(product_id, (Instant::now(), signals));
                Some(signals)
            }
            Err(e) => {
                debug!("signal lookup failed for product {product_id}: {e}");
                None
            }
        }
    }
}

/// Computes the composite relevance score for a candidate.
pub struct RelevanceScorer {
    weights: ScoringWeights,
    fuzzy: Option<Arc<dyn FuzzyMatcher>>,
    signals: Option<SignalCache>,
}

impl RelevanceScorer {
    /// Create a scorer with the given weights and no optional capabilities.
    pub fn new(weights: ScoringWeights) -> Self {
        Self {
            weights,
            fuzzy: None,
            signals: None,
        }
    }

    /// Attach a fuzzy-matching capability.
    pub fn with_fuzzy(mut self, fuzzy: Arc<dyn FuzzyMatcher>) -> Self {
        self.fuzzy = Some(fuzzy);
        self
    }

    /// Attach a signal source behind a TTL cache.
    pub fn with_signals(mut self, source: Arc<dyn SignalSource>, ttl: Duration) -> Self {
        self.signals = Some(SignalCache::new(source, ttl));
        self
    }

    /// Score one candidate against the query.
    ///
    /// Every scored candidate receives at least the configured floor so
    /// that zero-signal matches stay orderable.
    pub fn score(
        &self,
        item: &CatalogItem,
        query: &str,
        category: Option<&Category>,
        brand: Option<&Brand>,
    ) -> f32 {
        let weights = &self.weights;
        let query_lower = query.to_lowercase();
        let terms: Vec<&str> = query_lower
            .split_whitespace()
            .filter(|term| term.len() >= 2)
            .collect();

        let mut score = 0.0;
        score += self.text_score(item, &query_lower, &terms);
        score += self.fuzzy_bonus(item, &query_lower);

        if let Some(category) = category {
            let category_name = category.name.to_lowercase();
            if terms.iter().any(|term| category_name.contains(term)) {
                score += weights.category_term;
            }
        }
        if let Some(brand) = brand {
            let brand_name = brand.name.to_lowercase();
            if terms.iter().any(|term| brand_name.contains(term)) {
                score += weights.brand_term;
            }
        }

        score += self.business_score(item);
        score.max(weights.floor)
    }

    fn text_score(&self, item: &CatalogItem, query_lower: &str, terms: &[&str]) -> f32 {
        let weights = &self.weights;
        let name = item.name.to_lowercase();
        let name_words: Vec<&str> = name.split_whitespace().collect();
        let mut score = 0.0;

        if name.starts_with(query_lower) {
            score += weights.name_starts_with;
        } else if terms.iter().any(|term| name_words.contains(term)) {
            score += weights.name_exact_word;
        } else if terms.iter().any(|term| name.contains(term)) {
            score += weights.name_partial;
        }

        let description = format!(
            "{} {}",
            item.description.to_lowercase(),
            item.short_description.to_lowercase()
        );
        let description_words: Vec<&str> = description.split_whitespace().collect();
        if terms.iter().any(|term| description_words.contains(term)) {
            score += weights.description_exact_word;
        } else if terms.iter().any(|term| description.contains(term)) {
            score += weights.description_partial;
        }

        let tag_matched = item.tags.iter().any(|tag| {
            let tag = tag.to_lowercase();
            terms
                .iter()
                .any(|term| tag == *term || tag.contains(term) || term.contains(tag.as_str()))
        });
        if tag_matched {
            score += weights.tag_match;
        }

        score
    }

    fn fuzzy_bonus(&self, item: &CatalogItem, query_lower: &str) -> f32 {
        let weights = &self.weights;
        let Some(ref fuzzy) = self.fuzzy else {
            return 0.0;
        };
        if !fuzzy.is_available() {
            return 0.0;
        }

        let ratio = fuzzy.partial_ratio(query_lower, &item.name);
        if ratio > weights.fuzzy_min_ratio {
            weights.fuzzy_max_bonus * ratio
        } else {
            0.0
        }
    }

    fn business_score(&self, item: &CatalogItem) -> f32 {
        let weights = &self.weights;
        let mut score = 0.0;

        if let Some(ref cache) = self.signals
            && let Some(signals) = cache.get(item.id)
        {
            score += signals.rating * weights.rating_factor;
            score += (signals.review_count as f32 * weights.review_factor).min(weights.review_cap);
        }

        if item.stock > 0 {
            score += weights.in_stock;
            if item.stock > 10 {
                score += weights.deep_stock;
            }
        }
        if item.is_featured {
            score += weights.featured;
        }
        if item.is_sale {
            score += weights.on_sale;
        }
        if item.is_new {
            score += weights.new_arrival;
        }

        score
    }
}
