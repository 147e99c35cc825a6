//! Configuration for the search pipeline.
//!
//! The hybrid-merge constants are empirical tunings, so they live here as
//! configurable parameters rather than hard-coded truths.

use serde::{Deserialize, Serialize};

/// Configuration for hybrid search combining keyword and semantic results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridConfig {
    /// Weight of the semantic similarity component (0.0-1.0); the keyword
    /// component gets the complement.
    pub semantic_weight: f32,
    /// Weight of the positional stability term.
    pub position_weight: f32,
    /// Multiplier applied when both methods agree on a candidate.
    pub both_source_boost: f32,
    /// Number of candidates requested from the semantic leg.
    pub semantic_k: usize,
    /// Minimum similarity for semantic matches (clamped to [0, 1]).
    pub similarity_threshold: f32,
    /// Maximum number of merged results kept before pagination.
    pub max_results: usize,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            semantic_weight: 0.7,
            position_weight: 0.1,
            both_source_boost: 1.2,
            semantic_k: 50,
            similarity_threshold: 0.3,
            max_results: 50,
        }
    }
}

/// Weights for the multi-signal relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Name starts with the whole query.
    pub name_starts_with: f32,
    /// A query term matches a name word exactly.
    pub name_exact_word: f32,
    /// A query term appears inside the name.
    pub name_partial: f32,
    /// A query term matches a description word exactly.
    pub description_exact_word: f32,
    /// A query term appears inside the description.
    pub description_partial: f32,
    /// A query term matches a tag.
    pub tag_match: f32,
    /// Maximum fuzzy-match bonus, scaled by the similarity ratio.
    pub fuzzy_max_bonus: f32,
    /// Minimum fuzzy ratio before any bonus applies.
    pub fuzzy_min_ratio: f32,
    /// A query term appears in the category name.
    pub category_term: f32,
    /// A query term appears in the brand name.
    pub brand_term: f32,
    /// Multiplier on the product's average rating.
    pub rating_factor: f32,
    /// Per-review contribution.
    pub review_factor: f32,
    /// Cap on the total review contribution.
    pub review_cap: f32,
    /// Bonus for having any stock.
    pub in_stock: f32,
    /// Extra bonus for stock above ten units.
    pub deep_stock: f32,
    /// Bonus for featured products.
    pub featured: f32,
    /// Bonus for products on sale.
    pub on_sale: f32,
    /// Bonus for new arrivals.
    pub new_arrival: f32,
    /// Minimum score for any scored candidate, keeping zero-signal matches
    /// orderable.
    pub floor: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            name_starts_with: 25.0,
            name_exact_word: 20.0,
            name_partial: 15.0,
            description_exact_word: 10.0,
            description_partial: 5.0,
            tag_match: 8.0,
            fuzzy_max_bonus: 8.0,
            fuzzy_min_ratio: 0.6,
            category_term: 6.0,
            brand_term: 5.0,
            rating_factor: 1.5,
            review_factor: 0.2,
            review_cap: 3.0,
            in_stock: 2.0,
            deep_stock: 1.0,
            featured: 3.0,
            on_sale: 2.0,
            new_arrival: 1.0,
            floor: 0.1,
        }
    }
}

/// Configuration for personalization adjustments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalizationConfig {
    /// Boost factor for category affinity, scaled by frequency.
    pub category_factor: f32,
    /// Boost factor for brand affinity, scaled by frequency.
    pub brand_factor: f32,
    /// Flat bonus when a price sits near the user's average spend.
    pub price_affinity_bonus: f32,
    /// Relative distance from average spend that still counts as "near".
    pub price_window: f64,
    /// Purchase frequency that yields the full affinity factor.
    pub frequency_scale: f32,
    /// Trailing purchase-history window, in days.
    pub window_days: u32,
}

impl Default for PersonalizationConfig {
    fn default() -> Self {
        Self {
            category_factor: 3.0,
            brand_factor: 2.0,
            price_affinity_bonus: 2.0,
            price_window: 0.3,
            frequency_scale: 10.0,
            window_days: 90,
        }
    }
}
