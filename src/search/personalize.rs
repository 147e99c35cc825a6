//! Per-user score adjustment from purchase history.

use std::sync::Arc;

use ahash::AHashMap;
use log::debug;

use crate::history::PurchaseHistory;
use crate::search::config::PersonalizationConfig;
use crate::search::types::SearchCandidate;

/// Re-weights scored candidates from a user's purchase history.
///
/// Adjustments are strictly additive: no user id, no history data, or a
/// failed lookup all leave the candidates exactly as scored.
pub struct PersonalizationAdjuster {
    history: Arc<dyn PurchaseHistory>,
    config: PersonalizationConfig,
}

impl PersonalizationAdjuster {
    /// Create an adjuster over a history backend.
    pub fn new(history: Arc<dyn PurchaseHistory>, config: PersonalizationConfig) -> Self {
        Self { history, config }
    }

    /// Apply personalization boosts in place and re-sort by combined score.
    pub fn adjust(&self, candidates: &mut Vec<SearchCandidate>, user_id: Option<u64>) {
        let Some(user_id) = user_id else {
            return;
        };

        let preferences = match self
            .history
            .get_purchase_preferences(user_id, self.config.window_days)
        {
            Ok(preferences) => preferences,
            Err(e) => {
                debug!("personalization lookup failed for user {user_id}: {e}");
                return;
            }
        };
        if preferences.is_empty() {
            return;
        }

        let mut category_frequency: AHashMap<u64, u32> = AHashMap::new();
        let mut brand_frequency: AHashMap<u64, u32> = AHashMap::new();
        let mut spend_total = 0.0_f64;
        let mut purchase_count = 0u32;

        for preference in &preferences {
            if let Some(category_id) = preference.category_id {
                *category_frequency.entry(category_id).or_insert(0) += preference.frequency;
            }
            if let Some(brand_id) = preference.brand_id {
                *brand_frequency.entry(brand_id).or_insert(0) += preference.frequency;
            }
            spend_total += preference.avg_price * preference.frequency as f64;
            purchase_count += preference.frequency;
        }

        let average_spend = if purchase_count > 0 {
            spend_total / purchase_count as f64
        } else {
            0.0
        };

        let mut adjusted = false;
        for candidate in candidates.iter_mut() {
            let mut boost = 0.0_f32;

            if let Some(category_id) = candidate.item.category_id
                && let Some(&frequency) = category_frequency.get(&category_id)
            {
                boost +=
                    self.config.category_factor * (frequency as f32 / self.config.frequency_scale);
            }
            if let Some(brand_id) = candidate.item.brand_id
                && let Some(&frequency) = brand_frequency.get(&brand_id)
            {
                boost += self.config.brand_factor * (frequency as f32 / self.config.frequency_scale);
            }

            if average_spend > 0.0 {
                let price = candidate.item.effective_price();
                if (price - average_spend).abs() <= self.config.price_window * average_spend {
                    boost += self.config.price_affinity_bonus;
                }
            }

            if boost > 0.0 {
                candidate.combined_score += boost;
                adjusted = true;
            }
        }

        if adjusted {
            candidates.sort_by(|a, b| {
                b.combined_score
                    .partial_cmp(&a.combined_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
    }
}
