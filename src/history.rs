//! Consumed user purchase-history capability for personalization.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Aggregated purchase behavior for one (category, brand) pair within the
/// trailing history window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchasePreference {
    /// Category purchased from, if known.
    pub category_id: Option<u64>,
    /// Brand purchased, if known.
    pub brand_id: Option<u64>,
    /// Number of purchases in the window.
    pub frequency: u32,
    /// Average price paid across those purchases.
    pub avg_price: f64,
}

/// Read-only access to user purchase history.
///
/// This capability is optional: an engine without history behaves exactly
/// like one whose every lookup returns no preferences.
pub trait PurchaseHistory: Send + Sync {
    /// Purchase preferences for a user over a trailing window of days.
    ///
    /// Unknown users yield an empty list, not an error.
    fn get_purchase_preferences(
        &self,
        user_id: u64,
        window_days: u32,
    ) -> Result<Vec<PurchasePreference>>;
}

/// A history backend with no data. Personalization becomes a no-op.
#[derive(Debug, Default)]
pub struct NoHistory;

impl NoHistory {
    /// Create a new empty history backend.
    pub fn new() -> Self {
        Self
    }
}

impl PurchaseHistory for NoHistory {
    fn get_purchase_preferences(
        &self,
        _user_id: u64,
        _window_days: u32,
    ) -> Result<Vec<PurchasePreference>> {
        Ok(Vec::new())
    }
}

/// In-memory purchase history for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    preferences: RwLock<HashMap<u64, Vec<PurchasePreference>>>,
}

impl MemoryHistory {
    /// Create an empty in-memory history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a preference aggregate for a user.
    pub fn put_preference(&self, user_id: u64, preference: PurchasePreference) {
        self.preferences
            .write()
            .entry(user_id)
            .or_default()
            .push(preference);
    }
}

impl PurchaseHistory for MemoryHistory {
    fn get_purchase_preferences(
        &self,
        user_id: u64,
        _window_days: u32,
    ) -> Result<Vec<PurchasePreference>> {
        Ok(self
            .preferences
            .read()
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_history_is_empty() {
        let history = NoHistory::new();
        assert!(
            history
                .get_purchase_preferences(42, 90)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_memory_history_round_trip() {
        let history = MemoryHistory::new();
        history.put_preference(
            7,
            PurchasePreference {
                category_id: Some(1),
                brand_id: Some(2),
                frequency: 5,
                avg_price: 120.0,
            },
        );

        let preferences = history.get_purchase_preferences(7, 90).unwrap();
        assert_eq!(preferences.len(), 1);
        assert_eq!(preferences[0].frequency, 5);

        assert!(history.get_purchase_preferences(8, 90).unwrap().is_empty());
    }
}
