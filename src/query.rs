//! Query intent extraction.
//!
//! Turns raw query text into a [`QueryIntent`]: an optional price range and
//! a list of category hints. Price patterns are tried in fixed precedence —
//! explicit amounts ("under $300", "$200-$400", "between $200 and $400")
//! before named buckets ("cheap", "premium", ...) — and the first match
//! wins. Category hints come from substring lookup of category names and
//! synonyms in the lowercased query; there is deliberately no tokenizer or
//! stemmer beyond that.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::{Category, PriceRange};
use crate::error::{MercatoError, Result};

/// Named price buckets, tried in order after the explicit patterns.
const PRICE_BUCKETS: &[(&str, f64, f64)] = &[
    ("cheap", 0.0, 150.0),
    ("budget", 0.0, 150.0),
    ("affordable", 0.0, 300.0),
    ("mid-range", 150.0, 600.0),
    ("premium", 600.0, 1500.0),
    ("expensive", 1000.0, 50_000.0),
    ("luxury", 2000.0, 100_000.0),
    ("high-end", 1500.0, 100_000.0),
];

/// Structured interpretation of a free-text query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryIntent {
    /// The query as received.
    pub raw_text: String,
    /// Extracted price constraint, if any.
    pub price_range: Option<PriceRange>,
    /// IDs of categories whose name or synonym appears in the query.
    pub category_hints: Vec<u64>,
}

/// Extracts [`QueryIntent`] from raw query text.
pub struct QueryInterpreter {
    under_pattern: Regex,
    dash_range_pattern: Regex,
    between_pattern: Regex,
}

impl QueryInterpreter {
    /// Create a new interpreter with its compiled pattern set.
    pub fn new() -> Result<Self> {
        let under_pattern = Regex::new(r"(?:under|below)\s+\$?(\d+(?:\.\d+)?)")
            .map_err(|e| MercatoError::query(format!("Invalid price pattern: {e}")))?;
        let dash_range_pattern = Regex::new(r"\$(\d+(?:\.\d+)?)\s*-\s*\$?(\d+(?:\.\d+)?)")
            .map_err(|e| MercatoError::query(format!("Invalid price pattern: {e}")))?;
        let between_pattern =
            Regex::new(r"between\s+\$?(\d+(?:\.\d+)?)\s+and\s+\$?(\d+(?:\.\d+)?)")
                .map_err(|e| MercatoError::query(format!("Invalid price pattern: {e}")))?;

        Ok(Self {
            under_pattern,
            dash_range_pattern,
            between_pattern,
        })
    }

    /// Derive query intent from raw text and the known categories.
    pub fn interpret(&self, query: &str, categories: &[Category]) -> QueryIntent {
        let lowered = query.to_lowercase();
        QueryIntent {
            raw_text: query.to_string(),
            price_range: self.extract_price_range(&lowered),
            category_hints: self.extract_category_hints(&lowered, categories),
        }
    }

    /// Extract a price range from lowercased query text.
    pub fn extract_price_range(&self, lowered: &str) -> Option<PriceRange> {
        if let Some(captures) = self.under_pattern.captures(lowered)
            && let Ok(max) = captures[1].parse::<f64>()
        {
            return Some(PriceRange::new(0.0, max));
        }

        if let Some(captures) = self.dash_range_pattern.captures(lowered)
            && let (Ok(min), Ok(max)) = (captures[1].parse::<f64>(), captures[2].parse::<f64>())
        {
            return Some(PriceRange::new(min, max));
        }

        if let Some(captures) = self.between_pattern.captures(lowered)
            && let (Ok(min), Ok(max)) = (captures[1].parse::<f64>(), captures[2].parse::<f64>())
        {
            return Some(PriceRange::new(min, max));
        }

        for (keyword, min, max) in PRICE_BUCKETS {
            if lowered.contains(keyword) {
                return Some(PriceRange::new(*min, *max));
            }
        }

        None
    }

    /// Find categories whose name or a synonym occurs in the query.
    ///
    /// Multiple matches are allowed; hints are ordered by category ID.
    pub fn extract_category_hints(&self, lowered: &str, categories: &[Category]) -> Vec<u64> {
        let mut hints: Vec<u64> = categories
            .iter()
            .filter(|category| {
                let name = category.name.to_lowercase();
                if !name.is_empty() && lowered.contains(&name) {
                    return true;
                }
                category.synonyms.iter().any(|synonym| {
                    let synonym = synonym.to_lowercase();
                    !synonym.is_empty() && lowered.contains(&synonym)
                })
            })
            .map(|category| category.id)
            .collect();
        hints.sort_unstable();
        hints.dedup();
        hints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpreter() -> QueryInterpreter {
        QueryInterpreter::new().unwrap()
    }

    #[test]
    fn test_named_bucket_cheap() {
        let range = interpreter()
            .extract_price_range("show me cheap laptops")
            .unwrap();
        assert_eq!(range, PriceRange::new(0.0, 150.0));
    }

    #[test]
    fn test_explicit_under() {
        let range = interpreter()
            .extract_price_range("laptops under $300")
            .unwrap();
        assert_eq!(range, PriceRange::new(0.0, 300.0));
    }

    #[test]
    fn test_explicit_dash_range() {
        let range = interpreter()
            .extract_price_range("laptops $200-$400")
            .unwrap();
        assert_eq!(range, PriceRange::new(200.0, 400.0));
    }

    #[test]
    fn test_between_pattern() {
        let range = interpreter()
            .extract_price_range("laptops between $200 and $400")
            .unwrap();
        assert_eq!(range, PriceRange::new(200.0, 400.0));
    }

    #[test]
    fn test_explicit_wins_over_bucket() {
        // "cheap" is present, but the explicit pattern has precedence.
        let range = interpreter()
            .extract_price_range("cheap laptops under $500")
            .unwrap();
        assert_eq!(range, PriceRange::new(0.0, 500.0));
    }

    #[test]
    fn test_below_variant() {
        let range = interpreter()
            .extract_price_range("headphones below $80")
            .unwrap();
        assert_eq!(range, PriceRange::new(0.0, 80.0));
    }

    #[test]
    fn test_no_price_signal() {
        assert!(interpreter().extract_price_range("wireless mouse").is_none());
    }

    #[test]
    fn test_category_hints() {
        let categories = vec![
            Category::new(1, "Laptops").with_synonyms(&["notebook", "notebooks"]),
            Category::new(2, "Shoes").with_synonyms(&["footwear", "sneakers"]),
            Category::new(3, "Kitchen"),
        ];

        let interpreter = interpreter();
        let intent = interpreter.interpret("cheap notebooks for school", &categories);
        assert_eq!(intent.category_hints, vec![1]);
        assert_eq!(intent.price_range, Some(PriceRange::new(0.0, 150.0)));

        let intent = interpreter.interpret("sneakers and laptops", &categories);
        assert_eq!(intent.category_hints, vec![1, 2]);

        let intent = interpreter.interpret("garden hose", &categories);
        assert!(intent.category_hints.is_empty());
    }

    #[test]
    fn test_interpret_keeps_raw_text() {
        let intent = interpreter().interpret("Cheap Laptops", &[]);
        assert_eq!(intent.raw_text, "Cheap Laptops");
        assert!(intent.price_range.is_some());
    }
}
