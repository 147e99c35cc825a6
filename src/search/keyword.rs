//! Lexical keyword search over the catalog.

use std::cmp::Ordering;

use crate::catalog::{CatalogItem, CatalogReader, ProductFilter};
use crate::error::Result;

/// Hard cap on keyword results.
pub const MAX_KEYWORD_RESULTS: usize = 50;

/// Minimum term length; shorter terms are ignored.
const MIN_TERM_LEN: usize = 2;

/// Split query text into lowercase search terms.
pub fn query_terms(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|term| term.len() >= MIN_TERM_LEN)
        .map(|term| term.to_string())
        .collect()
}

/// Run a keyword search: every term must match (AND) across an OR of name,
/// description, short description and SKU; structured filters are hard
/// constraints. Results come back in the standalone default order (featured
/// desc, sale desc, name asc), capped at [`MAX_KEYWORD_RESULTS`].
///
/// A zero-match AND search returns empty with no internal fallback;
/// broadening is the hybrid merger's responsibility.
pub fn keyword_search(
    catalog: &dyn CatalogReader,
    query: &str,
    filter: &ProductFilter,
) -> Result<Vec<CatalogItem>> {
    let terms = query_terms(query);
    let mut matches: Vec<CatalogItem> = catalog
        .get_active_products(filter)?
        .into_iter()
        .filter(|item| matches_all_terms(item, &terms))
        .collect();

    matches.sort_by(default_order);
    matches.truncate(MAX_KEYWORD_RESULTS);
    Ok(matches)
}

fn matches_all_terms(item: &CatalogItem, terms: &[String]) -> bool {
    if terms.is_empty() {
        return true;
    }

    let name = item.name.to_lowercase();
    let description = item.description.to_lowercase();
    let short_description = item.short_description.to_lowercase();
    let sku = item.sku.to_lowercase();

    terms.iter().all(|term| {
        name.contains(term)
            || description.contains(term)
            || short_description.contains(term)
            || sku.contains(term)
    })
}

fn default_order(a: &CatalogItem, b: &CatalogItem) -> Ordering {
    b.is_featured
        .cmp(&a.is_featured)
        .then(b.is_sale.cmp(&a.is_sale))
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MemoryCatalog, PriceRange};

    fn catalog() -> MemoryCatalog {
        let catalog = MemoryCatalog::new();
        catalog.put_product(
            CatalogItem::new(1, "Blue Running Shoe")
                .with_description("Lightweight shoe for daily runs")
                .with_short_description("Cushioned road trainer")
                .with_price(90.0)
                .with_stock(5),
        );
        catalog.put_product(
            CatalogItem::new(2, "Trail Running Shoe")
                .with_description("Grippy outsole for trail running")
                .with_price(120.0)
                .featured(),
        );
        catalog.put_product(
            CatalogItem::new(3, "Leather Dress Shoe")
                .with_description("Classic oxford")
                .with_price(150.0),
        );
        catalog.put_product(
            CatalogItem::new(4, "Espresso Machine")
                .with_sku("RUN-4000")
                .with_price(300.0),
        );
        catalog
    }

    #[test]
    fn test_query_terms_drop_short_tokens() {
        assert_eq!(query_terms("a running shoe"), vec!["running", "shoe"]);
        assert!(query_terms("a b").is_empty());
    }

    #[test]
    fn test_and_semantics() {
        let catalog = catalog();
        let results =
            keyword_search(&catalog, "running shoe", &ProductFilter::default()).unwrap();

        let ids: Vec<u64> = results.iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&1));
        assert!(ids.contains(&2));
    }

    #[test]
    fn test_short_description_participates_in_matching() {
        let catalog = catalog();
        let results = keyword_search(&catalog, "trainer", &ProductFilter::default()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 1);
    }

    #[test]
    fn test_sku_participates_in_matching() {
        let catalog = catalog();
        let results = keyword_search(&catalog, "run-4000", &ProductFilter::default()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 4);
    }

    #[test]
    fn test_default_order_featured_first() {
        let catalog = catalog();
        let results = keyword_search(&catalog, "shoe", &ProductFilter::default()).unwrap();
        // Featured trail shoe sorts above the others; the rest by name.
        assert_eq!(results[0].id, 2);
        assert_eq!(results[1].id, 1);
        assert_eq!(results[2].id, 3);
    }

    #[test]
    fn test_structured_filters_are_hard() {
        let catalog = catalog();
        let filter = ProductFilter {
            price_range: Some(PriceRange::new(0.0, 100.0)),
            ..Default::default()
        };
        let results = keyword_search(&catalog, "shoe", &filter).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 1);
    }

    #[test]
    fn test_zero_match_returns_empty() {
        let catalog = catalog();
        let results =
            keyword_search(&catalog, "quantum flux capacitor", &ProductFilter::default()).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_result_cap() {
        let catalog = MemoryCatalog::new();
        for id in 0..80 {
            catalog.put_product(CatalogItem::new(id, &format!("Widget {id}")));
        }

        let results = keyword_search(&catalog, "widget", &ProductFilter::default()).unwrap();
        assert_eq!(results.len(), MAX_KEYWORD_RESULTS);
    }
}
