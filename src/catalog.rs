//! Catalog data model and read-only catalog access.
//!
//! The catalog is owned by an external relational store; the search engine
//! only ever reads it through [`CatalogReader`]. [`MemoryCatalog`] is an
//! in-process implementation used by tests and demos.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// An inclusive price range in the catalog's currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    /// Lower bound (inclusive).
    pub min: f64,
    /// Upper bound (inclusive).
    pub max: f64,
}

impl PriceRange {
    /// Create a new price range.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Check whether a price falls inside this range.
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }
}

/// A product record as read from the catalog store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Product ID.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Long-form description.
    pub description: String,
    /// Short description used in listings.
    pub short_description: String,
    /// Stock keeping unit.
    pub sku: String,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Regular price.
    pub price: f64,
    /// Discounted price, if the product is on sale.
    pub sale_price: Option<f64>,
    /// Units in stock.
    pub stock: u32,
    /// Owning category, if any.
    pub category_id: Option<u64>,
    /// Owning brand, if any.
    pub brand_id: Option<u64>,
    /// Whether the product is visible to shoppers.
    pub is_active: bool,
    /// Whether the product is featured.
    pub is_featured: bool,
    /// Whether the product is on sale.
    pub is_sale: bool,
    /// Whether the product is marked as new.
    pub is_new: bool,
    /// Creation time in the catalog store.
    pub created_at: DateTime<Utc>,
}

impl CatalogItem {
    /// Create a minimal active product, for use in tests and demos.
    pub fn new(id: u64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            description: String::new(),
            short_description: String::new(),
            sku: String::new(),
            tags: Vec::new(),
            price: 0.0,
            sale_price: None,
            stock: 0,
            category_id: None,
            brand_id: None,
            is_active: true,
            is_featured: false,
            is_sale: false,
            is_new: false,
            created_at: Utc::now(),
        }
    }

    /// Set the long description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Set the short description.
    pub fn with_short_description(mut self, short_description: &str) -> Self {
        self.short_description = short_description.to_string();
        self
    }

    /// Set the SKU.
    pub fn with_sku(mut self, sku: &str) -> Self {
        self.sku = sku.to_string();
        self
    }

    /// Set the tags.
    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Set the regular price.
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    /// Set the sale price and mark the product as on sale.
    pub fn with_sale_price(mut self, sale_price: f64) -> Self {
        self.sale_price = Some(sale_price);
        self.is_sale = true;
        self
    }

    /// Set the stock level.
    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    /// Set the owning category.
    pub fn with_category(mut self, category_id: u64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Set the owning brand.
    pub fn with_brand(mut self, brand_id: u64) -> Self {
        self.brand_id = Some(brand_id);
        self
    }

    /// Mark the product as featured.
    pub fn featured(mut self) -> Self {
        self.is_featured = true;
        self
    }

    /// Mark the product as new.
    pub fn new_arrival(mut self) -> Self {
        self.is_new = true;
        self
    }

    /// The price a shopper would currently pay.
    pub fn effective_price(&self) -> f64 {
        if self.is_sale {
            self.sale_price.unwrap_or(self.price)
        } else {
            self.price
        }
    }

    /// Check whether this item satisfies the given structured filter.
    pub fn matches_filter(&self, filter: &ProductFilter) -> bool {
        if let Some(category_id) = filter.category_id
            && self.category_id != Some(category_id)
        {
            return false;
        }
        if let Some(brand_id) = filter.brand_id
            && self.brand_id != Some(brand_id)
        {
            return false;
        }
        if let Some(range) = filter.price_range
            && !range.contains(self.effective_price())
        {
            return false;
        }
        if filter.in_stock_only && self.stock == 0 {
            return false;
        }
        if filter.featured_only && !self.is_featured {
            return false;
        }
        if filter.on_sale_only && !self.is_sale {
            return false;
        }
        if filter.new_only && !self.is_new {
            return false;
        }
        true
    }
}

/// Structured constraints applied to catalog reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Restrict to a category.
    pub category_id: Option<u64>,
    /// Restrict to a brand.
    pub brand_id: Option<u64>,
    /// Restrict to an effective price range.
    pub price_range: Option<PriceRange>,
    /// Only products with stock on hand.
    pub in_stock_only: bool,
    /// Only featured products.
    pub featured_only: bool,
    /// Only products on sale.
    pub on_sale_only: bool,
    /// Only new arrivals.
    pub new_only: bool,
}

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Category ID.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Alternative names matched during query interpretation.
    pub synonyms: Vec<String>,
}

impl Category {
    /// Create a new category.
    pub fn new(id: u64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            synonyms: Vec::new(),
        }
    }

    /// Add synonyms used for query-intent matching.
    pub fn with_synonyms(mut self, synonyms: &[&str]) -> Self {
        self.synonyms = synonyms.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// A product brand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brand {
    /// Brand ID.
    pub id: u64,
    /// Display name.
    pub name: String,
}

impl Brand {
    /// Create a new brand.
    pub fn new(id: u64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

/// Read-only access to the product catalog.
///
/// Implementations must provide consistent reads; the search engine never
/// mutates the catalog through this interface.
pub trait CatalogReader: Send + Sync {
    /// All active products satisfying the structured filter.
    fn get_active_products(&self, filter: &ProductFilter) -> Result<Vec<CatalogItem>>;

    /// Look up one product by ID. Inactive products are not returned.
    fn get_product(&self, id: u64) -> Result<Option<CatalogItem>>;

    /// Look up one category by ID.
    fn get_category(&self, id: u64) -> Result<Option<Category>>;

    /// Look up one brand by ID.
    fn get_brand(&self, id: u64) -> Result<Option<Brand>>;

    /// All categories, used for query-intent extraction.
    fn get_categories(&self) -> Result<Vec<Category>>;
}

#[derive(Debug, Default)]
struct MemoryCatalogInner {
    products: HashMap<u64, CatalogItem>,
    categories: HashMap<u64, Category>,
    brands: HashMap<u64, Brand>,
}

/// In-memory catalog backend for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    inner: RwLock<MemoryCatalogInner>,
}

impl MemoryCatalog {
    /// Create an empty in-memory catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty in-memory catalog wrapped in an `Arc`.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Insert or replace a product.
    pub fn put_product(&self, item: CatalogItem) {
        self.inner.write().products.insert(item.id, item);
    }

    /// Remove a product.
    pub fn delete_product(&self, id: u64) -> bool {
        self.inner.write().products.remove(&id).is_some()
    }

    /// Insert or replace a category.
    pub fn put_category(&self, category: Category) {
        self.inner.write().categories.insert(category.id, category);
    }

    /// Insert or replace a brand.
    pub fn put_brand(&self, brand: Brand) {
        self.inner.write().brands.insert(brand.id, brand);
    }
}

impl CatalogReader for MemoryCatalog {
    fn get_active_products(&self, filter: &ProductFilter) -> Result<Vec<CatalogItem>> {
        let inner = self.inner.read();
        let mut products: Vec<CatalogItem> = inner
            .products
            .values()
            .filter(|item| item.is_active && item.matches_filter(filter))
            .cloned()
            .collect();
        // Stable output order for deterministic rebuilds.
        products.sort_by_key(|item| item.id);
        Ok(products)
    }

    fn get_product(&self, id: u64) -> Result<Option<CatalogItem>> {
        let inner = self.inner.read();
        Ok(inner.products.get(&id).filter(|p| p.is_active).cloned())
    }

    fn get_category(&self, id: u64) -> Result<Option<Category>> {
        Ok(self.inner.read().categories.get(&id).cloned())
    }

    fn get_brand(&self, id: u64) -> Result<Option<Brand>> {
        Ok(self.inner.read().brands.get(&id).cloned())
    }

    fn get_categories(&self) -> Result<Vec<Category>> {
        let inner = self.inner.read();
        let mut categories: Vec<Category> = inner.categories.values().cloned().collect();
        categories.sort_by_key(|c| c.id);
        Ok(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_range_contains() {
        let range = PriceRange::new(100.0, 200.0);
        assert!(range.contains(100.0));
        assert!(range.contains(150.0));
        assert!(range.contains(200.0));
        assert!(!range.contains(99.99));
        assert!(!range.contains(200.01));
    }

    #[test]
    fn test_effective_price() {
        let item = CatalogItem::new(1, "Widget").with_price(100.0);
        assert_eq!(item.effective_price(), 100.0);

        let item = item.with_sale_price(80.0);
        assert_eq!(item.effective_price(), 80.0);
    }

    #[test]
    fn test_matches_filter() {
        let item = CatalogItem::new(1, "Widget")
            .with_price(100.0)
            .with_category(5)
            .with_stock(3);

        let mut filter = ProductFilter::default();
        assert!(item.matches_filter(&filter));

        filter.category_id = Some(5);
        filter.in_stock_only = true;
        assert!(item.matches_filter(&filter));

        filter.category_id = Some(6);
        assert!(!item.matches_filter(&filter));

        filter.category_id = Some(5);
        filter.price_range = Some(PriceRange::new(0.0, 50.0));
        assert!(!item.matches_filter(&filter));
    }

    #[test]
    fn test_memory_catalog_active_only() {
        let catalog = MemoryCatalog::new();
        let mut inactive = CatalogItem::new(2, "Hidden");
        inactive.is_active = false;

        catalog.put_product(CatalogItem::new(1, "Visible"));
        catalog.put_product(inactive);

        let products = catalog
            .get_active_products(&ProductFilter::default())
            .unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, 1);

        assert!(catalog.get_product(2).unwrap().is_none());
    }

    #[test]
    fn test_memory_catalog_deterministic_order() {
        let catalog = MemoryCatalog::new();
        for id in [5, 1, 3] {
            catalog.put_product(CatalogItem::new(id, "Item"));
        }

        let ids: Vec<u64> = catalog
            .get_active_products(&ProductFilter::default())
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }
}
