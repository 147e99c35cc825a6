//! # Mercato
//!
//! A hybrid product search and ranking engine for e-commerce catalogs.
//!
//! ## Features
//!
//! - Lexical keyword search with structured filters
//! - Semantic search over deterministic text embeddings
//! - Hybrid merging with cross-method agreement boosting
//! - Multi-signal relevance scoring (text, fuzzy, business signals)
//! - Query intent extraction (price ranges, category hints)
//! - Purchase-history personalization
//! - Persistent vector index with atomic copy-on-write rebuilds

pub mod catalog;
pub mod embedding;
pub mod error;
pub mod fuzzy;
pub mod history;
pub mod index;
pub mod query;
pub mod search;
pub mod vector;

pub use error::{MercatoError, Result};
pub use search::{EngineConfig, SearchEngine, SearchMode, SearchRequest, SearchResponse};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
