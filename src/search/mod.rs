//! The query-time search pipeline.
//!
//! Keyword and semantic retrieval feed the relevance scorer and hybrid
//! merger; [`engine::SearchEngine`] ties them together behind the public
//! search API.

pub mod config;
pub mod engine;
pub mod keyword;
pub mod merger;
pub mod personalize;
pub mod scorer;
pub mod semantic;
pub mod types;

pub use config::{HybridConfig, PersonalizationConfig, ScoringWeights};
pub use engine::{EngineConfig, SearchEngine};
pub use merger::HybridMerger;
pub use personalize::PersonalizationAdjuster;
pub use scorer::{ProductSignals, RelevanceScorer, SignalCache, SignalSource};
pub use semantic::SemanticMatch;
pub use types::{
    Pagination, RebuildReport, SearchCandidate, SearchMetadata, SearchMode, SearchRequest,
    SearchResponse, SearchSource,
};
