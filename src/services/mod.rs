pub mod enrichment;
pub mod providers;
pub mod recommender;
pub mod semantic_search;

pub use enrichment::MetadataEnricher;
pub use recommender::HybridRecommender;
pub use semantic_search::{MovieSource, SemanticSearch, SemanticSearchService};
