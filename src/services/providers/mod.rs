/// Backing-store provider abstractions
///
/// This module defines the seams between the recommendation pipeline and its
/// three external collaborators: the vector index (Qdrant), the knowledge
/// graph (Neo4j), and the metadata provider (TMDB). Each is a long-lived,
/// shared, read-mostly client held for the life of the serving process; the
/// traits keep the pipeline testable against mocks.
use serde::{Deserialize, Serialize};

use crate::{error::AppResult, models::movie::year_flexible};

pub mod neo4j;
pub mod qdrant;
pub mod tmdb;

/// Metadata stored alongside each vector in the index.
///
/// `title` is the join key across stores, so points without one are useless
/// to the pipeline and get filtered out of search results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default, deserialize_with = "year_flexible")]
    pub year: Option<i32>,
}

/// One point to upsert into the vector index
#[derive(Debug, Clone, Serialize)]
pub struct IndexPoint {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: IndexPayload,
}

/// One ranked hit from a similarity query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredHit {
    pub payload: IndexPayload,
    pub score: f64,
}

/// A movie surfaced by graph traversal
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedMovie {
    pub title: String,
    pub genre: Option<String>,
    pub year: Option<i32>,
}

/// Best metadata-provider match for a title
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderMatch {
    /// Provider-internal id, used for the follow-up IMDB lookup
    pub id: u64,
    pub poster_url: Option<String>,
}

/// One entry from the provider's trending list
#[derive(Debug, Clone, PartialEq)]
pub struct TrendingEntry {
    pub id: u64,
    pub title: String,
    pub poster_url: Option<String>,
    pub release_date: Option<String>,
}

/// Trait for vector index backends
///
/// Upserts are keyed by point id, so repeating one after a partial failure
/// is safe; query results come back in the index's rank order.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Whether the backing collection already exists
    async fn collection_exists(&self) -> AppResult<bool>;

    /// Create the collection, configured for cosine distance at `dimension`
    async fn create_collection(&self, dimension: usize) -> AppResult<()>;

    /// Upsert a batch of points by id
    async fn upsert(&self, points: Vec<IndexPoint>) -> AppResult<()>;

    /// Top-`limit` similarity query, ranked by descending score
    async fn query(&self, vector: Vec<f32>, limit: usize) -> AppResult<Vec<ScoredHit>>;
}

/// Trait for knowledge-graph backends
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait KnowledgeGraph: Send + Sync {
    /// Movies related to the named seed through a shared director, cast
    /// member, or genre. Excludes the seed itself, deduplicated within the
    /// traversal, truncated to `limit`.
    async fn related_movies(&self, title: &str, limit: usize) -> AppResult<Vec<RelatedMovie>>;
}

/// Graph backend used when no graph database is configured
///
/// Every traversal yields zero results, degrading recommendations to pure
/// vector search without failing requests.
pub struct DisabledGraph;

#[async_trait::async_trait]
impl KnowledgeGraph for DisabledGraph {
    async fn related_movies(&self, _title: &str, _limit: usize) -> AppResult<Vec<RelatedMovie>> {
        Ok(Vec::new())
    }
}

/// Trait for external metadata providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Whether an API credential is configured.
    ///
    /// A missing credential is a configuration concern, not a pipeline
    /// failure: callers skip enrichment entirely when this is false.
    fn is_configured(&self) -> bool;

    /// Best (first) match for a title, optionally filtered by release year
    async fn search_movie(
        &self,
        title: &str,
        year: Option<i32>,
    ) -> AppResult<Option<ProviderMatch>>;

    /// Canonical IMDB URL for a provider-internal id, when one exists
    async fn imdb_url(&self, provider_id: u64) -> AppResult<Option<String>>;

    /// The provider's current daily trending list, in provider rank order
    async fn trending(&self) -> AppResult<Vec<TrendingEntry>>;
}
