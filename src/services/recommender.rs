/// Hybrid recommendation pipeline
///
/// Orchestrates the three stages over one request: semantic vector search
/// seeds the candidate set, knowledge-graph traversal expands each seed
/// through shared directors, cast, and genres, and the merged list is
/// enriched with external metadata. All per-request state lives on the
/// stack of one call; the collaborators are shared, long-lived clients.
use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Candidate, Source},
    services::{
        enrichment::MetadataEnricher,
        providers::{KnowledgeGraph, RelatedMovie},
        semantic_search::SemanticSearch,
    },
};

/// Ordered, title-keyed candidate collection.
///
/// The vector and graph stores share no stable identifier, so the title is
/// the join key: the first candidate seen under a title wins and later
/// duplicates are dropped, preserving discovery order.
#[derive(Default)]
struct CandidateSet {
    seen: HashSet<String>,
    items: Vec<Candidate>,
}

impl CandidateSet {
    fn insert(&mut self, candidate: Candidate) -> bool {
        if self.seen.contains(&candidate.title) {
            return false;
        }
        self.seen.insert(candidate.title.clone());
        self.items.push(candidate);
        true
    }

    fn into_vec(self) -> Vec<Candidate> {
        self.items
    }
}

fn graph_candidate(movie: RelatedMovie) -> Candidate {
    Candidate {
        title: movie.title,
        genre: movie.genre,
        director: None,
        year: movie.year,
        score: None,
        source: Source::Graph,
        poster_url: None,
        imdb_url: None,
    }
}

pub struct HybridRecommender {
    search: Arc<dyn SemanticSearch>,
    graph: Arc<dyn KnowledgeGraph>,
    enricher: MetadataEnricher,
}

impl HybridRecommender {
    pub fn new(
        search: Arc<dyn SemanticSearch>,
        graph: Arc<dyn KnowledgeGraph>,
        enricher: MetadataEnricher,
    ) -> Self {
        Self {
            search,
            graph,
            enricher,
        }
    }

    /// Runs the full pipeline for one query.
    ///
    /// An empty vector stage short-circuits to an empty result: with no
    /// seeds there is nothing to expand or enrich. Past that point every
    /// failure degrades to "this candidate gets no extra data" instead of
    /// failing the request.
    pub async fn recommend(
        &self,
        query: &str,
        vector_limit: usize,
        graph_limit: usize,
    ) -> AppResult<Vec<Candidate>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Recommendation query cannot be empty".to_string(),
            ));
        }

        let seeds = self.search.search(query, vector_limit).await?;
        if seeds.is_empty() {
            tracing::info!(query = %query, "No vector results found");
            return Ok(Vec::new());
        }

        let mut combined = CandidateSet::default();
        for seed in &seeds {
            combined.insert(seed.clone());
        }

        // Per-seed traversals are independent, so they fan out as tasks and
        // join in seed order, which keeps the merged order deterministic no
        // matter which traversal finishes first.
        let mut expansions = Vec::with_capacity(seeds.len());
        for seed in &seeds {
            let graph = Arc::clone(&self.graph);
            let title = seed.title.clone();
            expansions.push(tokio::spawn(async move {
                graph.related_movies(&title, graph_limit).await
            }));
        }

        for (seed, expansion) in seeds.iter().zip(expansions) {
            let related = match expansion.await {
                Ok(Ok(related)) => related,
                Ok(Err(e)) => {
                    tracing::warn!(seed = %seed.title, error = %e, "Graph expansion failed");
                    Vec::new()
                }
                Err(e) => {
                    tracing::error!(seed = %seed.title, error = %e, "Graph expansion task failed");
                    Vec::new()
                }
            };

            for movie in related {
                combined.insert(graph_candidate(movie));
            }
        }

        let combined = combined.into_vec();
        tracing::info!(candidates = combined.len(), "Enriching recommendations");

        Ok(self.enricher.enrich(combined).await)
    }

    /// Currently trending movies, enriched the same way as recommendations
    pub async fn trending(&self, limit: usize) -> Vec<Candidate> {
        self.enricher.trending(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::{MockKnowledgeGraph, MockMetadataProvider};
    use crate::services::semantic_search::MockSemanticSearch;

    fn vector_candidate(title: &str, score: f64) -> Candidate {
        Candidate {
            title: title.to_string(),
            genre: Some("Sci-Fi".to_string()),
            director: Some("Christopher Nolan".to_string()),
            year: Some(2010),
            score: Some(score),
            source: Source::Vector,
            poster_url: None,
            imdb_url: None,
        }
    }

    fn related(title: &str) -> RelatedMovie {
        RelatedMovie {
            title: title.to_string(),
            genre: Some("Sci-Fi".to_string()),
            year: Some(2020),
        }
    }

    /// Enricher whose provider is unconfigured, so enrich is a passthrough
    fn passthrough_enricher() -> MetadataEnricher {
        let mut provider = MockMetadataProvider::new();
        provider.expect_is_configured().return_const(false);
        MetadataEnricher::new(Arc::new(provider))
    }

    #[tokio::test]
    async fn test_pipeline_merges_and_deduplicates_in_discovery_order() {
        let mut search = MockSemanticSearch::new();
        search.expect_search().returning(|_, _| {
            Ok(vec![
                vector_candidate("Inception", 0.91),
                vector_candidate("Interstellar", 0.87),
            ])
        });

        let mut graph = MockKnowledgeGraph::new();
        graph.expect_related_movies().returning(|title, _| {
            Ok(match title {
                "Inception" => vec![related("Tenet")],
                "Interstellar" => vec![related("Inception")],
                _ => vec![],
            })
        });

        let recommender = HybridRecommender::new(
            Arc::new(search),
            Arc::new(graph),
            passthrough_enricher(),
        );

        let results = recommender.recommend("dream heist", 4, 4).await.unwrap();

        let titles: Vec<_> = results.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Inception", "Interstellar", "Tenet"]);

        // Vector seeds keep their scores; the graph hit carries none.
        assert_eq!(results[0].score, Some(0.91));
        assert_eq!(results[0].source, Source::Vector);
        assert_eq!(results[2].score, None);
        assert_eq!(results[2].source, Source::Graph);
    }

    #[tokio::test]
    async fn test_empty_vector_stage_short_circuits() {
        let mut search = MockSemanticSearch::new();
        search.expect_search().returning(|_, _| Ok(vec![]));

        let mut graph = MockKnowledgeGraph::new();
        graph.expect_related_movies().times(0);

        let mut provider = MockMetadataProvider::new();
        provider.expect_is_configured().times(0);
        provider.expect_search_movie().times(0);
        provider.expect_imdb_url().times(0);
        provider.expect_trending().times(0);

        let recommender = HybridRecommender::new(
            Arc::new(search),
            Arc::new(graph),
            MetadataEnricher::new(Arc::new(provider)),
        );

        let results = recommender
            .recommend("a movie that matches nothing", 4, 4)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_one_failed_expansion_does_not_abort_the_request() {
        let mut search = MockSemanticSearch::new();
        search.expect_search().returning(|_, _| {
            Ok(vec![
                vector_candidate("Brazil", 0.8),
                vector_candidate("Inception", 0.75),
            ])
        });

        let mut graph = MockKnowledgeGraph::new();
        graph.expect_related_movies().returning(|title, _| {
            if title == "Brazil" {
                Err(AppError::Graph("connection refused".to_string()))
            } else {
                Ok(vec![related("Tenet")])
            }
        });

        let recommender = HybridRecommender::new(
            Arc::new(search),
            Arc::new(graph),
            passthrough_enricher(),
        );

        let results = recommender.recommend("dystopia", 4, 4).await.unwrap();
        let titles: Vec<_> = results.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Brazil", "Inception", "Tenet"]);
    }

    #[tokio::test]
    async fn test_duplicate_vector_titles_collapse() {
        let mut search = MockSemanticSearch::new();
        search.expect_search().returning(|_, _| {
            Ok(vec![
                vector_candidate("Solaris", 0.9),
                vector_candidate("Solaris", 0.6),
            ])
        });

        let mut graph = MockKnowledgeGraph::new();
        // Both seeds are still expanded, even though only one survives dedup.
        graph
            .expect_related_movies()
            .times(2)
            .returning(|_, _| Ok(vec![]));

        let recommender = HybridRecommender::new(
            Arc::new(search),
            Arc::new(graph),
            passthrough_enricher(),
        );

        let results = recommender.recommend("ocean planet", 4, 4).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, Some(0.9));
    }

    #[tokio::test]
    async fn test_no_duplicate_titles_in_output() {
        let mut search = MockSemanticSearch::new();
        search.expect_search().returning(|_, _| {
            Ok(vec![
                vector_candidate("Alien", 0.95),
                vector_candidate("Aliens", 0.94),
            ])
        });

        let mut graph = MockKnowledgeGraph::new();
        graph
            .expect_related_movies()
            .returning(|_, _| Ok(vec![related("Alien"), related("Aliens"), related("Prometheus")]));

        let recommender = HybridRecommender::new(
            Arc::new(search),
            Arc::new(graph),
            passthrough_enricher(),
        );

        let results = recommender.recommend("xenomorph", 4, 4).await.unwrap();
        let mut titles: Vec<_> = results.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Alien", "Aliens", "Prometheus"]);
        titles.sort_unstable();
        titles.dedup();
        assert_eq!(titles.len(), results.len());
    }

    #[tokio::test]
    async fn test_empty_query_is_invalid_input() {
        let mut search = MockSemanticSearch::new();
        search.expect_search().times(0);

        let recommender = HybridRecommender::new(
            Arc::new(search),
            Arc::new(MockKnowledgeGraph::new()),
            passthrough_enricher(),
        );

        let err = recommender.recommend("   ", 4, 4).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_candidate_set_first_occurrence_wins() {
        let mut set = CandidateSet::default();
        assert!(set.insert(vector_candidate("Inception", 0.9)));
        assert!(!set.insert(vector_candidate("Inception", 0.1)));
        assert!(set.insert(vector_candidate("Tenet", 0.5)));

        let items = set.into_vec();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].score, Some(0.9));
    }
}
