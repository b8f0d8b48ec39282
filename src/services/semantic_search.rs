/// Semantic search over the movie vector index
///
/// Composes an [`Embedder`] with a [`VectorIndex`] into a single
/// search-by-text operation, including collection provisioning on first use
/// and batched, retried ingestion.
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    embedding::Embedder,
    error::{AppError, AppResult},
    models::{Candidate, Movie, Source},
    services::providers::{IndexPayload, IndexPoint, VectorIndex},
};

const BATCH_SIZE: usize = 50;
const MAX_UPLOAD_ATTEMPTS: u32 = 3;
const UPLOAD_RETRY_BACKOFF: Duration = Duration::from_secs(3);

/// Where `index_movies` reads its records from
pub enum MovieSource {
    Records(Vec<Movie>),
    JsonFile(PathBuf),
}

/// The vector stage of the pipeline, as seen by the recommender
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SemanticSearch: Send + Sync {
    /// Top-k similarity search; results come back in the index's rank
    /// order with scores rounded to 4 decimal places.
    async fn search(&self, query: &str, top_k: usize) -> AppResult<Vec<Candidate>>;
}

pub struct SemanticSearchService {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl SemanticSearchService {
    /// Builds the service and provisions the backing collection.
    ///
    /// If the collection is missing it is created for cosine ranking at the
    /// embedder's dimensionality, which makes a first run against an empty
    /// vector store self-healing; an existing collection is reused as-is.
    pub async fn connect(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
    ) -> AppResult<Self> {
        if index.collection_exists().await? {
            tracing::info!("Using existing vector collection");
        } else {
            let dimension = embedder.dimension();
            tracing::info!(dimension, "Creating vector collection");
            index.create_collection(dimension).await?;
        }

        Ok(Self { embedder, index })
    }

    /// Embeds and upserts movie records in fixed-size batches.
    ///
    /// Movies without plot text are skipped (there is nothing to embed).
    /// Each batch is retried up to 3 times with a fixed backoff; a batch
    /// that still fails is skipped rather than aborting the run, since
    /// ingestion is a maintenance operation and upserts are idempotent.
    /// Returns the number of movies indexed.
    pub async fn index_movies(&self, source: MovieSource) -> AppResult<usize> {
        let movies = match source {
            MovieSource::Records(movies) => movies,
            MovieSource::JsonFile(path) => {
                let raw = tokio::fs::read_to_string(&path).await.map_err(|e| {
                    AppError::InvalidInput(format!(
                        "Failed to read movie data file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                serde_json::from_str::<Vec<Movie>>(&raw).map_err(|e| {
                    AppError::InvalidInput(format!("Invalid movie data file: {}", e))
                })?
            }
        };

        let eligible: Vec<Movie> = movies
            .into_iter()
            .filter(|m| m.plot.as_deref().is_some_and(|p| !p.trim().is_empty()))
            .collect();

        let total_batches = eligible.len().div_ceil(BATCH_SIZE);
        tracing::info!(movies = eligible.len(), total_batches, "Indexing movies");

        let mut indexed = 0;
        for (batch_index, chunk) in eligible.chunks(BATCH_SIZE).enumerate() {
            let batch_number = batch_index + 1;
            let plots: Vec<String> = chunk
                .iter()
                .map(|m| m.plot.clone().unwrap_or_default())
                .collect();
            let vectors = self.embedder.embed_batch(&plots).await?;

            let points: Vec<IndexPoint> = chunk
                .iter()
                .zip(vectors)
                .map(|(movie, vector)| IndexPoint {
                    id: movie.id,
                    vector,
                    payload: IndexPayload {
                        title: Some(movie.title.clone()),
                        genre: movie.genre.clone(),
                        director: movie.director.clone(),
                        year: movie.year,
                    },
                })
                .collect();

            let mut attempt = 0;
            loop {
                attempt += 1;
                match self.index.upsert(points.clone()).await {
                    Ok(()) => {
                        indexed += points.len();
                        tracing::info!(
                            batch = batch_number,
                            total_batches,
                            "Indexed batch"
                        );
                        break;
                    }
                    Err(e) if attempt < MAX_UPLOAD_ATTEMPTS => {
                        tracing::warn!(
                            batch = batch_number,
                            attempt,
                            error = %e,
                            "Batch upload failed, retrying"
                        );
                        tokio::time::sleep(UPLOAD_RETRY_BACKOFF).await;
                    }
                    Err(e) => {
                        tracing::error!(
                            batch = batch_number,
                            attempts = MAX_UPLOAD_ATTEMPTS,
                            error = %e,
                            "Skipping batch after repeated upload failures"
                        );
                        break;
                    }
                }
            }
        }

        tracing::info!(indexed, "Finished indexing movies");
        Ok(indexed)
    }
}

/// Cosine scores are reported to 4 decimal places
fn round_score(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}

#[async_trait::async_trait]
impl SemanticSearch for SemanticSearchService {
    async fn search(&self, query: &str, top_k: usize) -> AppResult<Vec<Candidate>> {
        let vector = self.embedder.embed(query).await?;
        let hits = self.index.query(vector, top_k).await?;

        // No client-side re-ranking: the index's order is the result order.
        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                let title = hit.payload.title?;
                Some(Candidate {
                    title,
                    genre: hit.payload.genre,
                    director: hit.payload.director,
                    year: hit.payload.year,
                    score: Some(round_score(hit.score)),
                    source: Source::Vector,
                    poster_url: None,
                    imdb_url: None,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbedder;
    use crate::services::providers::{MockVectorIndex, ScoredHit};
    use std::io::Write;

    fn hit(title: Option<&str>, score: f64) -> ScoredHit {
        ScoredHit {
            payload: IndexPayload {
                title: title.map(str::to_string),
                genre: Some("Sci-Fi".to_string()),
                director: None,
                year: Some(2010),
            },
            score,
        }
    }

    fn movie(id: u64, title: &str, plot: Option<&str>) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            genre: None,
            director: None,
            year: None,
            plot: plot.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_connect_creates_missing_collection() {
        let mut embedder = MockEmbedder::new();
        embedder.expect_dimension().return_const(384usize);

        let mut index = MockVectorIndex::new();
        index.expect_collection_exists().returning(|| Ok(false));
        index
            .expect_create_collection()
            .withf(|dimension| *dimension == 384)
            .times(1)
            .returning(|_| Ok(()));

        SemanticSearchService::connect(Arc::new(embedder), Arc::new(index))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_connect_reuses_existing_collection() {
        let mut embedder = MockEmbedder::new();
        embedder.expect_dimension().return_const(384usize);

        let mut index = MockVectorIndex::new();
        index.expect_collection_exists().returning(|| Ok(true));
        index.expect_create_collection().times(0);

        SemanticSearchService::connect(Arc::new(embedder), Arc::new(index))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_search_rounds_scores_and_preserves_order() {
        let mut embedder = MockEmbedder::new();
        embedder.expect_embed().returning(|_| Ok(vec![0.1, 0.2]));

        let mut index = MockVectorIndex::new();
        index.expect_query().returning(|_, _| {
            Ok(vec![
                hit(Some("Inception"), 0.913_456_78),
                hit(Some("Interstellar"), 0.87),
            ])
        });

        let service = SemanticSearchService {
            embedder: Arc::new(embedder),
            index: Arc::new(index),
        };

        let results = service.search("dream heist", 4).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Inception");
        assert_eq!(results[0].score, Some(0.9135));
        assert_eq!(results[0].source, Source::Vector);
        assert_eq!(results[1].title, "Interstellar");
        assert_eq!(results[1].score, Some(0.87));
    }

    #[tokio::test]
    async fn test_search_skips_hits_without_title() {
        let mut embedder = MockEmbedder::new();
        embedder.expect_embed().returning(|_| Ok(vec![0.5]));

        let mut index = MockVectorIndex::new();
        index
            .expect_query()
            .returning(|_, _| Ok(vec![hit(None, 0.99), hit(Some("Alien"), 0.42)]));

        let service = SemanticSearchService {
            embedder: Arc::new(embedder),
            index: Arc::new(index),
        };

        let results = service.search("space horror", 4).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Alien");
    }

    #[tokio::test]
    async fn test_index_movies_skips_records_without_plot() {
        let mut embedder = MockEmbedder::new();
        embedder
            .expect_embed_batch()
            .withf(|plots| plots.len() == 1)
            .times(1)
            .returning(|plots| Ok(vec![vec![0.0; 3]; plots.len()]));

        let mut index = MockVectorIndex::new();
        index
            .expect_upsert()
            .withf(|points| points.len() == 1 && points[0].id == 1)
            .times(1)
            .returning(|_| Ok(()));

        let service = SemanticSearchService {
            embedder: Arc::new(embedder),
            index: Arc::new(index),
        };

        let indexed = service
            .index_movies(MovieSource::Records(vec![
                movie(1, "Solaris", Some("A psychologist visits a space station")),
                movie(2, "No Plot", None),
                movie(3, "Blank Plot", Some("   ")),
            ]))
            .await
            .unwrap();

        assert_eq!(indexed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_index_movies_skips_batch_after_exhausted_retries() {
        let mut embedder = MockEmbedder::new();
        embedder
            .expect_embed_batch()
            .times(1)
            .returning(|plots| Ok(vec![vec![0.0; 3]; plots.len()]));

        let mut index = MockVectorIndex::new();
        index
            .expect_upsert()
            .times(3)
            .returning(|_| Err(AppError::VectorIndex("upstream timeout".to_string())));

        let service = SemanticSearchService {
            embedder: Arc::new(embedder),
            index: Arc::new(index),
        };

        // Partial-success ingestion: the failing batch is dropped, not fatal.
        let indexed = service
            .index_movies(MovieSource::Records(vec![movie(
                1,
                "Solaris",
                Some("A psychologist visits a space station"),
            )]))
            .await
            .unwrap();

        assert_eq!(indexed, 0);
    }

    #[tokio::test]
    async fn test_index_movies_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": 9, "title": "Arrival", "release_year": 2016, "plot": "A linguist decodes an alien language"}}]"#
        )
        .unwrap();

        let mut embedder = MockEmbedder::new();
        embedder
            .expect_embed_batch()
            .returning(|plots| Ok(vec![vec![0.0; 3]; plots.len()]));

        let mut index = MockVectorIndex::new();
        index
            .expect_upsert()
            .withf(|points| {
                points.len() == 1
                    && points[0].id == 9
                    && points[0].payload.year == Some(2016)
            })
            .times(1)
            .returning(|_| Ok(()));

        let service = SemanticSearchService {
            embedder: Arc::new(embedder),
            index: Arc::new(index),
        };

        let indexed = service
            .index_movies(MovieSource::JsonFile(file.path().to_path_buf()))
            .await
            .unwrap();
        assert_eq!(indexed, 1);
    }

    #[tokio::test]
    async fn test_index_movies_missing_file_is_invalid_input() {
        let embedder = MockEmbedder::new();
        let index = MockVectorIndex::new();

        let service = SemanticSearchService {
            embedder: Arc::new(embedder),
            index: Arc::new(index),
        };

        let err = service
            .index_movies(MovieSource::JsonFile(PathBuf::from(
                "/nonexistent/movies.json",
            )))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_round_score() {
        assert_eq!(round_score(0.913_456_78), 0.9135);
        assert_eq!(round_score(-0.000_04), -0.0);
        assert_eq!(round_score(1.0), 1.0);
    }
}
