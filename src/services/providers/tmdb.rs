/// TMDB metadata provider
///
/// Three endpoints are used: title search (best match for enrichment),
/// movie details (TMDB id to IMDB id), and the daily trending list. All
/// calls require the API key; without one the client degrades to empty
/// responses and the enrichment layer skips it entirely.
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    services::providers::{MetadataProvider, ProviderMatch, TrendingEntry},
};

const TMDB_API_URL: &str = "https://api.themoviedb.org/3";
const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";
const IMDB_BASE_URL: &str = "https://www.imdb.com/title/";

pub struct TmdbClient {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
}

impl TmdbClient {
    pub fn new(api_key: Option<String>) -> Self {
        if api_key.is_none() {
            tracing::warn!("TMDB_API_KEY is not set; recommendations will not be enriched");
        }

        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: TMDB_API_URL.to_string(),
        }
    }

    async fn check_status(response: reqwest::Response) -> AppResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::ExternalApi(format!(
            "TMDB returned status {}: {}",
            status, body
        )))
    }
}

/// Movie fields shared by the search and trending endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResultsEnvelope {
    #[serde(default)]
    results: Vec<TmdbMovie>,
}

#[derive(Debug, Deserialize)]
struct MovieDetails {
    #[serde(default)]
    imdb_id: Option<String>,
}

fn poster_url(poster_path: Option<String>) -> Option<String> {
    poster_path.map(|path| format!("{}{}", POSTER_BASE_URL, path))
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search_movie(
        &self,
        title: &str,
        year: Option<i32>,
    ) -> AppResult<Option<ProviderMatch>> {
        let Some(api_key) = &self.api_key else {
            return Ok(None);
        };

        let mut params = vec![
            ("api_key", api_key.clone()),
            ("query", title.to_string()),
        ];
        if let Some(year) = year {
            params.push(("year", year.to_string()));
        }

        let response = self
            .http_client
            .get(format!("{}/search/movie", self.api_url))
            .query(&params)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let envelope: ResultsEnvelope = response.json().await?;

        // The first result is usually the best match.
        Ok(envelope.results.into_iter().next().map(|movie| ProviderMatch {
            id: movie.id,
            poster_url: poster_url(movie.poster_path),
        }))
    }

    async fn imdb_url(&self, provider_id: u64) -> AppResult<Option<String>> {
        let Some(api_key) = &self.api_key else {
            return Ok(None);
        };

        let response = self
            .http_client
            .get(format!("{}/movie/{}", self.api_url, provider_id))
            .query(&[("api_key", api_key.as_str())])
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let details: MovieDetails = response.json().await?;

        Ok(details
            .imdb_id
            .map(|id| format!("{}{}", IMDB_BASE_URL, id)))
    }

    async fn trending(&self) -> AppResult<Vec<TrendingEntry>> {
        let Some(api_key) = &self.api_key else {
            return Ok(Vec::new());
        };

        let response = self
            .http_client
            .get(format!("{}/trending/movie/day", self.api_url))
            .query(&[("api_key", api_key.as_str())])
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let envelope: ResultsEnvelope = response.json().await?;

        Ok(envelope
            .results
            .into_iter()
            .filter_map(|movie| {
                let title = movie.title?;
                Some(TrendingEntry {
                    id: movie.id,
                    title,
                    poster_url: poster_url(movie.poster_path),
                    release_date: movie.release_date,
                })
            })
            .collect())
    }
}
