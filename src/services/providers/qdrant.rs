/// Qdrant vector index client
///
/// Talks to the Qdrant REST API: collection lookup and creation, batched
/// point upserts, and top-k similarity queries. One instance is shared for
/// the life of the process.
use std::time::Duration;

use reqwest::{Client as HttpClient, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    services::providers::{IndexPayload, IndexPoint, ScoredHit, VectorIndex},
};

/// Batch uploads can be large; interactive queries finish well within this.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct QdrantIndex {
    http_client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    collection: String,
}

impl QdrantIndex {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        collection: String,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            collection,
        })
    }

    /// Returns the collection this index reads and writes
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self
            .http_client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }
        request
    }

    async fn check_status(response: reqwest::Response) -> AppResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::VectorIndex(format!(
            "Qdrant returned status {}: {}",
            status, body
        )))
    }
}

#[derive(Debug, Deserialize)]
struct CollectionsResponse {
    result: CollectionList,
}

#[derive(Debug, Deserialize)]
struct CollectionList {
    collections: Vec<CollectionDescription>,
}

#[derive(Debug, Deserialize)]
struct CollectionDescription {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    score: f64,
    #[serde(default)]
    payload: Option<IndexPayload>,
}

impl SearchResponse {
    fn into_hits(self) -> Vec<ScoredHit> {
        self.result
            .into_iter()
            .filter_map(|hit| {
                hit.payload.map(|payload| ScoredHit {
                    payload,
                    score: hit.score,
                })
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl VectorIndex for QdrantIndex {
    async fn collection_exists(&self) -> AppResult<bool> {
        let response = self.request(Method::GET, "/collections").send().await?;
        let response = Self::check_status(response).await?;
        let collections: CollectionsResponse = response.json().await?;

        Ok(collections
            .result
            .collections
            .iter()
            .any(|c| c.name == self.collection))
    }

    async fn create_collection(&self, dimension: usize) -> AppResult<()> {
        let response = self
            .request(Method::PUT, &format!("/collections/{}", self.collection))
            .json(&json!({
                "vectors": {
                    "size": dimension,
                    "distance": "Cosine",
                }
            }))
            .send()
            .await?;
        Self::check_status(response).await?;

        tracing::info!(
            collection = %self.collection,
            dimension,
            "Created Qdrant collection"
        );
        Ok(())
    }

    async fn upsert(&self, points: Vec<IndexPoint>) -> AppResult<()> {
        let response = self
            .request(
                Method::PUT,
                &format!("/collections/{}/points?wait=true", self.collection),
            )
            .json(&json!({ "points": points }))
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn query(&self, vector: Vec<f32>, limit: usize) -> AppResult<Vec<ScoredHit>> {
        let response = self
            .request(
                Method::POST,
                &format!("/collections/{}/points/search", self.collection),
            )
            .json(&json!({
                "vector": vector,
                "limit": limit,
                "with_payload": true,
            }))
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let results: SearchResponse = response.json().await?;

        Ok(results.into_hits())
    }
}
