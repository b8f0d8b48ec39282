/// Neo4j knowledge-graph client
///
/// Runs the relationship-expansion traversal through Neo4j's HTTP
/// transactional Cypher endpoint. The graph schema is owned by the ingestion
/// side: `Movie`, `Director`, `Actor`, and `Genre` nodes joined by
/// `DIRECTED_BY`, `ACTED_IN`, and `HAS_GENRE` relationships.
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::year_from_value,
    services::providers::{KnowledgeGraph, RelatedMovie},
};

/// Unions three independent paths out of the seed movie: same director,
/// shared cast member, same genre. The seed is excluded from its own
/// results and rows are deduplicated before the limit applies.
const RELATED_MOVIES_CYPHER: &str = "\
MATCH (m:Movie {title: $title})
CALL {
    WITH m
    OPTIONAL MATCH (m)-[:DIRECTED_BY]->(:Director)<-[:DIRECTED_BY]-(r:Movie)
    WHERE r <> m
    RETURN r
    UNION
    WITH m
    OPTIONAL MATCH (m)<-[:ACTED_IN]-(:Actor)-[:ACTED_IN]->(r:Movie)
    WHERE r <> m
    RETURN r
    UNION
    WITH m
    OPTIONAL MATCH (m)-[:HAS_GENRE]->(:Genre)<-[:HAS_GENRE]-(r:Movie)
    WHERE r <> m
    RETURN r
}
WITH r WHERE r IS NOT NULL
RETURN DISTINCT r.title AS title, r.genre AS genre, r.release_year AS year
LIMIT $limit";

pub struct Neo4jGraph {
    http_client: HttpClient,
    base_url: String,
    database: String,
    user: String,
    password: Option<String>,
}

impl Neo4jGraph {
    pub fn new(
        base_url: String,
        database: String,
        user: String,
        password: Option<String>,
    ) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            database,
            user,
            password,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TransactionResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<Neo4jError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    data: Vec<RowEnvelope>,
}

#[derive(Debug, Deserialize)]
struct RowEnvelope {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Neo4jError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Decodes `[title, genre, year]` rows, dropping any without a title
fn parse_rows(results: Vec<StatementResult>) -> Vec<RelatedMovie> {
    results
        .into_iter()
        .flat_map(|result| result.data)
        .filter_map(|envelope| {
            let mut row = envelope.row.into_iter();
            let title = row.next().and_then(|v| v.as_str().map(str::to_string))?;
            let genre = row.next().and_then(|v| v.as_str().map(str::to_string));
            let year = row.next().as_ref().and_then(year_from_value);
            Some(RelatedMovie { title, genre, year })
        })
        .collect()
}

#[async_trait::async_trait]
impl KnowledgeGraph for Neo4jGraph {
    async fn related_movies(&self, title: &str, limit: usize) -> AppResult<Vec<RelatedMovie>> {
        let url = format!("{}/db/{}/tx/commit", self.base_url, self.database);
        let body = json!({
            "statements": [{
                "statement": RELATED_MOVIES_CYPHER,
                "parameters": { "title": title, "limit": limit },
            }]
        });

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.user, self.password.as_deref())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Graph(format!(
                "Neo4j returned status {}: {}",
                status, text
            )));
        }

        let transaction: TransactionResponse = response.json().await?;

        if let Some(error) = transaction.errors.first() {
            return Err(AppError::Graph(format!(
                "{}: {}",
                error.code, error.message
            )));
        }

        let related = parse_rows(transaction.results);

        tracing::debug!(
            seed = %title,
            related = related.len(),
            "Graph traversal completed"
        );

        Ok(related)
    }
}
