use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{error::AppResult, models::Candidate};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct RecommendParams {
    /// Free-text description of the movie or theme
    pub query: String,
    #[serde(default = "default_vector_limit")]
    pub vector_limit: usize,
    #[serde(default = "default_graph_limit")]
    pub graph_limit: usize,
}

fn default_vector_limit() -> usize {
    4
}

fn default_graph_limit() -> usize {
    4
}

#[derive(Debug, Deserialize)]
pub struct TrendingParams {
    #[serde(default = "default_trending_limit")]
    pub limit: usize,
}

fn default_trending_limit() -> usize {
    6
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Handler for the hybrid recommendation endpoint
///
/// Example: `/recommend?query=sci-fi+movie+about+AI+rebellion`
pub async fn recommend(
    State(state): State<AppState>,
    Query(params): Query<RecommendParams>,
) -> AppResult<Json<Vec<Candidate>>> {
    let candidates = state
        .recommender
        .recommend(&params.query, params.vector_limit, params.graph_limit)
        .await?;
    Ok(Json(candidates))
}

/// Handler for the daily trending endpoint
pub async fn trending(
    State(state): State<AppState>,
    Query(params): Query<TrendingParams>,
) -> Json<Vec<Candidate>> {
    Json(state.recommender.trending(params.limit).await)
}
