use std::sync::Arc;

use crate::services::HybridRecommender;

/// Shared application state
///
/// Holds the fully-wired recommender behind an `Arc`; cloning the state is
/// cheap and every request sees the same long-lived collaborator clients.
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<HybridRecommender>,
}

impl AppState {
    pub fn new(recommender: Arc<HybridRecommender>) -> Self {
        Self { recommender }
    }
}
