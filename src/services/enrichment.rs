/// Best-effort metadata enrichment
///
/// Overlays poster and IMDB links from the metadata provider onto a
/// candidate list, and serves the provider's trending list in candidate
/// form. Enrichment is total: provider errors are caught per call and map
/// to explicit `None` fields, never to a failed request.
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};

use crate::{
    models::{Candidate, Source},
    services::providers::MetadataProvider,
};

#[derive(Clone)]
pub struct MetadataEnricher {
    provider: Arc<dyn MetadataProvider>,
}

impl MetadataEnricher {
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self { provider }
    }

    /// Attaches `poster_url` and `imdb_url` to each candidate.
    ///
    /// Returns a list of the same length and order as the input. Without a
    /// configured credential this is a passthrough. Per-candidate lookups
    /// are independent, so they fan out as concurrent tasks and are joined
    /// in input order to keep the output deterministic.
    pub async fn enrich(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        if !self.provider.is_configured() {
            return candidates;
        }

        let mut tasks = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let provider = Arc::clone(&self.provider);
            let fallback = candidate.clone();
            let task = tokio::spawn(async move { enrich_candidate(provider, candidate).await });
            tasks.push((fallback, task));
        }

        let mut enriched = Vec::with_capacity(tasks.len());
        for (fallback, task) in tasks {
            enriched.push(task.await.unwrap_or_else(|e| {
                tracing::error!(title = %fallback.title, error = %e, "Enrichment task failed");
                fallback
            }));
        }
        enriched
    }

    /// The provider's daily trending list as up-to-`limit` candidates.
    ///
    /// Trending entries carry no similarity score; they are labeled with
    /// the `trending` source and a placeholder genre, since the trending
    /// endpoint does not expose one.
    pub async fn trending(&self, limit: usize) -> Vec<Candidate> {
        if !self.provider.is_configured() {
            return Vec::new();
        }

        let entries = match self.provider.trending().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch trending movies");
                return Vec::new();
            }
        };

        let mut trending = Vec::new();
        for entry in entries.into_iter().take(limit) {
            let imdb_url = match self.provider.imdb_url(entry.id).await {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(title = %entry.title, error = %e, "IMDB lookup failed");
                    None
                }
            };

            trending.push(Candidate {
                title: entry.title,
                genre: Some("Trending".to_string()),
                director: None,
                year: entry.release_date.as_deref().and_then(release_year),
                score: None,
                source: Source::Trending,
                poster_url: entry.poster_url,
                imdb_url,
            });
        }
        trending
    }
}

/// Looks up one candidate and overlays the resolved links.
///
/// Both fields are always written: resolved values on a match, explicit
/// `None` otherwise, so the response schema is stable either way.
async fn enrich_candidate(
    provider: Arc<dyn MetadataProvider>,
    mut candidate: Candidate,
) -> Candidate {
    let matched = match provider.search_movie(&candidate.title, candidate.year).await {
        Ok(matched) => matched,
        Err(e) => {
            tracing::warn!(title = %candidate.title, error = %e, "Metadata lookup failed");
            None
        }
    };

    match matched {
        Some(found) => {
            candidate.poster_url = found.poster_url;
            candidate.imdb_url = match provider.imdb_url(found.id).await {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(title = %candidate.title, error = %e, "IMDB lookup failed");
                    None
                }
            };
        }
        None => {
            candidate.poster_url = None;
            candidate.imdb_url = None;
        }
    }
    candidate
}

fn release_year(date: &str) -> Option<i32> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .map(|d| d.year())
}
