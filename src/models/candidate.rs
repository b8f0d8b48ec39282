use serde::{Deserialize, Serialize};

/// Which pipeline stage produced a candidate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Semantic similarity hit from the vector index
    Vector,
    /// Knowledge-graph expansion of a vector seed
    Graph,
    /// Entry from the metadata provider's trending list
    Trending,
}

/// A transient recommendation record.
///
/// Candidates live for the duration of one pipeline call and are discarded
/// once the response is returned. `score` is the cosine similarity rounded
/// to 4 decimal places and is only present for vector-origin candidates;
/// graph and trending hits are not on a comparable scale, so no unified
/// ranking metric is attempted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub title: String,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub year: Option<i32>,
    pub score: Option<f64>,
    pub source: Source,
    pub poster_url: Option<String>,
    pub imdb_url: Option<String>,
}
