use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Embedding model identifier (fastembed model name)
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Qdrant REST endpoint URL
    pub qdrant_url: String,

    /// Qdrant API key (optional for unauthenticated local instances)
    #[serde(default)]
    pub qdrant_api_key: Option<String>,

    /// Qdrant collection name
    #[serde(default = "default_qdrant_collection")]
    pub qdrant_collection: String,

    /// Neo4j HTTP API endpoint URL; graph expansion is disabled when unset
    #[serde(default)]
    pub neo4j_http_url: Option<String>,

    /// Neo4j username
    #[serde(default = "default_neo4j_user")]
    pub neo4j_user: String,

    /// Neo4j password
    #[serde(default)]
    pub neo4j_password: Option<String>,

    /// Neo4j database name
    #[serde(default = "default_neo4j_database")]
    pub neo4j_database: String,

    /// TMDB API key; enrichment and trending are disabled when unset
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_embedding_model() -> String {
    "all-minilm-l6-v2".to_string()
}

fn default_qdrant_collection() -> String {
    "movies".to_string()
}

fn default_neo4j_user() -> String {
    "neo4j".to_string()
}

fn default_neo4j_database() -> String {
    "neo4j".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
