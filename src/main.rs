use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use cinegraph_api::{
    api::{create_router, AppState},
    config::Config,
    embedding::FastembedEmbedder,
    services::{
        providers::{neo4j::Neo4jGraph, qdrant::QdrantIndex, tmdb::TmdbClient, DisabledGraph, KnowledgeGraph},
        HybridRecommender, MetadataEnricher, SemanticSearchService,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let embedder = Arc::new(FastembedEmbedder::load(&config.embedding_model).await?);
    let index = Arc::new(QdrantIndex::new(
        config.qdrant_url.clone(),
        config.qdrant_api_key.clone(),
        config.qdrant_collection.clone(),
    )?);
    let search = Arc::new(SemanticSearchService::connect(embedder, index).await?);

    let graph: Arc<dyn KnowledgeGraph> = match &config.neo4j_http_url {
        Some(url) => Arc::new(Neo4jGraph::new(
            url.clone(),
            config.neo4j_database.clone(),
            config.neo4j_user.clone(),
            config.neo4j_password.clone(),
        )),
        None => {
            tracing::warn!("NEO4J_HTTP_URL is not set; graph expansion is disabled");
            Arc::new(DisabledGraph)
        }
    };

    let enricher = MetadataEnricher::new(Arc::new(TmdbClient::new(config.tmdb_api_key.clone())));
    let recommender = Arc::new(HybridRecommender::new(search, graph, enricher));

    let app = create_router(AppState::new(recommender));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
