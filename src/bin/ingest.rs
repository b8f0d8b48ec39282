//! One-shot ingestion: index a movies JSON file into the vector store.
//!
//! Provisioning is handled by the search service itself, so this can run
//! against a fresh Qdrant instance. Graph-store population is owned by a
//! separate pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cinegraph_api::{
    config::Config,
    embedding::FastembedEmbedder,
    services::{providers::qdrant::QdrantIndex, MovieSource, SemanticSearchService},
};

#[derive(Parser)]
#[command(about = "Index a movies JSON file into the vector store")]
struct Args {
    /// Path to the movies JSON file
    #[arg(long)]
    data: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    let embedder = Arc::new(FastembedEmbedder::load(&config.embedding_model).await?);
    let index = Arc::new(QdrantIndex::new(
        config.qdrant_url.clone(),
        config.qdrant_api_key.clone(),
        config.qdrant_collection.clone(),
    )?);
    let search = SemanticSearchService::connect(embedder, index).await?;

    let indexed = search
        .index_movies(MovieSource::JsonFile(args.data))
        .await?;
    tracing::info!(indexed, "Ingestion complete");

    Ok(())
}
