//! Text embedding abstraction and the local fastembed implementation.
//!
//! Models are downloaded on first use and cached; after that, inference runs
//! entirely offline. Inference is CPU-bound, so it is moved off the async
//! runtime onto the blocking pool.

use std::sync::{Arc, Mutex};

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::error::{AppError, AppResult};

/// Dimensionality used when the model's metadata cannot be resolved
pub const DEFAULT_DIMENSION: usize = 384;

/// Trait for text embedding backends
///
/// Turns free text into fixed-length vectors. Implementations must be safely
/// shareable across concurrent requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    /// Vector dimensionality of the active model
    fn dimension(&self) -> usize;

    /// Embed a single query text
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;

    /// Embed a batch of texts, one vector per input, in input order
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;
}

/// Local embedding backend built on fastembed
pub struct FastembedEmbedder {
    model_name: String,
    dimension: usize,
    model: Arc<Mutex<TextEmbedding>>,
}

impl FastembedEmbedder {
    /// Loads the named model, downloading it on first use.
    ///
    /// The dimensionality comes from fastembed's model metadata; if that
    /// lookup fails the default of 384 is used instead. Unknown model names
    /// are a configuration error and fail startup.
    pub async fn load(model_name: &str) -> AppResult<Self> {
        let model_id = resolve_model(model_name)?;

        let dimension = match TextEmbedding::get_model_info(&model_id) {
            Ok(info) => info.dim,
            Err(e) => {
                tracing::warn!(
                    model = %model_name,
                    error = %e,
                    fallback = DEFAULT_DIMENSION,
                    "Could not resolve embedding dimension from model metadata"
                );
                DEFAULT_DIMENSION
            }
        };

        let init_model = model_id.clone();
        let model = tokio::task::spawn_blocking(move || {
            TextEmbedding::try_new(
                InitOptions::new(init_model).with_show_download_progress(false),
            )
        })
        .await
        .map_err(|e| AppError::Internal(format!("Embedding model load task failed: {}", e)))?
        .map_err(|e| AppError::Embedding(format!("Failed to initialize model: {}", e)))?;

        tracing::info!(model = %model_name, dimension, "Embedding model loaded");

        Ok(Self {
            model_name: model_name.to_string(),
            dimension,
            model: Arc::new(Mutex::new(model)),
        })
    }

    /// Returns the configured model name
    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[async_trait::async_trait]
impl Embedder for FastembedEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| AppError::Embedding("Empty embedding response".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let batch = texts.to_vec();

        tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<Vec<f32>>> {
            let mut model = model
                .lock()
                .map_err(|_| anyhow::anyhow!("Embedding model mutex poisoned"))?;
            model.embed(batch, None).map_err(|e| anyhow::anyhow!("{e}"))
        })
        .await
        .map_err(|e| AppError::Internal(format!("Embedding task failed: {}", e)))?
        .map_err(|e| AppError::Embedding(e.to_string()))
    }
}

/// Maps a configured model name to a fastembed model
fn resolve_model(name: &str) -> AppResult<EmbeddingModel> {
    match name {
        "all-minilm-l6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        "nomic-embed-text-v1.5" => Ok(EmbeddingModel::NomicEmbedTextV15),
        "multilingual-e5-small" => Ok(EmbeddingModel::MultilingualE5Small),
        other => Err(AppError::Embedding(format!(
            "Unknown embedding model: '{}'. Supported models: \
             all-minilm-l6-v2, bge-small-en-v1.5, bge-base-en-v1.5, \
             nomic-embed-text-v1.5, multilingual-e5-small",
            other
        ))),
    }
}
