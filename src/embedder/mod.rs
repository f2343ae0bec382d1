
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::EmbeddingConfig;
use crate::{RetrievalError, Result};

pub const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm-l6-v2";

/// Resolve a configured model name to its fastembed model and native
/// output dimension. Returns `None` for unknown names.
#[inline]
pub fn model_dimension(name: &str) -> Option<usize> {
    resolve_model(name).map(|(_, dimension)| dimension)
}

fn resolve_model(name: &str) -> Option<(EmbeddingModel, usize)> {
    match name.to_ascii_lowercase().as_str() {
        "all-minilm-l6-v2" => Some((EmbeddingModel::AllMiniLML6V2, 384)),
        "bge-small-en-v1.5" => Some((EmbeddingModel::BGESmallENV15, 384)),
        _ => None,
    }
}

type SharedModel = Arc<Mutex<TextEmbedding>>;

/// Embeds text with a local pretrained sentence model.
///
/// Construction is cheap; the model itself is loaded exactly once on first
/// use (or via [`ensure_loaded`](Self::ensure_loaded)). Concurrent callers
/// during the load queue on the initialization cell, so no call ever runs
/// against a partially loaded model. Output vectors are mean-pooled by the
/// model and L2-normalized here, so cosine similarity and Euclidean distance
/// rank identically.
pub struct Embedder {
    model_name: String,
    model_kind: EmbeddingModel,
    dimension: usize,
    batch_size: usize,
    cache_dir: PathBuf,
    model: OnceCell<SharedModel>,
}

impl Embedder {
    /// Create an embedder from configuration without loading the model.
    ///
    /// # Errors
    /// Fails if the configured model name is unknown or the configured
    /// dimension does not match the model's native output width.
    #[inline]
    pub fn new(config: &EmbeddingConfig, cache_dir: PathBuf) -> Result<Self> {
        let (model_kind, dimension) = resolve_model(&config.model).ok_or_else(|| {
            RetrievalError::Initialization(format!("unknown embedding model '{}'", config.model))
        })?;

        if config.dimension != dimension {
            return Err(RetrievalError::Initialization(format!(
                "configured dimension {} does not match model '{}' ({} dimensions)",
                config.dimension, config.model, dimension
            )));
        }

        Ok(Self {
            model_name: config.model.clone(),
            model_kind,
            dimension,
            batch_size: config.batch_size,
            cache_dir,
            model: OnceCell::new(),
        })
    }

    /// Width of every vector this embedder produces
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Load the model now instead of on first embed. Idempotent.
    #[inline]
    pub async fn ensure_loaded(&self) -> Result<()> {
        self.model().await.map(|_| ())
    }

    async fn model(&self) -> Result<&SharedModel> {
        self.model
            .get_or_try_init(|| self.load_model())
            .await
    }

    async fn load_model(&self) -> Result<SharedModel> {
        let model_kind = self.model_kind.clone();
        let model_name = self.model_name.clone();
        let cache_dir = self.cache_dir.clone();

        info!("Loading embedding model '{}'", model_name);

        let model = tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&cache_dir).map_err(|e| {
                RetrievalError::Initialization(format!(
                    "failed to create model cache directory {}: {}",
                    cache_dir.display(),
                    e
                ))
            })?;

            let options = InitOptions::new(model_kind)
                .with_cache_dir(cache_dir)
                .with_show_download_progress(false);

            TextEmbedding::try_new(options).map_err(|e| {
                RetrievalError::Initialization(format!(
                    "failed to load embedding model '{}': {}",
                    model_name, e
                ))
            })
        })
        .await
        .map_err(|e| RetrievalError::Initialization(format!("model load task failed: {}", e)))??;

        info!(
            "Embedding model '{}' loaded ({} dimensions)",
            self.model_name, self.dimension
        );
        Ok(Arc::new(Mutex::new(model)))
    }

    /// Embed a single text, returning one L2-normalized vector of
    /// [`dimension`](Self::dimension) entries.
    #[inline]
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(vec![text.to_string()]).await?;
        vectors.pop().ok_or_else(|| {
            RetrievalError::Embedding("model returned no vector for input".to_string())
        })
    }

    /// Embed a batch of texts, returning one vector per input in order.
    #[inline]
    pub async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let expected = texts.len();
        debug!("Embedding batch of {} texts", expected);

        let model = Arc::clone(self.model().await?);
        let batch_size = self.batch_size;

        let mut vectors = tokio::task::spawn_blocking(move || {
            let mut guard = model.lock().map_err(|_| {
                RetrievalError::Embedding("embedding model lock poisoned".to_string())
            })?;
            guard
                .embed(texts, Some(batch_size))
                .map_err(|e| RetrievalError::Embedding(format!("embedding failed: {}", e)))
        })
        .await
        .map_err(|e| RetrievalError::Embedding(format!("embedding task failed: {}", e)))??;

        if vectors.len() != expected {
            return Err(RetrievalError::Embedding(format!(
                "mismatch between input and output counts: {} vs {}",
                expected,
                vectors.len()
            )));
        }

        for vector in &mut vectors {
            if vector.len() != self.dimension {
                return Err(RetrievalError::Embedding(format!(
                    "model '{}' returned a {}-dimensional vector, expected {}",
                    self.model_name,
                    vector.len(),
                    self.dimension
                )));
            }
            l2_normalize(vector);
        }

        Ok(vectors)
    }
}

/// Scale a vector to unit length. Zero vectors are left unchanged.
pub(crate) fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}
