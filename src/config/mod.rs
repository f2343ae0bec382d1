#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::chunker::ChunkingConfig;
use crate::embedder::{DEFAULT_EMBEDDING_MODEL, model_dimension};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Where the markdown corpus lives and what the index table is called
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CorpusConfig {
    /// Root directory scanned recursively for markdown documents
    pub root: PathBuf,
    /// Name of the single active index table for this collection
    pub collection: String,
}

impl Default for CorpusConfig {
    #[inline]
    fn default() -> Self {
        Self {
            root: PathBuf::from("docs"),
            collection: "docs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding model name, e.g. "all-minilm-l6-v2"
    pub model: String,
    /// Number of texts embedded per model invocation
    pub batch_size: usize,
    /// Vector width; must match the model's native output dimension
    pub dimension: usize,
    /// Override for the model artifact cache; defaults to `models/` under
    /// the base directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

impl Default for EmbeddingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            batch_size: 16,
            dimension: 384,
            cache_dir: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Unknown embedding model: {0}")]
    UnknownModel(String),
    #[error("Invalid embedding dimension: {0} (model '{1}' produces {2}-dimensional vectors)")]
    InvalidEmbeddingDimension(usize, String, usize),
    #[error("Invalid batch size: {0} (must be between 1 and 1000)")]
    InvalidBatchSize(usize),
    #[error("Invalid minimum chunk length: {0} (must be between 1 and 4096)")]
    InvalidMinChunkLength(usize),
    #[error("Invalid collection name: cannot be empty")]
    EmptyCollection,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    /// Load configuration from `config.toml` under `base_dir`, falling back to
    /// defaults when the file does not exist yet.
    #[inline]
    pub fn load<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let config_path = base_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                corpus: CorpusConfig::default(),
                embedding: EmbeddingConfig::default(),
                chunking: ChunkingConfig::default(),
                base_dir: base_dir.as_ref().to_path_buf(),
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = base_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        fs::create_dir_all(&self.base_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                self.base_dir.display()
            )
        })?;

        let config_path = self.base_dir.join("config.toml");
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.corpus.collection.trim().is_empty() {
            return Err(ConfigError::EmptyCollection);
        }

        let native_dimension = model_dimension(&self.embedding.model)
            .ok_or_else(|| ConfigError::UnknownModel(self.embedding.model.clone()))?;
        if self.embedding.dimension != native_dimension {
            return Err(ConfigError::InvalidEmbeddingDimension(
                self.embedding.dimension,
                self.embedding.model.clone(),
                native_dimension,
            ));
        }

        if self.embedding.batch_size == 0 || self.embedding.batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(self.embedding.batch_size));
        }

        if self.chunking.min_chunk_length == 0 || self.chunking.min_chunk_length > 4096 {
            return Err(ConfigError::InvalidMinChunkLength(
                self.chunking.min_chunk_length,
            ));
        }

        Ok(())
    }

    /// Directory holding the LanceDB vector index
    #[inline]
    pub fn vector_db_path(&self) -> PathBuf {
        self.base_dir.join("vectors")
    }

    /// Directory where downloaded embedding model artifacts are cached
    #[inline]
    pub fn model_cache_dir(&self) -> PathBuf {
        self.embedding
            .cache_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join("models"))
    }

    /// Platform-default base directory for config and index data
    #[inline]
    pub fn default_base_dir() -> Result<PathBuf, ConfigError> {
        dirs::data_local_dir()
            .map(|dir| dir.join("docsearch"))
            .ok_or(ConfigError::DirectoryError)
    }
}
