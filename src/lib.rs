use thiserror::Error;

pub type Result<T> = std::result::Result<T, RetrievalError>;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("Index not ready: no index has been built yet, run ingestion first")]
    NotReady,

    #[error("Empty corpus: {0}")]
    EmptyCorpus(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Index table '{0}' does not exist")]
    TableMissing(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod chunker;
pub mod config;
pub mod embedder;
pub mod engine;
pub mod pipeline;
pub mod retrieval;
pub mod store;
