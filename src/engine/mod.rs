#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::config::Config;
use crate::embedder::Embedder;
use crate::pipeline::IngestionPipeline;
use crate::retrieval::{DEFAULT_SEARCH_LIMIT, RetrievalService};
use crate::store::{SearchResult, VectorStore};
use crate::Result;

/// Process-wide façade over the retrieval core.
///
/// Owns the embedder, vector store, and readiness flag as process-scoped
/// singletons and wires them into an [`IngestionPipeline`] and a
/// [`RetrievalService`]. Construction is cheap; slow work (model load,
/// storage connect) happens in [`warm_up`](Self::warm_up) or lazily on
/// first use. The surrounding tool layer calls `ingest`, `search`, and
/// `is_ready` in-process.
pub struct SearchEngine {
    pipeline: IngestionPipeline,
    retrieval: RetrievalService,
    store: Arc<VectorStore>,
    embedder: Arc<Embedder>,
    ready: Arc<AtomicBool>,
}

impl SearchEngine {
    /// Wire an engine from configuration. No I/O happens here.
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let embedder = Arc::new(Embedder::new(
            &config.embedding,
            config.model_cache_dir(),
        )?);
        let store = Arc::new(VectorStore::new(
            config.vector_db_path(),
            config.corpus.collection.clone(),
        ));
        let ready = Arc::new(AtomicBool::new(false));

        let pipeline = IngestionPipeline::new(
            config.corpus.root.clone(),
            config.chunking.clone(),
            Arc::clone(&embedder),
            Arc::clone(&store),
            Arc::clone(&ready),
        );
        let retrieval = RetrievalService::new(
            Arc::clone(&embedder),
            Arc::clone(&store),
            Arc::clone(&ready),
        );

        Ok(Self {
            pipeline,
            retrieval,
            store,
            embedder,
            ready,
        })
    }

    /// One-time startup initialization: load the embedding model and probe
    /// for an index left behind by a previous process run.
    ///
    /// Intended to be spawned at process start. A failure here should be
    /// logged by the caller, not treated as fatal: readiness simply stays
    /// false until a manual ingestion succeeds.
    #[inline]
    pub async fn warm_up(&self) -> Result<()> {
        self.embedder.ensure_loaded().await?;

        if self.store.table_exists().await? {
            let rows = self.store.count_rows().await?;
            self.ready.store(true, Ordering::Release);
            info!(
                "Found existing index table '{}' with {} rows",
                self.store.table_name(),
                rows
            );
        }

        Ok(())
    }

    /// Rebuild the index from the configured corpus; returns the number of
    /// chunks written.
    #[inline]
    pub async fn ingest(&self) -> Result<usize> {
        self.pipeline.ingest().await
    }

    /// Search the index. `limit` defaults to
    /// [`DEFAULT_SEARCH_LIMIT`] when not supplied.
    #[inline]
    pub async fn search(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<SearchResult>> {
        self.retrieval
            .search(query, limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
            .await
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.retrieval.is_ready()
    }
}
