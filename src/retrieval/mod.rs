#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::embedder::Embedder;
use crate::store::{SearchResult, VectorStore};
use crate::{RetrievalError, Result};

pub const DEFAULT_SEARCH_LIMIT: usize = 3;

/// Per-query orchestration: validate input, embed the query with the same
/// configuration used at ingestion, and run nearest-neighbor search.
pub struct RetrievalService {
    embedder: Arc<Embedder>,
    store: Arc<VectorStore>,
    ready: Arc<AtomicBool>,
}

impl RetrievalService {
    #[inline]
    pub fn new(
        embedder: Arc<Embedder>,
        store: Arc<VectorStore>,
        ready: Arc<AtomicBool>,
    ) -> Self {
        Self {
            embedder,
            store,
            ready,
        }
    }

    /// Whether the index has been successfully built in this process
    /// lifetime (or found on disk at startup). Pure flag read, no I/O.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Return the `limit` chunks most similar to `query`, ordered by
    /// ascending distance.
    ///
    /// # Errors
    /// * [`RetrievalError::InvalidInput`] for a blank query or a zero limit
    /// * [`RetrievalError::NotReady`] before the first successful ingestion
    #[inline]
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Err(RetrievalError::InvalidInput(
                "query must not be empty".to_string(),
            ));
        }
        if limit == 0 {
            return Err(RetrievalError::InvalidInput(
                "limit must be a positive integer".to_string(),
            ));
        }
        if !self.is_ready() {
            return Err(RetrievalError::NotReady);
        }

        debug!("Searching for '{}' with limit {}", query, limit);

        let query_vector = self.embedder.embed(query).await?;
        let mut results = self.store.search(&query_vector, limit).await?;
        results.truncate(limit);

        Ok(results)
    }
}
