
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::chunker::{ChunkingConfig, chunk_document};
use crate::embedder::Embedder;
use crate::store::{ChunkRow, VectorStore};
use crate::{RetrievalError, Result};

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Full-rebuild ingestion: discover markdown documents, chunk, embed, and
/// bulk-write one new index generation.
///
/// Runs are serialized by an internal mutex, so two concurrent `ingest`
/// calls cannot race on the table replacement. Reads against the previous
/// generation proceed until the bulk write commits.
pub struct IngestionPipeline {
    corpus_root: PathBuf,
    chunking: ChunkingConfig,
    embedder: Arc<Embedder>,
    store: Arc<VectorStore>,
    ready: Arc<AtomicBool>,
    guard: Mutex<()>,
}

impl IngestionPipeline {
    #[inline]
    pub fn new(
        corpus_root: PathBuf,
        chunking: ChunkingConfig,
        embedder: Arc<Embedder>,
        store: Arc<VectorStore>,
        ready: Arc<AtomicBool>,
    ) -> Self {
        Self {
            corpus_root,
            chunking,
            embedder,
            store,
            ready,
            guard: Mutex::new(()),
        }
    }

    /// Rebuild the index from the corpus and return the number of chunks
    /// written.
    ///
    /// # Errors
    /// Returns [`RetrievalError::EmptyCorpus`] when no document yields a
    /// chunk of at least the minimum length; the existing index, if any,
    /// is left untouched in that case.
    #[inline]
    pub async fn ingest(&self) -> Result<usize> {
        let _serialize = self.guard.lock().await;

        info!("Starting ingestion from {}", self.corpus_root.display());

        let documents = collect_documents(&self.corpus_root).await?;
        debug!("Found {} markdown documents", documents.len());

        let mut texts = Vec::new();
        let mut sources = Vec::new();
        for (source, content) in &documents {
            for chunk in chunk_document(content, &self.chunking) {
                texts.push(chunk);
                sources.push(source.clone());
            }
        }

        if texts.is_empty() {
            return Err(RetrievalError::EmptyCorpus(format!(
                "no chunks of at least {} characters found under {}",
                self.chunking.min_chunk_length,
                self.corpus_root.display()
            )));
        }

        let vectors = self.embedder.embed_batch(texts.clone()).await?;

        let rows: Vec<ChunkRow> = vectors
            .into_iter()
            .zip(texts)
            .zip(sources)
            .map(|((vector, text), source)| ChunkRow {
                vector,
                text,
                source,
            })
            .collect();

        let row_count = rows.len();
        self.store.create_table(rows).await?;
        self.ready.store(true, Ordering::Release);

        info!(
            "Ingestion complete: {} chunks from {} documents",
            row_count,
            documents.len()
        );
        Ok(row_count)
    }
}

/// Recursively collect `(relative path, content)` pairs for every markdown
/// file under `root`, in deterministic path order.
pub(crate) async fn collect_documents(root: &Path) -> Result<Vec<(String, String)>> {
    let mut paths = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(path);
            } else if is_markdown_file(&path) {
                paths.push(path);
            }
        }
    }

    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let content = fs::read_to_string(&path).await?;
        let source = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .into_owned();
        documents.push((source, content));
    }

    Ok(documents)
}

fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
