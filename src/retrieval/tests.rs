use super::*;
use crate::config::EmbeddingConfig;
use tempfile::TempDir;

fn test_service(temp_dir: &TempDir, ready: Arc<AtomicBool>) -> RetrievalService {
    let embedder = Embedder::new(
        &EmbeddingConfig::default(),
        temp_dir.path().join("models"),
    )
    .expect("should build embedder");
    let store = VectorStore::new(temp_dir.path().join("vectors"), "docs");

    RetrievalService::new(Arc::new(embedder), Arc::new(store), ready)
}

#[tokio::test]
async fn search_before_ingestion_is_not_ready() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let service = test_service(&temp_dir, Arc::new(AtomicBool::new(false)));

    assert!(!service.is_ready());
    let result = service.search("how do I install", DEFAULT_SEARCH_LIMIT).await;
    assert!(matches!(result, Err(RetrievalError::NotReady)));
}

#[tokio::test]
async fn zero_limit_is_invalid_input() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let service = test_service(&temp_dir, Arc::new(AtomicBool::new(true)));

    let result = service.search("how do I install", 0).await;
    assert!(matches!(result, Err(RetrievalError::InvalidInput(_))));
}

#[tokio::test]
async fn blank_query_is_invalid_input() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let service = test_service(&temp_dir, Arc::new(AtomicBool::new(true)));

    let result = service.search("   \t ", DEFAULT_SEARCH_LIMIT).await;
    assert!(matches!(result, Err(RetrievalError::InvalidInput(_))));
}

#[tokio::test]
async fn validation_runs_before_the_readiness_check() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let service = test_service(&temp_dir, Arc::new(AtomicBool::new(false)));

    // A malformed request is reported as such even when the index is not
    // ready yet.
    let result = service.search("query", 0).await;
    assert!(matches!(result, Err(RetrievalError::InvalidInput(_))));
}

#[test]
fn readiness_tracks_the_shared_flag() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let ready = Arc::new(AtomicBool::new(false));
    let service = test_service(&temp_dir, Arc::clone(&ready));

    assert!(!service.is_ready());
    ready.store(true, Ordering::Release);
    assert!(service.is_ready());
}
