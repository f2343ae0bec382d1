use super::*;
use crate::RetrievalError;
use crate::config::Config;
use tempfile::TempDir;

fn test_config(base: &TempDir, corpus: &TempDir) -> Config {
    let mut config = Config::load(base.path()).expect("should load defaults");
    config.corpus.root = corpus.path().to_path_buf();
    config
}

#[test]
fn construction_is_cheap_and_not_ready() {
    let base = TempDir::new().expect("should create temp dir");
    let corpus = TempDir::new().expect("should create temp dir");
    let engine = SearchEngine::new(&test_config(&base, &corpus)).expect("should build engine");

    assert!(!engine.is_ready());
    // No model artifacts or vector files were touched during construction.
    assert!(!base.path().join("models").exists());
    assert!(!base.path().join("vectors").exists());
}

#[test]
fn invalid_embedding_config_fails_construction() {
    let base = TempDir::new().expect("should create temp dir");
    let corpus = TempDir::new().expect("should create temp dir");
    let mut config = test_config(&base, &corpus);
    config.embedding.model = "made-up-model".to_string();

    assert!(matches!(
        SearchEngine::new(&config),
        Err(RetrievalError::Initialization(_))
    ));
}

#[tokio::test]
async fn search_before_any_ingestion_is_not_ready() {
    let base = TempDir::new().expect("should create temp dir");
    let corpus = TempDir::new().expect("should create temp dir");
    let engine = SearchEngine::new(&test_config(&base, &corpus)).expect("should build engine");

    let result = engine.search("anything", None).await;
    assert!(matches!(result, Err(RetrievalError::NotReady)));
}

#[tokio::test]
async fn explicit_zero_limit_is_invalid_input() {
    let base = TempDir::new().expect("should create temp dir");
    let corpus = TempDir::new().expect("should create temp dir");
    let engine = SearchEngine::new(&test_config(&base, &corpus)).expect("should build engine");

    let result = engine.search("anything", Some(0)).await;
    assert!(matches!(result, Err(RetrievalError::InvalidInput(_))));
}

#[tokio::test]
async fn ingest_of_empty_corpus_reports_empty_corpus() {
    let base = TempDir::new().expect("should create temp dir");
    let corpus = TempDir::new().expect("should create temp dir");
    let engine = SearchEngine::new(&test_config(&base, &corpus)).expect("should build engine");

    let result = engine.ingest().await;
    assert!(matches!(result, Err(RetrievalError::EmptyCorpus(_))));
    assert!(!engine.is_ready());
}
