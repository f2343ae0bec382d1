use super::*;
use tempfile::TempDir;

fn config_in(temp_dir: &TempDir) -> Config {
    Config {
        corpus: CorpusConfig::default(),
        embedding: EmbeddingConfig::default(),
        chunking: ChunkingConfig::default(),
        base_dir: temp_dir.path().to_path_buf(),
    }
}

#[test]
fn defaults_are_valid() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = config_in(&temp_dir);

    assert!(config.validate().is_ok());
    assert_eq!(config.embedding.model, DEFAULT_EMBEDDING_MODEL);
    assert_eq!(config.embedding.dimension, 384);
    assert_eq!(config.chunking.min_chunk_length, 50);
    assert_eq!(config.corpus.collection, "docs");
}

#[test]
fn load_without_file_returns_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = Config::load(temp_dir.path()).expect("should load defaults");

    assert_eq!(config.embedding, EmbeddingConfig::default());
    assert_eq!(config.base_dir, temp_dir.path());
}

#[test]
fn save_and_load_round_trip() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = config_in(&temp_dir);
    config.corpus.collection = "api-reference".to_string();
    config.embedding.batch_size = 8;
    config.chunking.min_chunk_length = 80;

    config.save().expect("should save config");
    let loaded = Config::load(temp_dir.path()).expect("should load config");

    assert_eq!(loaded, config);
}

#[test]
fn unknown_model_is_rejected() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = config_in(&temp_dir);
    config.embedding.model = "not-a-real-model".to_string();

    assert!(matches!(
        config.validate(),
        Err(ConfigError::UnknownModel(_))
    ));
}

#[test]
fn dimension_must_match_model() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = config_in(&temp_dir);
    config.embedding.dimension = 768;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidEmbeddingDimension(768, _, 384))
    ));
}

#[test]
fn zero_batch_size_is_rejected() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = config_in(&temp_dir);
    config.embedding.batch_size = 0;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidBatchSize(0))
    ));
}

#[test]
fn zero_min_chunk_length_is_rejected() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = config_in(&temp_dir);
    config.chunking.min_chunk_length = 0;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidMinChunkLength(0))
    ));
}

#[test]
fn empty_collection_is_rejected() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = config_in(&temp_dir);
    config.corpus.collection = "  ".to_string();

    assert!(matches!(
        config.validate(),
        Err(ConfigError::EmptyCollection)
    ));
}

#[test]
fn malformed_toml_fails_to_load() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    std::fs::write(temp_dir.path().join("config.toml"), "not [valid toml")
        .expect("should write file");

    assert!(Config::load(temp_dir.path()).is_err());
}

#[test]
fn invalid_config_fails_to_load() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "[embedding]\nmodel = \"not-a-real-model\"\n",
    )
    .expect("should write file");

    assert!(Config::load(temp_dir.path()).is_err());
}

#[test]
fn path_helpers_live_under_base_dir() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = config_in(&temp_dir);

    assert_eq!(config.vector_db_path(), temp_dir.path().join("vectors"));
    assert_eq!(config.model_cache_dir(), temp_dir.path().join("models"));
}
