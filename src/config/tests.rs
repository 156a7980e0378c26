use super::*;
use tempfile::TempDir;

#[test]
fn defaults_when_file_missing() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    let config = Config::load(temp_dir.path()).expect("Failed to load config");

    assert_eq!(config.pool.pool_size, 5);
    assert_eq!(config.pool.max_overflow, 10);
    assert_eq!(config.ingest.max_batch_documents, 50);
    assert_eq!(config.ingest.batch_commit_size, 10);
    assert_eq!(config.search.max_limit, 100);
    assert_eq!(config.collections.default_embedding_dimension, 384);
    assert_eq!(
        config.collections.default_distance_function,
        DistanceFunction::Cosine
    );
    assert_eq!(config.base_dir, temp_dir.path());
}

#[test]
fn loads_partial_toml_with_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    fs::write(
        temp_dir.path().join("config.toml"),
        r#"
[pool]
pool_size = 2

[search]
max_limit = 25
default_limit = 5
"#,
    )
    .expect("Failed to write config");

    let config = Config::load(temp_dir.path()).expect("Failed to load config");

    assert_eq!(config.pool.pool_size, 2);
    assert_eq!(config.pool.max_overflow, 10);
    assert_eq!(config.search.max_limit, 25);
    assert_eq!(config.search.default_limit, 5);
    assert_eq!(config.ingest.batch_commit_size, 10);
}

#[test]
fn rejects_zero_pool_size() {
    let mut config = Config::load(TempDir::new().expect("temp dir").path()).expect("load");
    config.pool.pool_size = 0;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidPoolSize(0))
    ));
}

#[test]
fn rejects_commit_size_above_batch_size() {
    let mut config = Config::load(TempDir::new().expect("temp dir").path()).expect("load");
    config.ingest.max_batch_documents = 20;
    config.ingest.batch_commit_size = 30;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::CommitSizeTooLarge(30, 20))
    ));
}

#[test]
fn rejects_default_limit_above_max() {
    let mut config = Config::load(TempDir::new().expect("temp dir").path()).expect("load");
    config.search.max_limit = 10;
    config.search.default_limit = 50;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::DefaultLimitTooLarge(50, 10))
    ));
}

#[test]
fn rejects_invalid_toml() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    fs::write(temp_dir.path().join("config.toml"), "not valid toml [")
        .expect("Failed to write config");

    assert!(Config::load(temp_dir.path()).is_err());
}

#[test]
fn database_path_under_base_dir() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config = Config::load(temp_dir.path()).expect("Failed to load config");

    assert_eq!(config.database_path(), temp_dir.path().join("docstore.db"));
}
