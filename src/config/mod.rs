#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::database::models::DistanceFunction;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub collections: CollectionsConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PoolConfig {
    /// Base number of pooled connections kept alive.
    pub pool_size: u32,
    /// Extra connections that may be opened under load and discarded when idle.
    pub max_overflow: u32,
    /// Bounded wait for a free connection before the acquire fails.
    pub acquire_timeout_secs: u64,
    /// Idle time after which overflow connections are closed.
    pub idle_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pool_size: 5,
            max_overflow: 10,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IngestConfig {
    /// Maximum documents accepted in a single ingestion call.
    pub max_batch_documents: usize,
    /// Documents committed per transaction within a batch.
    pub batch_commit_size: usize,
    /// Upper bound on a single document's content size.
    pub max_document_bytes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_batch_documents: 50,
            batch_commit_size: 10,
            max_document_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub max_limit: usize,
    pub default_limit: usize,
    /// Approximate token count of the matched-content excerpt.
    pub snippet_tokens: u16,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_limit: 100,
            default_limit: 10,
            snippet_tokens: 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CollectionsConfig {
    pub default_embedding_dimension: u32,
    pub default_distance_function: DistanceFunction,
    pub max_list_limit: usize,
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            default_embedding_dimension: 384,
            default_distance_function: DistanceFunction::Cosine,
            max_list_limit: 100,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid pool size: {0} (must be between 1 and 100)")]
    InvalidPoolSize(u32),
    #[error("Invalid max overflow: {0} (must be 100 or fewer)")]
    InvalidMaxOverflow(u32),
    #[error("Invalid acquire timeout: {0} (must be between 1 and 300 seconds)")]
    InvalidAcquireTimeout(u64),
    #[error("Invalid max batch documents: {0} (must be between 1 and 10000)")]
    InvalidMaxBatchDocuments(usize),
    #[error("Invalid batch commit size: {0} (must be between 1 and 1000)")]
    InvalidBatchCommitSize(usize),
    #[error("Batch commit size ({0}) must not exceed max batch documents ({1})")]
    CommitSizeTooLarge(usize, usize),
    #[error("Invalid max document size: {0} bytes (must be between 1 and 100 MiB)")]
    InvalidMaxDocumentBytes(usize),
    #[error("Invalid search limit: {0} (must be between 1 and 1000)")]
    InvalidSearchLimit(usize),
    #[error("Default search limit ({0}) must not exceed max limit ({1})")]
    DefaultLimitTooLarge(usize, usize),
    #[error("Invalid snippet length: {0} tokens (must be between 1 and 64)")]
    InvalidSnippetTokens(u16),
    #[error("Invalid embedding dimension: {0} (must be between 1 and 4096)")]
    InvalidEmbeddingDimension(u32),
    #[error("Invalid list limit: {0} (must be between 1 and 1000)")]
    InvalidListLimit(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Config {
    /// Load configuration from `<config_dir>/config.toml`, falling back to
    /// defaults when the file does not exist.
    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                pool: PoolConfig::default(),
                ingest: IngestConfig::default(),
                search: SearchConfig::default(),
                collections: CollectionsConfig::default(),
                base_dir: config_dir.as_ref().to_path_buf(),
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool.pool_size == 0 || self.pool.pool_size > 100 {
            return Err(ConfigError::InvalidPoolSize(self.pool.pool_size));
        }
        if self.pool.max_overflow > 100 {
            return Err(ConfigError::InvalidMaxOverflow(self.pool.max_overflow));
        }
        if !(1..=300).contains(&self.pool.acquire_timeout_secs) {
            return Err(ConfigError::InvalidAcquireTimeout(
                self.pool.acquire_timeout_secs,
            ));
        }

        if !(1..=10_000).contains(&self.ingest.max_batch_documents) {
            return Err(ConfigError::InvalidMaxBatchDocuments(
                self.ingest.max_batch_documents,
            ));
        }
        if !(1..=1000).contains(&self.ingest.batch_commit_size) {
            return Err(ConfigError::InvalidBatchCommitSize(
                self.ingest.batch_commit_size,
            ));
        }
        if self.ingest.batch_commit_size > self.ingest.max_batch_documents {
            return Err(ConfigError::CommitSizeTooLarge(
                self.ingest.batch_commit_size,
                self.ingest.max_batch_documents,
            ));
        }
        if !(1..=100 * 1024 * 1024).contains(&self.ingest.max_document_bytes) {
            return Err(ConfigError::InvalidMaxDocumentBytes(
                self.ingest.max_document_bytes,
            ));
        }

        if !(1..=1000).contains(&self.search.max_limit) {
            return Err(ConfigError::InvalidSearchLimit(self.search.max_limit));
        }
        if self.search.default_limit == 0 || self.search.default_limit > self.search.max_limit {
            return Err(ConfigError::DefaultLimitTooLarge(
                self.search.default_limit,
                self.search.max_limit,
            ));
        }
        if !(1..=64).contains(&self.search.snippet_tokens) {
            return Err(ConfigError::InvalidSnippetTokens(self.search.snippet_tokens));
        }

        if !(1..=4096).contains(&self.collections.default_embedding_dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(
                self.collections.default_embedding_dimension,
            ));
        }
        if !(1..=1000).contains(&self.collections.max_list_limit) {
            return Err(ConfigError::InvalidListLimit(self.collections.max_list_limit));
        }

        Ok(())
    }

    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the path for the SQLite database.
    #[inline]
    pub fn database_path(&self) -> PathBuf {
        self.base_dir.join("docstore.db")
    }
}

/// Resolve the config directory from `DOCSTORE_CONFIG_DIR`, defaulting to the
/// working directory.
#[inline]
pub fn get_config_dir() -> PathBuf {
    std::env::var_os("DOCSTORE_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}
