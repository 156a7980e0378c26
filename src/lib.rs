use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Collection already exists: {0}")]
    DuplicateCollection(String),

    #[error("Invalid collection name: {0}")]
    InvalidCollectionName(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Batch too large: {size} documents (max {max})")]
    BatchTooLarge { size: usize, max: usize },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    /// Transient infrastructure errors that callers may retry with backoff.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PoolExhausted | Self::BackendUnavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    #[inline]
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => Self::PoolExhausted,
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                Self::BackendUnavailable(err.to_string())
            }
            sqlx::Error::Protocol(message) => Self::BackendUnavailable(message),
            other => Self::Database(other.to_string()),
        }
    }
}

/// Whether a sqlx error is a UNIQUE constraint violation, used to turn insert
/// races into `DuplicateCollection` instead of a generic database error.
#[inline]
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

pub mod collections;
pub mod commands;
pub mod config;
pub mod database;
pub mod ingest;
pub mod search;
