use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the catalog and the matching pipeline
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV artifact errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem errors, tagged with the offending path
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Exercise (or other resource) not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate id or slug
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Request payload or parameter rejected
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Connection string names a backend this build cannot open
    #[error("Unsupported storage backend: {0}")]
    UnsupportedBackend(String),

    /// Store-level failures that are not driver errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl CatalogError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CatalogError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<String> for CatalogError {
    fn from(s: String) -> Self {
        CatalogError::Other(s)
    }
}

impl From<&str> for CatalogError {
    fn from(s: &str) -> Self {
        CatalogError::Other(s.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CatalogError>;
