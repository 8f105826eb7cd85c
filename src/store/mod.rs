pub mod json_file;
pub mod sqlite;

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::ExerciseV2;
use crate::error::{CatalogError, Result};

pub use json_file::JsonFileStore;
pub use sqlite::SqliteStore;

/// Trait for catalog storage backends
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All exercises ordered by id
    async fn list(&self) -> Result<Vec<ExerciseV2>>;

    /// Exercise by id
    async fn get(&self, id: i64) -> Result<Option<ExerciseV2>>;

    /// Insert a new exercise; assigns the next id when none is given
    async fn create(&self, exercise: ExerciseV2) -> Result<ExerciseV2>;

    /// Insert a batch; either every exercise is stored or none is
    async fn create_many(&self, exercises: Vec<ExerciseV2>) -> Result<Vec<ExerciseV2>>;

    /// Replace an existing exercise
    async fn update(&self, id: i64, exercise: ExerciseV2) -> Result<ExerciseV2>;

    /// Remove an exercise, returns whether it existed
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Number of stored exercises
    async fn count(&self) -> Result<u64>;

    /// Backend name for stats and logging
    fn backend_name(&self) -> &str;
}

/// Storage backend selected from a connection string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite(String),
    JsonFile(String),
    Postgres(String),
}

impl StoreBackend {
    pub fn from_url(url: &str) -> Self {
        let url = url.trim();
        let lower = url.to_lowercase();

        if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            return StoreBackend::Postgres(url.to_string());
        }
        if let Some(path) = url
            .strip_prefix("sqlite:///")
            .or_else(|| url.strip_prefix("sqlite://"))
            .or_else(|| url.strip_prefix("sqlite:"))
        {
            return StoreBackend::Sqlite(path.to_string());
        }
        if lower.ends_with(".json") {
            return StoreBackend::JsonFile(url.to_string());
        }
        StoreBackend::Sqlite(url.to_string())
    }
}

/// Open the store a connection string points at
pub async fn open_store(url: &str) -> Result<Arc<dyn CatalogStore>> {
    match StoreBackend::from_url(url) {
        StoreBackend::Sqlite(path) => {
            tracing::info!("Opening SQLite catalog at {}", path);
            Ok(Arc::new(SqliteStore::new(&path).await?))
        }
        StoreBackend::JsonFile(path) => {
            tracing::info!("Opening JSON file catalog at {}", path);
            Ok(Arc::new(JsonFileStore::new(path).await?))
        }
        StoreBackend::Postgres(_) => Err(CatalogError::UnsupportedBackend(
            "PostgreSQL connection strings are recognized but no driver is built in".to_string(),
        )),
    }
}
