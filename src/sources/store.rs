use async_trait::async_trait;
use std::sync::Arc;

use crate::core::{ExerciseRecord, SourceId};
use crate::error::Result;
use crate::sources::RecordSource;
use crate::store::CatalogStore;

/// Exercise records taken from a live catalog store
pub struct StoreSource {
    id: SourceId,
    store: Arc<dyn CatalogStore>,
}

impl StoreSource {
    pub fn new(id: impl Into<SourceId>, store: Arc<dyn CatalogStore>) -> Self {
        Self {
            id: id.into(),
            store,
        }
    }
}

#[async_trait]
impl RecordSource for StoreSource {
    async fn load(&self) -> Result<Vec<ExerciseRecord>> {
        let exercises = self.store.list().await?;
        Ok(exercises
            .into_iter()
            .map(|ex| ExerciseRecord {
                source: self.id.clone(),
                id: ex.id,
                slug: (!ex.slug.is_empty()).then_some(ex.slug),
                name: ex.name,
            })
            .collect())
    }

    fn id(&self) -> &SourceId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ExerciseV2;
    use crate::store::SqliteStore;

    #[tokio::test]
    async fn test_store_source_tags_records() {
        let store = Arc::new(SqliteStore::new(":memory:").await.unwrap());
        store.create(ExerciseV2::new("Press Banca")).await.unwrap();

        let source = StoreSource::new("db", store);
        let records = source.load().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source.as_str(), "db");
        assert_eq!(records[0].slug.as_deref(), Some("press-banca"));
        assert!(records[0].id.is_some());
    }
}
