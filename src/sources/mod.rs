pub mod images;
pub mod json_file;
pub mod store;

use async_trait::async_trait;

use crate::core::{ExerciseRecord, ImageAsset, SourceId};
use crate::error::Result;

pub use images::{load_image_list, scan_image_dir, IMAGE_EXTENSIONS};
pub use json_file::JsonFileSource;
pub use store::StoreSource;

/// Trait for exercise record sources (JSON files, catalog stores)
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Load every record of this source, tagged with `id()`
    async fn load(&self) -> Result<Vec<ExerciseRecord>>;

    /// Source identifier written into the mapping artifact
    fn id(&self) -> &SourceId;
}

/// Immutable input of one pipeline run
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub images: Vec<ImageAsset>,
    pub exercises: Vec<ExerciseRecord>,
}

impl Snapshot {
    pub fn new(images: Vec<ImageAsset>, exercises: Vec<ExerciseRecord>) -> Self {
        Self { images, exercises }
    }

    /// Gather records from every source; a failing source contributes nothing
    pub async fn load(images: Vec<ImageAsset>, sources: &[Box<dyn RecordSource>]) -> Self {
        let mut exercises = Vec::new();
        for source in sources {
            match source.load().await {
                Ok(mut records) => {
                    tracing::debug!("Source {} returned {} records", source.id(), records.len());
                    exercises.append(&mut records);
                }
                Err(e) => {
                    tracing::warn!("Source {} failed, continuing without it: {}", source.id(), e);
                }
            }
        }

        tracing::info!(
            "Snapshot loaded: {} images, {} exercise records from {} sources",
            images.len(),
            exercises.len(),
            sources.len()
        );

        Self { images, exercises }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;

    struct FixedSource {
        id: SourceId,
        records: Vec<ExerciseRecord>,
    }

    #[async_trait]
    impl RecordSource for FixedSource {
        async fn load(&self) -> Result<Vec<ExerciseRecord>> {
            Ok(self.records.clone())
        }

        fn id(&self) -> &SourceId {
            &self.id
        }
    }

    struct BrokenSource(SourceId);

    #[async_trait]
    impl RecordSource for BrokenSource {
        async fn load(&self) -> Result<Vec<ExerciseRecord>> {
            Err(CatalogError::Storage("offline".to_string()))
        }

        fn id(&self) -> &SourceId {
            &self.0
        }
    }

    #[tokio::test]
    async fn test_snapshot_skips_failing_source() {
        let sources: Vec<Box<dyn RecordSource>> = vec![
            Box::new(BrokenSource(SourceId::new("broken"))),
            Box::new(FixedSource {
                id: SourceId::new("a"),
                records: vec![ExerciseRecord::new("a", Some(1), Some("crunch"), "Crunch")],
            }),
        ];

        let snapshot = Snapshot::load(vec![ImageAsset::new("abs/crunch.png")], &sources).await;
        assert_eq!(snapshot.images.len(), 1);
        assert_eq!(snapshot.exercises.len(), 1);
        assert_eq!(snapshot.exercises[0].source.as_str(), "a");
    }
}
