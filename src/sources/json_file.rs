use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::exercise::deserialize_id;
use crate::core::{ExerciseRecord, SourceId};
use crate::error::Result;
use crate::sources::RecordSource;

/// The fields the matcher needs from an arbitrary exercise row
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default, deserialize_with = "deserialize_id")]
    id: Option<i64>,

    #[serde(default)]
    slug: Option<String>,

    #[serde(default)]
    name: Option<String>,
}

/// Exercise rows read from a JSON array file (v1 or v2 shape)
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    id: SourceId,
    path: PathBuf,
}

impl JsonFileSource {
    /// Source tagged with its own path, like the mapping artifact expects
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let id = SourceId::new(path.to_string_lossy().replace('\\', "/"));
        Self { id, path }
    }

    pub fn with_id(id: impl Into<SourceId>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse a document; rows that do not fit are skipped
    pub fn parse(&self, text: &str) -> Vec<ExerciseRecord> {
        let document: serde_json::Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Source {} is not valid JSON, using 0 records: {}", self.id, e);
                return Vec::new();
            }
        };

        let rows = match document {
            serde_json::Value::Array(rows) => rows,
            _ => {
                tracing::warn!("Source {} is not a JSON array, using 0 records", self.id);
                return Vec::new();
            }
        };

        let mut records = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            if !row.is_object() {
                tracing::warn!("Source {} row {} is not an object, skipped", self.id, index);
                continue;
            }
            match serde_json::from_value::<RawRecord>(row) {
                Ok(raw) => records.push(ExerciseRecord {
                    source: self.id.clone(),
                    id: raw.id,
                    slug: raw.slug,
                    name: raw.name.unwrap_or_default(),
                }),
                Err(e) => {
                    tracing::warn!("Source {} row {} is malformed, skipped: {}", self.id, index, e);
                }
            }
        }
        records
    }
}

#[async_trait]
impl RecordSource for JsonFileSource {
    async fn load(&self) -> Result<Vec<ExerciseRecord>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(self.parse(&text)),
            Err(e) => {
                tracing::warn!(
                    "Source file {} unavailable, using 0 records: {}",
                    self.path.display(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    fn id(&self) -> &SourceId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_rows() {
        let source = JsonFileSource::new("data/exercises.json");
        let records = source.parse(
            r#"[
                {"id": 1, "name": "Crunch", "muscle": "abs"},
                {"id": "2", "slug": "curl-biceps", "name": "Curl de Biceps"},
                {"slug": "plank"},
                "not a row",
                {"id": [1, 2], "name": "Broken"},
                {"id": 5, "name": null}
            ]"#,
        );

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].source.as_str(), "data/exercises.json");
        assert_eq!(records[0].slug, None);
        assert_eq!(records[1].id, Some(2));
        assert_eq!(records[2].id, None);
        assert_eq!(records[2].name, "");
        assert_eq!(records[3].id, Some(5));
    }

    #[test]
    fn test_parse_non_array() {
        let source = JsonFileSource::new("x.json");
        assert!(source.parse(r#"{"id": 1}"#).is_empty());
        assert!(source.parse("not json").is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let source = JsonFileSource::new("/definitely/not/here.json");
        let records = source.load().await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exercises.json");
        std::fs::write(&path, r#"[{"id": 1, "slug": "crunch", "name": "Crunch"}]"#).unwrap();

        let source = JsonFileSource::with_id("A", &path);
        let records = source.load().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source.as_str(), "A");
    }
}
