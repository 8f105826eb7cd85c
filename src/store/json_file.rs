use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::core::{ExerciseV1, ExerciseV2};
use crate::error::{CatalogError, Result};
use crate::persist;
use crate::store::CatalogStore;

/// A stored row in either schema version
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredRow {
    V2(ExerciseV2),
    V1(ExerciseV1),
}

impl From<StoredRow> for ExerciseV2 {
    fn from(row: StoredRow) -> Self {
        match row {
            StoredRow::V2(ex) => ex,
            StoredRow::V1(old) => ExerciseV2::from_v1(&old),
        }
    }
}

/// Catalog kept in a single JSON array file
///
/// Rows may be flat v1 records or v2 records; everything is written back in
/// v2 shape.
pub struct JsonFileStore {
    path: PathBuf,
    exercises: RwLock<Vec<ExerciseV2>>,
}

impl JsonFileStore {
    /// Load the file; a missing file is an empty catalog
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let exercises = match tokio::fs::read_to_string(&path).await {
            Ok(text) => parse_rows(&text, &path)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Catalog file {} not found, starting empty", path.display());
                Vec::new()
            }
            Err(e) => return Err(CatalogError::io(&path, e)),
        };

        tracing::info!("Loaded {} exercises from {}", exercises.len(), path.display());

        Ok(Self {
            path,
            exercises: RwLock::new(exercises),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, exercises: &[ExerciseV2]) -> Result<()> {
        let json = serde_json::to_vec_pretty(exercises)?;
        persist::replace_file(&self.path, &json)
    }
}

fn parse_rows(text: &str, origin: &Path) -> Result<Vec<ExerciseV2>> {
    let rows: Vec<serde_json::Value> = serde_json::from_str(text)?;
    let mut exercises: Vec<ExerciseV2> = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        match serde_json::from_value::<StoredRow>(row) {
            Ok(row) => exercises.push(row.into()),
            Err(e) => {
                tracing::warn!("{} row {} skipped: {}", origin.display(), index, e);
            }
        }
    }
    exercises.sort_by_key(|ex| ex.id);
    Ok(exercises)
}

/// Append to a working copy, with the same conflict rules as the SQLite store
fn stage_insert(exercises: &mut Vec<ExerciseV2>, mut exercise: ExerciseV2) -> Result<ExerciseV2> {
    if let Some(id) = exercise.id {
        if exercises.iter().any(|ex| ex.id == Some(id)) {
            return Err(CatalogError::Conflict(format!("ID {} already exists", id)));
        }
    }
    if exercises.iter().any(|ex| ex.slug == exercise.slug) {
        return Err(CatalogError::Conflict(format!(
            "slug '{}' already exists",
            exercise.slug
        )));
    }

    let next_id = exercises.iter().filter_map(|ex| ex.id).max().unwrap_or(0) + 1;
    let now = Utc::now();
    exercise.id = Some(exercise.id.unwrap_or(next_id));
    exercise.created_at = Some(exercise.created_at.unwrap_or(now));
    exercise.updated_at = Some(now);

    exercises.push(exercise.clone());
    Ok(exercise)
}

#[async_trait]
impl CatalogStore for JsonFileStore {
    async fn list(&self) -> Result<Vec<ExerciseV2>> {
        Ok(self.exercises.read().await.clone())
    }

    async fn get(&self, id: i64) -> Result<Option<ExerciseV2>> {
        Ok(self
            .exercises
            .read()
            .await
            .iter()
            .find(|ex| ex.id == Some(id))
            .cloned())
    }

    async fn create(&self, exercise: ExerciseV2) -> Result<ExerciseV2> {
        let mut created = self.create_many(vec![exercise]).await?;
        created
            .pop()
            .ok_or_else(|| CatalogError::Storage("insert produced no row".to_string()))
    }

    async fn create_many(&self, batch: Vec<ExerciseV2>) -> Result<Vec<ExerciseV2>> {
        let mut exercises = self.exercises.write().await;

        let mut next = exercises.clone();
        let mut created = Vec::with_capacity(batch.len());
        for exercise in batch {
            created.push(stage_insert(&mut next, exercise)?);
        }

        next.sort_by_key(|ex| ex.id);
        self.save(&next)?;
        *exercises = next;

        Ok(created)
    }

    async fn update(&self, id: i64, mut exercise: ExerciseV2) -> Result<ExerciseV2> {
        let mut exercises = self.exercises.write().await;

        let index = exercises
            .iter()
            .position(|ex| ex.id == Some(id))
            .ok_or_else(|| CatalogError::NotFound(format!("Exercise {}", id)))?;
        if let Some(owner) = exercises
            .iter()
            .find(|ex| ex.slug == exercise.slug && ex.id != Some(id))
        {
            return Err(CatalogError::Conflict(format!(
                "slug '{}' already used by exercise {}",
                exercise.slug,
                owner.id.unwrap_or_default()
            )));
        }

        exercise.id = Some(id);
        exercise.created_at = exercises[index].created_at;
        exercise.updated_at = Some(Utc::now());

        let mut next = exercises.clone();
        next[index] = exercise.clone();
        self.save(&next)?;
        *exercises = next;

        Ok(exercise)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut exercises = self.exercises.write().await;
        if !exercises.iter().any(|ex| ex.id == Some(id)) {
            return Ok(false);
        }

        let next: Vec<ExerciseV2> = exercises
            .iter()
            .filter(|ex| ex.id != Some(id))
            .cloned()
            .collect();
        self.save(&next)?;
        *exercises = next;
        Ok(true)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.exercises.read().await.len() as u64)
    }

    fn backend_name(&self) -> &str {
        "JSON file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("exercises.json")).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reads_v1_and_v2_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exercises.json");
        std::fs::write(
            &path,
            r#"[
                {"id": 2, "slug": "curl-biceps", "name": "Curl de Biceps", "equipment": ["dumbbells"]},
                {"id": 1, "name": "Crunch", "muscle": "abs", "equipment": "", "difficulty": "beginner", "instructions": "Curl up"},
                {"name": "no id, no slug"}
            ]"#,
        )
        .unwrap();

        let store = JsonFileStore::new(&path).await.unwrap();
        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].slug, "crunch");
        assert_eq!(all[0].primary_muscle.as_deref(), Some("abs"));
        assert_eq!(all[1].equipment, vec!["dumbbells".to_string()]);
    }

    #[tokio::test]
    async fn test_create_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exercises.json");

        let store = JsonFileStore::new(&path).await.unwrap();
        let created = store.create(ExerciseV2::new("Plank")).await.unwrap();
        assert_eq!(created.id, Some(1));
        let second = store.create(ExerciseV2::new("Crunch")).await.unwrap();
        assert_eq!(second.id, Some(2));

        let reopened = JsonFileStore::new(&path).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 2);
        assert_eq!(reopened.get(1).await.unwrap().unwrap().slug, "plank");
    }

    #[tokio::test]
    async fn test_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("e.json")).await.unwrap();
        store.create(ExerciseV2::new("Plank")).await.unwrap();

        let dup_slug = store.create(ExerciseV2::new("Plank")).await;
        assert!(matches!(dup_slug, Err(CatalogError::Conflict(_))));

        let mut dup_id = ExerciseV2::new("Crunch");
        dup_id.id = Some(1);
        assert!(matches!(store.create(dup_id).await, Err(CatalogError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("e.json")).await.unwrap();
        let created = store.create(ExerciseV2::new("Plank")).await.unwrap();

        let mut changed = ExerciseV2::new("Plank Lateral");
        changed.tags = vec!["core".to_string()];
        let updated = store.update(1, changed).await.unwrap();
        assert_eq!(updated.id, Some(1));
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.slug, "plank-lateral");

        assert!(matches!(
            store.update(9, ExerciseV2::new("X")).await,
            Err(CatalogError::NotFound(_))
        ));

        assert!(store.delete(1).await.unwrap());
        assert!(!store.delete(1).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_many_is_all_or_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exercises.json");
        let store = JsonFileStore::new(&path).await.unwrap();

        let batch = vec![
            ExerciseV2::new("Crunch"),
            ExerciseV2::new("Plank"),
            ExerciseV2::new("Crunch"),
        ];
        let result = store.create_many(batch).await;
        assert!(matches!(result, Err(CatalogError::Conflict(_))));
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(!path.exists());

        let created = store
            .create_many(vec![ExerciseV2::new("Crunch"), ExerciseV2::new("Plank")])
            .await
            .unwrap();
        assert_eq!(created[0].id, Some(1));
        assert_eq!(created[1].id, Some(2));

        let reopened = JsonFileStore::new(&path).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 2);
    }
}
