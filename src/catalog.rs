use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::core::{slugify, ExerciseV1, ExerciseV2};
use crate::error::{CatalogError, Result};
use crate::store::CatalogStore;

/// Largest page size accepted by the v2 listing
pub const MAX_PAGE_LIMIT: usize = 200;

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    50
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// v1 listing filters (case-insensitive equality)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct V1Filter {
    pub muscle: Option<String>,
    pub equipment: Option<String>,
    pub difficulty: Option<String>,
}

impl V1Filter {
    pub fn matches(&self, ex: &ExerciseV1) -> bool {
        let field_ok = |wanted: &Option<String>, actual: &str| match wanted.as_deref() {
            Some(w) if !w.is_empty() => eq_ignore_case(w, actual),
            _ => true,
        };
        field_ok(&self.muscle, &ex.muscle)
            && field_ok(&self.equipment, &ex.equipment)
            && field_ok(&self.difficulty, &ex.difficulty)
    }
}

/// v2 listing query
#[derive(Debug, Clone, Deserialize)]
pub struct V2Query {
    /// Substring of name or description
    pub query: Option<String>,
    pub muscle: Option<String>,
    /// Must be one of the exercise's equipment entries
    pub equipment: Option<String>,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for V2Query {
    fn default() -> Self {
        Self {
            query: None,
            muscle: None,
            equipment: None,
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl V2Query {
    fn validate(&self) -> Result<()> {
        if self.page == 0 {
            return Err(CatalogError::InvalidInput("page must be >= 1".to_string()));
        }
        if self.limit == 0 || self.limit > MAX_PAGE_LIMIT {
            return Err(CatalogError::InvalidInput(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_LIMIT
            )));
        }
        Ok(())
    }

    pub fn matches(&self, ex: &ExerciseV2) -> bool {
        if let Some(q) = self.query.as_deref().filter(|q| !q.is_empty()) {
            let q = q.to_lowercase();
            let in_name = ex.name.to_lowercase().contains(&q);
            let in_description = ex
                .description
                .as_deref()
                .map(|d| d.to_lowercase().contains(&q))
                .unwrap_or(false);
            if !in_name && !in_description {
                return false;
            }
        }
        if let Some(muscle) = self.muscle.as_deref().filter(|m| !m.is_empty()) {
            match ex.primary_muscle.as_deref() {
                Some(pm) if eq_ignore_case(pm, muscle) => {}
                _ => return false,
            }
        }
        if let Some(equipment) = self.equipment.as_deref().filter(|e| !e.is_empty()) {
            if !ex.equipment.iter().any(|e| eq_ignore_case(e, equipment)) {
                return false;
            }
        }
        true
    }
}

/// Aggregate counts over the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogStats {
    pub total_exercises: u64,
    pub database_type: String,
    pub muscle_groups: BTreeMap<String, u64>,
    pub difficulty_levels: BTreeMap<String, u64>,
    pub equipment_types: BTreeMap<String, u64>,
}

/// Result of copying the v1 file into the store
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MigrationOutcome {
    AlreadyMigrated { count: u64 },
    Migrated { count: u64 },
}

/// Catalog operations for both API versions over one store
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    // ---- v1 ----

    pub async fn list_v1(&self, filter: &V1Filter) -> Result<Vec<ExerciseV1>> {
        Ok(self
            .store
            .list()
            .await?
            .iter()
            .map(ExerciseV1::from_v2)
            .filter(|ex| filter.matches(ex))
            .collect())
    }

    pub async fn get_v1(&self, id: i64) -> Result<ExerciseV1> {
        self.store
            .get(id)
            .await?
            .map(|ex| ExerciseV1::from_v2(&ex))
            .ok_or_else(|| CatalogError::NotFound("Exercise not found".to_string()))
    }

    pub async fn create_v1(&self, exercise: ExerciseV1) -> Result<ExerciseV1> {
        if self.store.get(exercise.id).await?.is_some() {
            return Err(CatalogError::Conflict("ID already exists".to_string()));
        }
        let created = self.store.create(ExerciseV2::from_v1(&exercise)).await?;
        tracing::info!("Created v1 exercise {} ({})", exercise.id, created.slug);
        Ok(exercise)
    }

    /// Replace the flat fields, keeping v2-only data (images, tips, ...)
    pub async fn update_v1(&self, id: i64, exercise: ExerciseV1) -> Result<ExerciseV1> {
        let existing = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound("Exercise not found".to_string()))?;

        let upgraded = ExerciseV2::from_v1(&exercise);
        let merged = ExerciseV2 {
            id: Some(id),
            images: existing.images,
            tips: existing.tips,
            tags: existing.tags,
            secondary_muscles: existing.secondary_muscles,
            variations: existing.variations,
            video_url: existing.video_url,
            estimated: existing.estimated,
            created_at: existing.created_at,
            ..upgraded
        };
        self.store.update(id, merged).await?;
        Ok(ExerciseV1 { id, ..exercise })
    }

    pub async fn delete_v1(&self, id: i64) -> Result<()> {
        self.delete_v2(id).await
    }

    // ---- v2 ----

    pub async fn list_v2(&self, query: &V2Query) -> Result<Vec<ExerciseV2>> {
        query.validate()?;
        let start = (query.page - 1) * query.limit;
        Ok(self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|ex| query.matches(ex))
            .skip(start)
            .take(query.limit)
            .collect())
    }

    pub async fn get_v2(&self, id: i64) -> Result<ExerciseV2> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound("Exercise not found in v2".to_string()))
    }

    pub async fn create_v2(&self, mut exercise: ExerciseV2) -> Result<ExerciseV2> {
        if exercise.name.trim().is_empty() {
            return Err(CatalogError::InvalidInput("name must not be empty".to_string()));
        }
        if exercise.slug.trim().is_empty() {
            exercise.slug = slugify(&exercise.name);
        }
        let created = self.store.create(exercise).await?;
        tracing::info!("Created exercise {:?} ({})", created.id, created.slug);
        Ok(created)
    }

    pub async fn update_v2(&self, id: i64, exercise: ExerciseV2) -> Result<ExerciseV2> {
        if exercise.name.trim().is_empty() || exercise.slug.trim().is_empty() {
            return Err(CatalogError::InvalidInput(
                "name and slug must not be empty".to_string(),
            ));
        }
        self.store.update(id, exercise).await
    }

    pub async fn delete_v2(&self, id: i64) -> Result<()> {
        if self.store.delete(id).await? {
            tracing::info!("Deleted exercise {}", id);
            Ok(())
        } else {
            Err(CatalogError::NotFound("Exercise not found".to_string()))
        }
    }

    pub async fn stats(&self) -> Result<CatalogStats> {
        let exercises = self.store.list().await?;

        let mut muscle_groups = BTreeMap::new();
        let mut difficulty_levels = BTreeMap::new();
        let mut equipment_types = BTreeMap::new();

        for ex in &exercises {
            let muscle = ex.primary_muscle.clone().unwrap_or_else(|| "Unknown".to_string());
            *muscle_groups.entry(muscle).or_insert(0) += 1;

            let difficulty = ex.difficulty.clone().unwrap_or_else(|| "Unknown".to_string());
            *difficulty_levels.entry(difficulty).or_insert(0) += 1;

            for equipment in &ex.equipment {
                *equipment_types.entry(equipment.clone()).or_insert(0) += 1;
            }
        }

        Ok(CatalogStats {
            total_exercises: self.store.count().await?,
            database_type: self.store.backend_name().to_string(),
            muscle_groups,
            difficulty_levels,
            equipment_types,
        })
    }

    /// Copy the v1 JSON file into an empty store
    pub async fn migrate_from_v1(&self, v1_path: &Path) -> Result<MigrationOutcome> {
        let current = self.store.count().await?;
        if current > 0 {
            return Ok(MigrationOutcome::AlreadyMigrated { count: current });
        }

        let text = tokio::fs::read_to_string(v1_path)
            .await
            .map_err(|e| CatalogError::io(v1_path, e))?;
        let rows: Vec<ExerciseV1> = serde_json::from_str(&text)?;
        tracing::info!("Migrating {} exercises from {}", rows.len(), v1_path.display());

        let batch = rows.iter().map(ExerciseV2::from_v1).collect();
        self.store.create_many(batch).await?;

        let count = self.store.count().await?;
        tracing::info!("Migration completed. Total exercises: {}", count);
        Ok(MigrationOutcome::Migrated { count })
    }
}
