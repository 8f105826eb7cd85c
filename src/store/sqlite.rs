use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::ExerciseV2;
use crate::error::{CatalogError, Result};
use crate::store::CatalogStore;

const SELECT_COLUMNS: &str = "id, slug, name, summary, description, primary_muscle,
    secondary_muscles, equipment, difficulty, steps, tips, images, video_url,
    tags, variations, estimated, created_at, updated_at";

/// SQLite-backed catalog
///
/// List-valued fields live in TEXT columns as JSON:
/// ```sql
/// CREATE TABLE exercises (
///     id INTEGER PRIMARY KEY,
///     name TEXT NOT NULL,
///     slug TEXT UNIQUE,
///     primary_muscle TEXT,
///     difficulty TEXT,
///     json_data TEXT,
///     summary TEXT,
///     description TEXT,
///     secondary_muscles TEXT,
///     equipment TEXT,
///     steps TEXT,
///     tips TEXT,
///     images TEXT,
///     video_url TEXT,
///     tags TEXT,
///     variations TEXT,
///     estimated TEXT,
///     created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
///     updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
/// );
/// ```
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database and make sure the table exists
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS exercises (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                slug TEXT UNIQUE,
                primary_muscle TEXT,
                difficulty TEXT,
                json_data TEXT,
                summary TEXT,
                description TEXT,
                secondary_muscles TEXT,
                equipment TEXT,
                steps TEXT,
                tips TEXT,
                images TEXT,
                video_url TEXT,
                tags TEXT,
                variations TEXT,
                estimated TEXT,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_exercises_slug ON exercises(slug)",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CatalogError::Storage("SQLite connection lock poisoned".to_string()))
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Decode a JSON column; NULL or garbage falls back to the default
fn from_json<T: DeserializeOwned + Default>(raw: Option<String>) -> T {
    raw.filter(|s| !s.trim().is_empty())
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

/// Parse a timestamp stored as RFC 3339 or as SQLite's `CURRENT_TIMESTAMP` text
fn parse_timestamp(raw: Option<String>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn row_to_exercise(row: &Row<'_>) -> rusqlite::Result<ExerciseV2> {
    Ok(ExerciseV2 {
        id: row.get(0)?,
        slug: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        name: row.get(2)?,
        summary: row.get(3)?,
        description: row.get(4)?,
        primary_muscle: row.get(5)?,
        secondary_muscles: from_json(row.get(6)?),
        equipment: from_json(row.get(7)?),
        difficulty: row.get(8)?,
        steps: from_json(row.get(9)?),
        tips: from_json(row.get(10)?),
        images: from_json(row.get(11)?),
        video_url: row.get(12)?,
        tags: from_json(row.get(13)?),
        variations: from_json(row.get(14)?),
        estimated: from_json(row.get(15)?),
        created_at: parse_timestamp(row.get(16)?),
        updated_at: parse_timestamp(row.get(17)?),
    })
}

fn select_one(conn: &Connection, id: i64) -> Result<Option<ExerciseV2>> {
    let sql = format!("SELECT {} FROM exercises WHERE id = ?1", SELECT_COLUMNS);
    Ok(conn.query_row(&sql, params![id], row_to_exercise).optional()?)
}

fn id_exists(conn: &Connection, id: i64) -> Result<bool> {
    Ok(conn
        .query_row("SELECT 1 FROM exercises WHERE id = ?1", params![id], |_| Ok(()))
        .optional()?
        .is_some())
}

/// Id of another row already using `slug`
fn slug_owner(conn: &Connection, slug: &str) -> Result<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT id FROM exercises WHERE slug = ?1",
            params![slug],
            |row| row.get(0),
        )
        .optional()?)
}

fn insert(conn: &Connection, ex: &ExerciseV2) -> Result<i64> {
    conn.execute(
        "INSERT INTO exercises (id, slug, name, summary, description, primary_muscle,
             secondary_muscles, equipment, difficulty, steps, tips, images, video_url,
             tags, variations, estimated, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            ex.id,
            ex.slug,
            ex.name,
            ex.summary,
            ex.description,
            ex.primary_muscle,
            to_json(&ex.secondary_muscles)?,
            to_json(&ex.equipment)?,
            ex.difficulty,
            to_json(&ex.steps)?,
            to_json(&ex.tips)?,
            to_json(&ex.images)?,
            ex.video_url,
            to_json(&ex.tags)?,
            to_json(&ex.variations)?,
            ex.estimated.as_ref().map(to_json).transpose()?,
            ex.created_at.map(|t| t.to_rfc3339()),
            ex.updated_at.map(|t| t.to_rfc3339()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn create_row(conn: &Connection, mut exercise: ExerciseV2) -> Result<ExerciseV2> {
    if let Some(id) = exercise.id {
        if id_exists(conn, id)? {
            return Err(CatalogError::Conflict(format!("ID {} already exists", id)));
        }
    }
    if slug_owner(conn, &exercise.slug)?.is_some() {
        return Err(CatalogError::Conflict(format!(
            "slug '{}' already exists",
            exercise.slug
        )));
    }

    let now = Utc::now();
    exercise.created_at = Some(exercise.created_at.unwrap_or(now));
    exercise.updated_at = Some(now);

    let id = insert(conn, &exercise)?;
    exercise.id = Some(id);
    Ok(exercise)
}

fn update_row(conn: &Connection, id: i64, ex: &ExerciseV2) -> Result<()> {
    conn.execute(
        "UPDATE exercises SET
             slug = ?1, name = ?2, summary = ?3, description = ?4, primary_muscle = ?5,
             secondary_muscles = ?6, equipment = ?7, difficulty = ?8, steps = ?9, tips = ?10,
             images = ?11, video_url = ?12, tags = ?13, variations = ?14, estimated = ?15,
             updated_at = ?16
         WHERE id = ?17",
        params![
            ex.slug,
            ex.name,
            ex.summary,
            ex.description,
            ex.primary_muscle,
            to_json(&ex.secondary_muscles)?,
            to_json(&ex.equipment)?,
            ex.difficulty,
            to_json(&ex.steps)?,
            to_json(&ex.tips)?,
            to_json(&ex.images)?,
            ex.video_url,
            to_json(&ex.tags)?,
            to_json(&ex.variations)?,
            ex.estimated.as_ref().map(to_json).transpose()?,
            Utc::now().to_rfc3339(),
            id,
        ],
    )?;
    Ok(())
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn list(&self) -> Result<Vec<ExerciseV2>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM exercises ORDER BY id", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_exercise)?;
        let exercises = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(exercises)
    }

    async fn get(&self, id: i64) -> Result<Option<ExerciseV2>> {
        let conn = self.lock()?;
        select_one(&conn, id)
    }

    async fn create(&self, exercise: ExerciseV2) -> Result<ExerciseV2> {
        let conn = self.lock()?;
        create_row(&conn, exercise)
    }

    async fn create_many(&self, exercises: Vec<ExerciseV2>) -> Result<Vec<ExerciseV2>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut created = Vec::with_capacity(exercises.len());
        for exercise in exercises {
            // dropping `tx` on error rolls the batch back
            created.push(create_row(&tx, exercise)?);
        }

        tx.commit()?;
        Ok(created)
    }

    async fn update(&self, id: i64, exercise: ExerciseV2) -> Result<ExerciseV2> {
        let conn = self.lock()?;

        if !id_exists(&conn, id)? {
            return Err(CatalogError::NotFound(format!("Exercise {}", id)));
        }
        if let Some(owner) = slug_owner(&conn, &exercise.slug)? {
            if owner != id {
                return Err(CatalogError::Conflict(format!(
                    "slug '{}' already used by exercise {}",
                    exercise.slug, owner
                )));
            }
        }

        update_row(&conn, id, &exercise)?;
        select_one(&conn, id)?.ok_or_else(|| CatalogError::NotFound(format!("Exercise {}", id)))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM exercises WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    async fn count(&self) -> Result<u64> {
        let conn = self.lock()?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM exercises", [], |row| row.get(0))?;
        Ok(total as u64)
    }

    fn backend_name(&self) -> &str {
        "SQLite"
    }
}
