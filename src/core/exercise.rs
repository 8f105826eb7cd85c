use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_image_type() -> Option<String> {
    Some("step".to_string())
}

/// Deserialize an id from an int or a numeric string (hand-edited JSON files)
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdValue {
        Int(i64),
        String(String),
        Null,
    }

    match IdValue::deserialize(deserializer)? {
        IdValue::Int(i) => Ok(Some(i)),
        IdValue::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| Error::custom(format!("Invalid id string: {}", s))),
        IdValue::Null => Ok(None),
    }
}

/// Flat v1 exercise record, as served by `/exercises`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExerciseV1 {
    pub id: i64,

    #[serde(default)]
    pub name: String,

    /// Primary muscle group
    #[serde(default)]
    pub muscle: String,

    #[serde(default)]
    pub equipment: String,

    #[serde(default)]
    pub difficulty: String,

    /// Free-text instructions
    #[serde(default)]
    pub instructions: String,
}

impl ExerciseV1 {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            muscle: String::new(),
            equipment: String::new(),
            difficulty: String::new(),
            instructions: String::new(),
        }
    }

    /// Project a v2 record onto the flat v1 shape
    pub fn from_v2(ex: &ExerciseV2) -> Self {
        let instructions = match ex.description.as_deref() {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => ex
                .steps
                .iter()
                .map(|s| s.instruction.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        };

        Self {
            id: ex.id.unwrap_or_default(),
            name: ex.name.clone(),
            muscle: ex.primary_muscle.clone().unwrap_or_default(),
            equipment: ex.equipment.join(", "),
            difficulty: ex.difficulty.clone().unwrap_or_default(),
            instructions,
        }
    }
}

/// One instructional step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepItem {
    pub order: i32,

    #[serde(default)]
    pub title: Option<String>,

    pub instruction: String,

    #[serde(default)]
    pub duration_sec: Option<i32>,
}

/// Image attached to an exercise
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageItem {
    pub url: String,

    #[serde(rename = "type", default = "default_image_type")]
    pub kind: Option<String>,

    #[serde(default)]
    pub width: Option<i32>,

    #[serde(default)]
    pub height: Option<i32>,
}

impl ImageItem {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: default_image_type(),
            width: None,
            height: None,
        }
    }
}

/// Suggested sets/reps prescription
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EstimatedSetsReps {
    #[serde(default)]
    pub sets: Option<i32>,

    #[serde(default)]
    pub reps: Option<String>,

    #[serde(default)]
    pub weight_kg: Option<f64>,

    #[serde(default)]
    pub rest_sec: Option<i32>,
}

/// Rich v2 exercise record, as served by `/v2/exercises`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExerciseV2 {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<i64>,

    /// URL-friendly version of the name
    pub slug: String,

    pub name: String,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub primary_muscle: Option<String>,

    #[serde(default)]
    pub secondary_muscles: Vec<String>,

    #[serde(default)]
    pub equipment: Vec<String>,

    #[serde(default)]
    pub difficulty: Option<String>,

    #[serde(default)]
    pub steps: Vec<StepItem>,

    #[serde(default)]
    pub tips: Vec<String>,

    #[serde(default)]
    pub images: Vec<ImageItem>,

    #[serde(default)]
    pub video_url: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub variations: Vec<serde_json::Value>,

    #[serde(default)]
    pub estimated: Option<EstimatedSetsReps>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ExerciseV2 {
    /// Create a bare record; the slug is derived from the name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: None,
            slug: slugify(&name),
            name,
            summary: None,
            description: None,
            primary_muscle: None,
            secondary_muscles: Vec::new(),
            equipment: Vec::new(),
            difficulty: None,
            steps: Vec::new(),
            tips: Vec::new(),
            images: Vec::new(),
            video_url: None,
            tags: Vec::new(),
            variations: Vec::new(),
            estimated: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Upgrade a flat v1 record
    pub fn from_v1(old: &ExerciseV1) -> Self {
        let now = Utc::now();
        let mut ex = Self::new(old.name.clone());

        ex.id = Some(old.id);
        ex.summary = Some(old.instructions.chars().take(120).collect());
        ex.description = Some(old.instructions.clone());
        ex.primary_muscle = Some(old.muscle.clone());
        ex.difficulty = Some(old.difficulty.clone());
        if !old.equipment.is_empty() {
            ex.equipment = vec![old.equipment.clone()];
        }
        if !old.instructions.is_empty() {
            ex.steps = vec![StepItem {
                order: 1,
                title: None,
                instruction: old.instructions.clone(),
                duration_sec: None,
            }];
        }
        ex.created_at = Some(now);
        ex.updated_at = Some(now);
        ex
    }
}

/// Catalog slug: lowercase, spaces to dashes, common Spanish accents folded
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "-")
        .replace('ó', "o")
        .replace('á', "a")
        .replace('é', "e")
        .replace('í', "i")
        .replace('ú', "u")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Press Banca Inclinado"), "press-banca-inclinado");
        assert_eq!(slugify("Elevación Lateral"), "elevacion-lateral");
        // ñ and ü are kept as-is
        assert_eq!(slugify("Pájaro Pequeño"), "pajaro-pequeño");
    }

    #[test]
    fn test_from_v1() {
        let mut old = ExerciseV1::new(7, "Curl de Bíceps");
        old.muscle = "biceps".to_string();
        old.equipment = "mancuerna".to_string();
        old.difficulty = "beginner".to_string();
        old.instructions = "x".repeat(200);

        let ex = ExerciseV2::from_v1(&old);
        assert_eq!(ex.id, Some(7));
        assert_eq!(ex.slug, "curl-de-biceps");
        assert_eq!(ex.summary.as_deref().map(|s| s.len()), Some(120));
        assert_eq!(ex.equipment, vec!["mancuerna".to_string()]);
        assert_eq!(ex.steps.len(), 1);
        assert_eq!(ex.steps[0].order, 1);
        assert!(ex.created_at.is_some());
    }

    #[test]
    fn test_from_v1_without_instructions() {
        let old = ExerciseV1::new(1, "Plank");
        let ex = ExerciseV2::from_v1(&old);
        assert!(ex.steps.is_empty());
        assert!(ex.equipment.is_empty());
    }

    #[test]
    fn test_project_to_v1() {
        let mut ex = ExerciseV2::new("Remo con Barra");
        ex.id = Some(3);
        ex.primary_muscle = Some("back".to_string());
        ex.equipment = vec!["barbell".to_string(), "bench".to_string()];
        ex.steps = vec![
            StepItem { order: 1, title: None, instruction: "Grip".to_string(), duration_sec: None },
            StepItem { order: 2, title: None, instruction: "Pull".to_string(), duration_sec: None },
        ];

        let v1 = ExerciseV1::from_v2(&ex);
        assert_eq!(v1.id, 3);
        assert_eq!(v1.muscle, "back");
        assert_eq!(v1.equipment, "barbell, bench");
        assert_eq!(v1.instructions, "Grip Pull");
    }

    #[test]
    fn test_v2_deserialize_defaults() {
        let ex: ExerciseV2 = serde_json::from_str(
            r#"{"id": "12", "slug": "crunch", "name": "Crunch", "images": [{"url": "/static/images/abs/crunch.png"}]}"#,
        )
        .unwrap();
        assert_eq!(ex.id, Some(12));
        assert_eq!(ex.images[0].kind.as_deref(), Some("step"));
        assert_eq!(ex.images[0].url, "/static/images/abs/crunch.png");
        assert!(ex.tags.is_empty());
    }
}
