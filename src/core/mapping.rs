use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::core::exercise::deserialize_id;

/// Resolved score reported for an exact slug match
pub const EXACT_SLUG_SCORE: i32 = 999;

/// Resolved score reported for an exact name match
pub const EXACT_NAME_SCORE: i32 = 998;

/// Score reported for an image with no candidates
pub const NO_MATCH_SCORE: i32 = -1;

/// Treat `null` like a missing string
fn deserialize_nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Identifier of one originating data file or table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Exercise as seen by the matcher: source-tagged, flat, read-only
///
/// Serialized with the field names of the mapping artifact
/// (`source_file`, `id`, `slug`, `name`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    #[serde(rename = "source_file")]
    pub source: SourceId,

    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<i64>,

    #[serde(default)]
    pub slug: Option<String>,

    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub name: String,
}

impl ExerciseRecord {
    pub fn new(
        source: impl Into<SourceId>,
        id: Option<i64>,
        slug: Option<&str>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            id,
            slug: slug.map(str::to_string),
            name: name.into(),
        }
    }

    pub fn slug_or_empty(&self) -> &str {
        self.slug.as_deref().unwrap_or("")
    }

    /// Short label for logs
    pub fn display(&self) -> String {
        match (self.id, self.slug.as_deref()) {
            (Some(id), _) => format!("{}#{}", self.source, id),
            (None, Some(slug)) => format!("{}:{}", self.source, slug),
            (None, None) => format!("{}:'{}'", self.source, self.name),
        }
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// An image file referenced by path (forward slashes)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub path: String,
}

impl ImageAsset {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Filename without directory or extension: `abs/crunch.png` → `crunch`
    pub fn stem(&self) -> &str {
        let base = self
            .path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.path.as_str());
        match base.rfind('.') {
            Some(pos) if pos > 0 => &base[..pos],
            _ => base,
        }
    }
}

/// One exercise scored against one image
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMatch {
    pub exercise: ExerciseRecord,

    /// Shared tokens between the stem and `slug + name`
    pub overlap_score: u32,

    /// Normalized stem equals the normalized slug
    pub exact_slug: bool,

    /// Normalized stem equals the normalized name
    pub exact_name: bool,
}

impl CandidateMatch {
    pub fn is_exact_match(&self) -> bool {
        self.exact_slug || self.exact_name
    }
}

/// Outcome of matching one image against the whole snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct MappingEntry {
    pub image: ImageAsset,
    pub filename_stem: String,
    pub candidates: Vec<CandidateMatch>,
    pub best_match: Option<CandidateMatch>,

    /// Resolved score of `best_match`; sentinel for exact matches, -1 when unmatched
    pub score: i32,

    pub ambiguous: bool,
}

impl MappingEntry {
    pub fn is_matched(&self) -> bool {
        self.best_match.is_some()
    }
}
