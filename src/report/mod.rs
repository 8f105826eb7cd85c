//! Mapping artifacts: structured JSON for the catalog update step, CSV for review

pub mod audit;
pub mod emit;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::{ExerciseRecord, MappingEntry};
use crate::error::{CatalogError, Result};

pub use audit::{audit, write_audit, AuditReason, AuditRecord};
pub use emit::{emit, render_csv, render_json, ArtifactPaths};

/// One image in the structured artifact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactEntry {
    pub image: String,

    /// Filename stem
    pub filename: String,

    /// Every candidate, in snapshot order
    #[serde(default, alias = "candidates")]
    pub matches: Vec<ExerciseRecord>,

    #[serde(default)]
    pub best_match: Option<ExerciseRecord>,

    #[serde(default)]
    pub ambiguous: bool,

    /// Resolved score of `best_match` (999/998 for exact matches, -1 if none)
    #[serde(default)]
    pub match_score: i32,
}

impl From<&MappingEntry> for ArtifactEntry {
    fn from(entry: &MappingEntry) -> Self {
        Self {
            image: entry.image.path.clone(),
            filename: entry.filename_stem.clone(),
            matches: entry.candidates.iter().map(|c| c.exercise.clone()).collect(),
            best_match: entry.best_match.as_ref().map(|c| c.exercise.clone()),
            ambiguous: entry.ambiguous,
            match_score: entry.score,
        }
    }
}

/// Re-read a structured artifact
pub fn read_artifact(path: &Path) -> Result<Vec<ArtifactEntry>> {
    let text = std::fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ImageAsset;
    use crate::matching::SourcePriority;
    use crate::pipeline::ImageMatcher;
    use crate::sources::Snapshot;

    #[test]
    fn test_artifact_round_trip() {
        let snapshot = Snapshot::new(
            vec![
                ImageAsset::new("/static/images/abs/crunch.png"),
                ImageAsset::new("/static/images/x/remo.png"),
                ImageAsset::new("/static/images/gemelos/talones.png"),
            ],
            vec![
                ExerciseRecord::new("A", Some(1), Some("crunch"), "Crunch"),
                ExerciseRecord::new("A", Some(2), Some("remoalto"), "Remoalto"),
                ExerciseRecord::new("B", None, Some("remobajo"), "Remobajo"),
            ],
        );
        let run = ImageMatcher::new(SourcePriority::new(["A"])).run(&snapshot);

        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::new(dir.path().join("map.json"), dir.path().join("map.csv"));
        emit(&run.entries, &paths).unwrap();

        let parsed = read_artifact(&paths.json).unwrap();
        let expected: Vec<_> = run
            .entries
            .iter()
            .map(|e| {
                (
                    e.image.path.clone(),
                    e.best_match.as_ref().and_then(|c| c.exercise.slug.clone()),
                    e.ambiguous,
                )
            })
            .collect();
        let actual: Vec<_> = parsed
            .iter()
            .map(|e| {
                (
                    e.image.clone(),
                    e.best_match.as_ref().and_then(|m| m.slug.clone()),
                    e.ambiguous,
                )
            })
            .collect();
        assert_eq!(actual, expected);
        assert!(parsed[1].ambiguous);
        assert!(parsed[2].best_match.is_none());
    }

    #[test]
    fn test_reads_legacy_map_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("images_exercise_map.json");
        std::fs::write(
            &path,
            r#"[{"image": "/static/images/abs/crunch.png", "filename": "crunch",
                 "matches": [{"source_file": "data/exercises.json", "id": 1, "slug": null, "name": "Crunch"}]}]"#,
        )
        .unwrap();

        let parsed = read_artifact(&path).unwrap();
        assert_eq!(parsed[0].matches.len(), 1);
        assert!(parsed[0].best_match.is_none());
        assert!(!parsed[0].ambiguous);
    }

    #[test]
    fn test_read_missing_artifact() {
        let err = read_artifact(Path::new("/no/such/map.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
