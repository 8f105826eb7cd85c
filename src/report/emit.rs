use std::path::{Path, PathBuf};

use crate::core::MappingEntry;
use crate::error::{CatalogError, Result};
use crate::persist;
use crate::report::ArtifactEntry;

/// Header of the review CSV
pub const CSV_HEADER: [&str; 8] = [
    "image",
    "filename",
    "match_source",
    "match_id",
    "match_slug",
    "match_name",
    "ambiguous",
    "match_score",
];

/// Where the two artifacts go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
}

impl ArtifactPaths {
    pub fn new(json: impl Into<PathBuf>, csv: impl Into<PathBuf>) -> Self {
        Self {
            json: json.into(),
            csv: csv.into(),
        }
    }
}

/// Structured artifact as pretty JSON (non-ASCII kept as-is)
pub fn render_json(entries: &[MappingEntry]) -> Result<Vec<u8>> {
    let artifact: Vec<ArtifactEntry> = entries.iter().map(ArtifactEntry::from).collect();
    Ok(serde_json::to_vec_pretty(&artifact)?)
}

/// One row per image for manual review
pub fn render_csv(entries: &[MappingEntry]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for entry in entries {
        let best = entry.best_match.as_ref().map(|c| &c.exercise);
        let id = best
            .and_then(|e| e.id)
            .map(|id| id.to_string())
            .unwrap_or_default();
        let score = entry.score.to_string();

        writer.write_record([
            entry.image.path.as_str(),
            entry.filename_stem.as_str(),
            best.map(|e| e.source.as_str()).unwrap_or(""),
            id.as_str(),
            best.and_then(|e| e.slug.as_deref()).unwrap_or(""),
            best.map(|e| e.name.as_str()).unwrap_or(""),
            if entry.ambiguous { "true" } else { "false" },
            score.as_str(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| CatalogError::Csv(csv::Error::from(e.into_error())))
}

/// Write both artifacts, or neither
///
/// Everything is rendered in memory first; nothing on disk changes if
/// rendering or any write fails. The JSON artifact is renamed into place
/// last, so a failed CSV rename never leaves a new JSON next to an old CSV.
pub fn emit(entries: &[MappingEntry], paths: &ArtifactPaths) -> Result<()> {
    let json = render_json(entries)?;
    let table = render_csv(entries)?;

    persist::write_all_or_nothing(&[
        (paths.csv.as_path(), table.as_slice()),
        (paths.json.as_path(), json.as_slice()),
    ])?;

    tracing::info!(
        "Mapping written: {} entries -> {} and {}",
        entries.len(),
        paths.json.display(),
        paths.csv.display()
    );
    Ok(())
}

/// Used by the audit writer too
pub(crate) fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    persist::replace_file(path, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CandidateMatch, ExerciseRecord, ImageAsset, NO_MATCH_SCORE};

    fn entries() -> Vec<MappingEntry> {
        let curl = CandidateMatch {
            exercise: ExerciseRecord::new(
                "data/exercises.json",
                Some(2),
                Some("curl-biceps"),
                "Curl de Bíceps, mancuerna",
            ),
            overlap_score: 1,
            exact_slug: false,
            exact_name: false,
        };
        vec![
            MappingEntry {
                image: ImageAsset::new("biceps/curl-martillo.png"),
                filename_stem: "curl-martillo".to_string(),
                candidates: vec![curl.clone()],
                best_match: Some(curl),
                score: 1,
                ambiguous: false,
            },
            MappingEntry {
                image: ImageAsset::new("gemelos/talones.png"),
                filename_stem: "talones".to_string(),
                candidates: Vec::new(),
                best_match: None,
                score: NO_MATCH_SCORE,
                ambiguous: false,
            },
        ]
    }

    #[test]
    fn test_render_csv() {
        let csv = String::from_utf8(render_csv(&entries()).unwrap()).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "image,filename,match_source,match_id,match_slug,match_name,ambiguous,match_score"
        );
        assert_eq!(
            lines[1],
            "biceps/curl-martillo.png,curl-martillo,data/exercises.json,2,curl-biceps,\"Curl de Bíceps, mancuerna\",false,1"
        );
        assert_eq!(lines[2], "gemelos/talones.png,talones,,,,,false,-1");
    }

    #[test]
    fn test_render_json_fields() {
        let json: serde_json::Value = serde_json::from_slice(&render_json(&entries()).unwrap()).unwrap();
        assert_eq!(json[0]["filename"], "curl-martillo");
        assert_eq!(json[0]["best_match"]["source_file"], "data/exercises.json");
        assert_eq!(json[0]["matches"].as_array().unwrap().len(), 1);
        assert!(json[1]["best_match"].is_null());
        assert_eq!(json[1]["ambiguous"], false);
    }

    #[test]
    fn test_emit_unwritable_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let paths = ArtifactPaths::new(dir.path().join("map.json"), blocker.join("map.csv"));
        assert!(emit(&entries(), &paths).is_err());
        assert!(!paths.json.exists());
    }

    #[test]
    fn test_emit_failed_csv_rename_keeps_old_json() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("map.json");
        std::fs::write(&json_path, "[]").unwrap();

        // a non-empty directory cannot be replaced by a file
        let csv_path = dir.path().join("map.csv");
        std::fs::create_dir(&csv_path).unwrap();
        std::fs::write(csv_path.join("keep"), "").unwrap();

        let paths = ArtifactPaths::new(&json_path, &csv_path);
        assert!(emit(&entries(), &paths).is_err());
        assert_eq!(std::fs::read_to_string(&json_path).unwrap(), "[]");
        assert!(!dir.path().join("map.json.tmp").exists());
    }
}
