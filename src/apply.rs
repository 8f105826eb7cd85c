use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{CatalogError, Result};
use crate::persist;
use crate::report::ArtifactEntry;

/// Image URLs to attach, grouped by source file, each as `(exercise id, image)`
pub type UpdatePlan = BTreeMap<String, Vec<(i64, String)>>;

/// Outcome of applying a plan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub files_updated: Vec<PathBuf>,
    pub files_skipped: Vec<PathBuf>,
    pub images_added: usize,
    pub ids_missing: usize,
}

/// Collect the updates a mapping implies
///
/// Entries with no best match or no id are left out; ambiguous entries too
/// unless `include_ambiguous` is set.
pub fn plan_updates(entries: &[ArtifactEntry], include_ambiguous: bool) -> UpdatePlan {
    let mut plan = UpdatePlan::new();
    for entry in entries {
        if entry.ambiguous && !include_ambiguous {
            tracing::debug!("Skipping ambiguous mapping for {}", entry.image);
            continue;
        }
        let Some(best) = entry.best_match.as_ref() else {
            continue;
        };
        let Some(id) = best.id else {
            tracing::debug!("Best match for {} has no id, skipped", entry.image);
            continue;
        };
        plan.entry(best.source.to_string())
            .or_default()
            .push((id, entry.image.clone()));
    }
    plan
}

/// Attach each image to the record with the matching id. Returns
/// `(images added, ids not found)`.
pub fn apply_to_records(records: &mut [Value], updates: &[(i64, String)]) -> (usize, usize) {
    let mut added = 0;
    let mut missing = 0;

    for (id, image) in updates {
        let record = records
            .iter_mut()
            .find(|r| r.get("id").and_then(Value::as_i64) == Some(*id));
        let Some(Value::Object(record)) = record else {
            tracing::warn!("ID {} not found, image {} not applied", id, image);
            missing += 1;
            continue;
        };

        let images = record.entry("images").or_insert_with(|| json!([]));
        if !images.is_array() {
            *images = json!([]);
        }
        if let Value::Array(list) = images {
            let present = list
                .iter()
                .any(|img| img.get("url").and_then(Value::as_str) == Some(image.as_str()));
            if !present {
                list.push(json!({ "url": image }));
                added += 1;
            }
        }
    }

    (added, missing)
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".bak");
    path.with_file_name(name)
}

/// Apply a plan to the source files on disk
///
/// A changed file gets its previous content saved next to it as `<file>.bak`.
pub fn apply_updates(plan: &UpdatePlan) -> Result<ApplySummary> {
    let mut summary = ApplySummary::default();

    for (source, updates) in plan {
        let path = PathBuf::from(source);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Source JSON {} not readable, skipped: {}", source, e);
                summary.files_skipped.push(path);
                continue;
            }
        };
        let mut records = match serde_json::from_str::<Value>(&text) {
            Ok(Value::Array(records)) => records,
            Ok(_) => {
                tracing::warn!("Source JSON {} is not a list, skipped", source);
                summary.files_skipped.push(path);
                continue;
            }
            Err(e) => {
                tracing::warn!("Failed to parse {}, skipped: {}", source, e);
                summary.files_skipped.push(path);
                continue;
            }
        };

        let (added, missing) = apply_to_records(&mut records, updates);
        summary.ids_missing += missing;
        if added == 0 {
            tracing::info!("No changes for {}", source);
            continue;
        }

        let backup = backup_path(&path);
        std::fs::write(&backup, text.as_bytes()).map_err(|e| CatalogError::io(&backup, e))?;
        let json = serde_json::to_vec_pretty(&records)?;
        persist::replace_file(&path, &json)?;

        tracing::info!("Updated {} (+{} images), backup at {}", source, added, backup.display());
        summary.images_added += added;
        summary.files_updated.push(path);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ExerciseRecord;

    fn entry(image: &str, best: Option<ExerciseRecord>, ambiguous: bool) -> ArtifactEntry {
        ArtifactEntry {
            image: image.to_string(),
            filename: String::new(),
            matches: best.iter().cloned().collect(),
            best_match: best,
            ambiguous,
            match_score: 1,
        }
    }

    #[test]
    fn test_plan_updates() {
        let entries = vec![
            entry("/a.png", Some(ExerciseRecord::new("x.json", Some(1), None, "A")), false),
            entry("/b.png", Some(ExerciseRecord::new("x.json", Some(2), None, "B")), true),
            entry("/c.png", Some(ExerciseRecord::new("y.json", None, Some("c"), "C")), false),
            entry("/d.png", None, false),
        ];

        let plan = plan_updates(&entries, false);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan["x.json"], vec![(1, "/a.png".to_string())]);

        let plan = plan_updates(&entries, true);
        assert_eq!(plan["x.json"].len(), 2);
    }

    #[test]
    fn test_apply_to_records() {
        let mut records: Vec<Value> = serde_json::from_str(
            r#"[
                {"id": 1, "name": "Crunch"},
                {"id": 2, "name": "Curl", "images": [{"url": "/curl.png", "type": "step"}]},
                "junk"
            ]"#,
        )
        .unwrap();

        let updates = vec![
            (1, "/crunch.png".to_string()),
            (2, "/curl.png".to_string()),
            (2, "/curl-2.png".to_string()),
            (7, "/ghost.png".to_string()),
        ];
        let (added, missing) = apply_to_records(&mut records, &updates);
        assert_eq!(added, 2);
        assert_eq!(missing, 1);
        assert_eq!(records[0]["images"][0]["url"], "/crunch.png");
        assert_eq!(records[1]["images"].as_array().unwrap().len(), 2);
        // untouched fields survive
        assert_eq!(records[1]["images"][0]["type"], "step");
    }

    #[test]
    fn test_apply_updates_writes_backup() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("exercises.json");
        let original = r#"[{"id": 1, "name": "Crunch", "muscle": "abs"}]"#;
        std::fs::write(&source, original).unwrap();
        let missing = dir.path().join("missing.json");

        let mut plan = UpdatePlan::new();
        plan.insert(
            source.to_string_lossy().to_string(),
            vec![(1, "/static/images/abs/crunch.png".to_string())],
        );
        plan.insert(missing.to_string_lossy().to_string(), vec![(1, "/x.png".to_string())]);

        let summary = apply_updates(&plan).unwrap();
        assert_eq!(summary.images_added, 1);
        assert_eq!(summary.files_updated, vec![source.clone()]);
        assert_eq!(summary.files_skipped, vec![missing]);

        assert_eq!(std::fs::read_to_string(backup_path(&source)).unwrap(), original);
        let updated: Value = serde_json::from_str(&std::fs::read_to_string(&source).unwrap()).unwrap();
        assert_eq!(updated[0]["muscle"], "abs");
        assert_eq!(updated[0]["images"][0]["url"], "/static/images/abs/crunch.png");

        // second run changes nothing
        let again = apply_updates(&plan).unwrap();
        assert_eq!(again.images_added, 0);
        assert!(again.files_updated.is_empty());
    }
}
