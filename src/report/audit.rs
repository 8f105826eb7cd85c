use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::matching::{normalize, tokens};
use crate::report::emit::write_json;
use crate::report::ArtifactEntry;

/// Why an image needs a human look
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditReason {
    /// More than one candidate was found
    MultipleMatches,
    /// At most one shared word with the chosen label, and not an exact match
    LowOverlap,
}

/// Review line for one image
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditRecord {
    pub image: String,
    pub filename: String,
    pub num_matches: usize,
    pub best_source: Option<String>,
    pub best_id: Option<i64>,
    pub best_slug: String,
    pub best_name: String,
    pub overlap_score: usize,
    pub exact_match: bool,
    pub ambiguous: bool,
    pub reasons: Vec<AuditReason>,
}

fn audit_entry(entry: &ArtifactEntry) -> AuditRecord {
    let stem = normalize(&entry.filename);
    let best = entry.best_match.as_ref();
    let best_slug = best.and_then(|b| b.slug.clone()).unwrap_or_default();
    let best_name = best.map(|b| b.name.clone()).unwrap_or_default();

    // the slug stands in for the name when present
    let label = if best_slug.trim().is_empty() { &best_name } else { &best_slug };
    let best_norm = normalize(label);

    let overlap_score = if best_norm.is_empty() {
        0
    } else {
        let stem_words = tokens(&stem);
        tokens(&best_norm)
            .iter()
            .filter(|w| stem_words.contains(*w))
            .count()
    };
    let exact_match = best_norm == stem;

    let mut reasons = Vec::new();
    if entry.matches.len() > 1 {
        reasons.push(AuditReason::MultipleMatches);
    }
    if overlap_score <= 1 && !exact_match {
        reasons.push(AuditReason::LowOverlap);
    }

    AuditRecord {
        image: entry.image.clone(),
        filename: entry.filename.clone(),
        num_matches: entry.matches.len(),
        best_source: best.map(|b| b.source.to_string()),
        best_id: best.and_then(|b| b.id),
        best_slug,
        best_name,
        overlap_score,
        exact_match,
        ambiguous: !reasons.is_empty(),
        reasons,
    }
}

/// Stricter second opinion over a finished mapping
pub fn audit(entries: &[ArtifactEntry]) -> Vec<AuditRecord> {
    let records: Vec<AuditRecord> = entries.iter().map(audit_entry).collect();
    let flagged = records.iter().filter(|r| r.ambiguous).count();
    tracing::info!("Audit: {} images, {} flagged for review", records.len(), flagged);
    records
}

/// Write an audit report as JSON
pub fn write_audit(path: &Path, records: &[AuditRecord]) -> Result<()> {
    write_json(path, &records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ExerciseRecord;

    fn entry(filename: &str, matches: Vec<ExerciseRecord>, best: Option<usize>) -> ArtifactEntry {
        ArtifactEntry {
            image: format!("/static/images/x/{}.png", filename),
            filename: filename.to_string(),
            best_match: best.map(|i| matches[i].clone()),
            matches,
            ambiguous: false,
            match_score: 0,
        }
    }

    #[test]
    fn test_exact_single_match_is_clean() {
        let rec = ExerciseRecord::new("A", Some(1), Some("crunch"), "Crunch");
        let report = audit(&[entry("crunch", vec![rec], Some(0))]);
        assert!(report[0].exact_match);
        assert!(!report[0].ambiguous);
        assert!(report[0].reasons.is_empty());
    }

    #[test]
    fn test_multiple_and_low_overlap() {
        let a = ExerciseRecord::new("A", Some(1), Some("curl-biceps"), "Curl de Biceps");
        let b = ExerciseRecord::new("B", Some(2), Some("curl-martillo"), "Curl Martillo");
        let report = audit(&[entry("curl-barra", vec![a, b], Some(0))]);

        let r = &report[0];
        assert_eq!(r.num_matches, 2);
        assert_eq!(r.overlap_score, 1);
        assert_eq!(r.reasons, vec![AuditReason::MultipleMatches, AuditReason::LowOverlap]);
        assert!(r.ambiguous);
        assert_eq!(r.best_source.as_deref(), Some("A"));
    }

    #[test]
    fn test_name_used_when_slug_missing() {
        let rec = ExerciseRecord::new("A", Some(3), None, "Remo con Barra");
        let report = audit(&[entry("remo-con-barra", vec![rec], Some(0))]);
        assert_eq!(report[0].overlap_score, 3);
        assert!(report[0].exact_match);
        assert!(!report[0].ambiguous);
    }

    #[test]
    fn test_unmatched_is_low_overlap() {
        let report = audit(&[entry("talones", Vec::new(), None)]);
        assert_eq!(report[0].reasons, vec![AuditReason::LowOverlap]);
        assert!(report[0].best_source.is_none());
    }

    #[test]
    fn test_write_audit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.json");
        let report = audit(&[entry("talones", Vec::new(), None)]);
        write_audit(&path, &report).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json[0]["reasons"][0], "low_overlap");
    }
}
