use std::time::Instant;

use crate::core::{ImageAsset, MappingEntry, NO_MATCH_SCORE};
use crate::matching::{classify_ambiguous, find_candidates, select_best, SourcePriority};
use crate::sources::Snapshot;

/// Counters for one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchSummary {
    pub processed: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub ambiguous: usize,
    pub exact: usize,
}

/// Entries of one run, in image order
#[derive(Debug, Clone, Default)]
pub struct MatchRun {
    pub entries: Vec<MappingEntry>,
    pub summary: MatchSummary,
}

/// Maps every image of a snapshot onto its best exercise record
#[derive(Debug, Clone, Default)]
pub struct ImageMatcher {
    priority: SourcePriority,
}

impl ImageMatcher {
    pub fn new(priority: SourcePriority) -> Self {
        Self { priority }
    }

    pub fn priority(&self) -> &SourcePriority {
        &self.priority
    }

    /// Match a single image stem against the snapshot's exercises
    pub fn match_image(&self, image: &ImageAsset, snapshot: &Snapshot) -> MappingEntry {
        let filename_stem = image.stem().to_string();
        let candidates = find_candidates(&filename_stem, &snapshot.exercises);

        let (best_match, score) = match select_best(&candidates, &self.priority) {
            Some(selection) => (Some(selection.candidate.clone()), selection.score),
            None => (None, NO_MATCH_SCORE),
        };
        let ambiguous = best_match.is_some() && classify_ambiguous(&candidates, score);

        tracing::debug!(
            "{} -> {} candidates, best {} (score {}){}",
            image.path,
            candidates.len(),
            best_match
                .as_ref()
                .map(|c| c.exercise.display())
                .unwrap_or_else(|| "none".to_string()),
            score,
            if ambiguous { " [ambiguous]" } else { "" }
        );

        MappingEntry {
            image: image.clone(),
            filename_stem,
            candidates,
            best_match,
            score,
            ambiguous,
        }
    }

    /// Full pass over the snapshot
    pub fn run(&self, snapshot: &Snapshot) -> MatchRun {
        let start = Instant::now();

        let entries: Vec<MappingEntry> = snapshot
            .images
            .iter()
            .map(|image| self.match_image(image, snapshot))
            .collect();

        let mut summary = MatchSummary {
            processed: entries.len(),
            ..Default::default()
        };
        for entry in &entries {
            if entry.is_matched() {
                summary.matched += 1;
            } else {
                summary.unmatched += 1;
            }
            if entry.ambiguous {
                summary.ambiguous += 1;
            }
            if entry.best_match.as_ref().is_some_and(|c| c.is_exact_match()) {
                summary.exact += 1;
            }
        }

        tracing::info!(
            "Images processed: {}, matched: {}, unmatched: {}, ambiguous: {}, exact: {} ({:.1}ms)",
            summary.processed,
            summary.matched,
            summary.unmatched,
            summary.ambiguous,
            summary.exact,
            start.elapsed().as_secs_f64() * 1000.0
        );

        MatchRun { entries, summary }
    }
}
