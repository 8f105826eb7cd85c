use crate::core::{CandidateMatch, ExerciseRecord};
use crate::matching::normalize::{normalize, tokens};

/// Normalized forms of one exercise record
struct RecordLabels {
    slug: String,
    name: String,
}

impl RecordLabels {
    fn of(record: &ExerciseRecord) -> Self {
        Self {
            slug: normalize(record.slug_or_empty()),
            name: normalize(&record.name),
        }
    }
}

/// Equal, or either side contains the other. Empty labels never overlap.
#[inline]
fn labels_overlap(stem: &str, label: &str) -> bool {
    !stem.is_empty()
        && !label.is_empty()
        && (stem == label || stem.contains(label) || label.contains(stem))
}

#[inline]
fn shares_word(stem: &str, label: &str) -> bool {
    let stem_words = tokens(stem);
    tokens(label).iter().any(|w| stem_words.contains(w))
}

/// Match rule over normalized forms: slug overlap, then name overlap,
/// then any word shared between the stem and the name.
fn is_candidate(stem: &str, labels: &RecordLabels) -> bool {
    labels_overlap(stem, &labels.slug)
        || labels_overlap(stem, &labels.name)
        || shares_word(stem, &labels.name)
}

fn overlap(stem: &str, labels: &RecordLabels) -> u32 {
    let combined = format!("{} {}", labels.slug, labels.name);
    let stem_words = tokens(stem);
    tokens(&combined)
        .iter()
        .filter(|w| stem_words.contains(*w))
        .count() as u32
}

fn build_candidate(stem: &str, record: &ExerciseRecord, labels: &RecordLabels) -> CandidateMatch {
    CandidateMatch {
        exercise: record.clone(),
        overlap_score: overlap(stem, labels),
        exact_slug: !labels.slug.is_empty() && labels.slug == stem,
        exact_name: !labels.name.is_empty() && labels.name == stem,
    }
}

/// Word-overlap score between a filename stem and a record's `slug + name`
pub fn score(filename_stem: &str, record: &ExerciseRecord) -> u32 {
    overlap(&normalize(filename_stem), &RecordLabels::of(record))
}

/// Score a record against a stem, including the exact-match flags
pub fn score_candidate(filename_stem: &str, record: &ExerciseRecord) -> CandidateMatch {
    let stem = normalize(filename_stem);
    build_candidate(&stem, record, &RecordLabels::of(record))
}

/// All records that plausibly depict the image, in snapshot order, scored
///
/// A stem that normalizes to the empty string (e.g. `°.png`, `___.jpg`) yields
/// no candidates. This departs from the plain substring rule, under which the
/// empty string is contained in every label and every record would become a
/// candidate with score 0 and an ambiguous entry; such images are reported as
/// unmatched instead.
pub fn find_candidates(filename_stem: &str, exercises: &[ExerciseRecord]) -> Vec<CandidateMatch> {
    let stem = normalize(filename_stem);
    if stem.is_empty() {
        return Vec::new();
    }

    exercises
        .iter()
        .filter_map(|record| {
            let labels = RecordLabels::of(record);
            is_candidate(&stem, &labels).then(|| build_candidate(&stem, record, &labels))
        })
        .collect()
}
