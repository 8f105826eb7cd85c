use crate::core::{CandidateMatch, SourceId, EXACT_NAME_SCORE, EXACT_SLUG_SCORE};

/// Preferred source order for breaking score ties
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePriority {
    order: Vec<SourceId>,
}

impl SourcePriority {
    pub fn new<I, S>(order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SourceId>,
    {
        Self {
            order: order.into_iter().map(Into::into).collect(),
        }
    }

    /// Position in the list; unlisted sources rank after every listed one
    pub fn rank(&self, source: &SourceId) -> usize {
        self.order
            .iter()
            .position(|s| s == source)
            .unwrap_or(self.order.len())
    }

    pub fn sources(&self) -> &[SourceId] {
        &self.order
    }
}

/// Chosen candidate with its resolved score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection<'a> {
    pub candidate: &'a CandidateMatch,

    /// 999 for exact slug, 998 for exact name, otherwise the overlap score
    pub score: i32,
}

/// Pick the single best candidate.
///
/// An exact slug match anywhere in the set wins, then an exact name match.
/// Otherwise the highest overlap score wins; equal scores go to the source
/// ranked earlier in `priority`, and remaining ties keep the earlier candidate.
pub fn select_best<'a>(
    candidates: &'a [CandidateMatch],
    priority: &SourcePriority,
) -> Option<Selection<'a>> {
    if let Some(candidate) = candidates.iter().find(|c| c.exact_slug) {
        return Some(Selection {
            candidate,
            score: EXACT_SLUG_SCORE,
        });
    }
    if let Some(candidate) = candidates.iter().find(|c| c.exact_name) {
        return Some(Selection {
            candidate,
            score: EXACT_NAME_SCORE,
        });
    }

    let mut best: Option<Selection<'a>> = None;
    for candidate in candidates {
        let score = candidate.overlap_score as i32;
        match best {
            None => best = Some(Selection { candidate, score }),
            Some(current) if score > current.score => {
                best = Some(Selection { candidate, score });
            }
            Some(current)
                if score == current.score
                    && priority.rank(&candidate.exercise.source)
                        < priority.rank(&current.candidate.exercise.source) =>
            {
                best = Some(Selection { candidate, score });
            }
            Some(_) => {}
        }
    }

    best.or_else(|| {
        candidates.first().map(|candidate| Selection {
            candidate,
            score: candidate.overlap_score as i32,
        })
    })
}

/// Several candidates and nothing better than a trivial overlap
pub fn classify_ambiguous(candidates: &[CandidateMatch], best_score: i32) -> bool {
    candidates.len() > 1 && best_score <= 0
}
