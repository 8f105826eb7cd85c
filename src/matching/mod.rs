//! Image-to-exercise reconciliation core
//!
//! Leaves first: `normalize` → `candidates` (matching + scoring) →
//! `selector` (best match + ambiguity).

pub mod candidates;
pub mod normalize;
pub mod selector;

pub use candidates::{find_candidates, score, score_candidate};
pub use normalize::{normalize, tokens};
pub use selector::{classify_ambiguous, select_best, Selection, SourcePriority};
