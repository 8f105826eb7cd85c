pub mod exercise;
pub mod mapping;

pub use exercise::{slugify, EstimatedSetsReps, ExerciseV1, ExerciseV2, ImageItem, StepItem};
pub use mapping::{
    CandidateMatch, ExerciseRecord, ImageAsset, MappingEntry, SourceId, EXACT_NAME_SCORE,
    EXACT_SLUG_SCORE, NO_MATCH_SCORE,
};
