//! # failbook core
//!
//! Pure duplicate-detection logic for the failed-experiments catalog:
//! text normalization, content hashing, similarity scoring, and the
//! pairwise checker that compares new submissions against the corpus.
//!
//! This crate performs no filesystem or network I/O. Callers load
//! submissions, build [`SubmissionRecord`]s, and hand them in; every
//! function here is total over its inputs.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`normalize`] | Canonical text form used for hashing and scoring |
//! | [`similarity`] | Ratcliff/Obershelp similarity ratio |
//! | [`record`] | Submission records and content hashing |
//! | [`dedup`] | Single-record duplicate check |
//! | [`batch`] | Batch check over many new submissions |

pub mod batch;
pub mod dedup;
pub mod normalize;
pub mod record;
pub mod similarity;

pub use batch::{check_batch, has_duplicates, BatchOutcome, LoadFailure};
pub use dedup::{check_duplicate, DedupConfig, DuplicateCheck, DuplicateMatch, MatchReason};
pub use normalize::normalize;
pub use record::{content_hash, SubmissionRecord};
pub use similarity::similarity;
