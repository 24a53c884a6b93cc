//! Duplicate check of one new submission against an existing corpus.
//!
//! Each existing record is tested in a fixed priority order and
//! contributes at most one match:
//!
//! 1. identical identity → skipped (a record is never its own duplicate);
//! 2. identical content hash → [`MatchReason::ExactContent`], score 1.0;
//! 3. title similarity ≥ `title_threshold` → [`MatchReason::SimilarTitle`];
//! 4. both bodies at least `min_content_length` characters and content
//!    similarity ≥ `content_threshold` → [`MatchReason::SimilarContent`].
//!
//! A title that narrowly misses its threshold still falls through to the
//! content comparison. Matches are returned by similarity, highest first;
//! equal scores keep corpus order.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::record::SubmissionRecord;
use crate::similarity::similarity;

/// Thresholds for fuzzy matching. Passed explicitly to every check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Minimum title similarity for a [`MatchReason::SimilarTitle`] match.
    pub title_threshold: f64,
    /// Minimum content similarity for a [`MatchReason::SimilarContent`] match.
    pub content_threshold: f64,
    /// Bodies shorter than this many characters are never compared by
    /// content.
    pub min_content_length: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            title_threshold: 0.8,
            content_threshold: 0.6,
            min_content_length: 100,
        }
    }
}

/// Why an existing record was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchReason {
    ExactContent,
    SimilarTitle { score: f64 },
    SimilarContent { score: f64 },
}

impl MatchReason {
    /// The score that triggered this match.
    pub fn score(&self) -> f64 {
        match self {
            MatchReason::ExactContent => 1.0,
            MatchReason::SimilarTitle { score } | MatchReason::SimilarContent { score } => *score,
        }
    }
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchReason::ExactContent => write!(f, "Exact content match"),
            MatchReason::SimilarTitle { score } => {
                write!(f, "Similar title ({:.1}% match)", score * 100.0)
            }
            MatchReason::SimilarContent { score } => {
                write!(f, "Similar content ({:.1}% match)", score * 100.0)
            }
        }
    }
}

/// One flagged existing record. Borrows from the caller's corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateMatch<'a> {
    pub existing: &'a SubmissionRecord,
    pub reason: MatchReason,
    pub similarity: f64,
}

/// Result of [`check_duplicate`].
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateCheck<'a> {
    pub is_duplicate: bool,
    /// Sorted by similarity, highest first; ties keep corpus order.
    pub matches: Vec<DuplicateMatch<'a>>,
}

/// Compare `new` against every record in `existing`.
pub fn check_duplicate<'a>(
    new: &SubmissionRecord,
    existing: &'a [SubmissionRecord],
    config: &DedupConfig,
) -> DuplicateCheck<'a> {
    let mut matches: Vec<DuplicateMatch<'a>> = existing
        .iter()
        .filter_map(|candidate| compare(new, candidate, config))
        .collect();

    // Vec::sort_by is stable, which keeps corpus order for equal scores.
    matches.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });

    DuplicateCheck {
        is_duplicate: !matches.is_empty(),
        matches,
    }
}

fn compare<'a>(
    new: &SubmissionRecord,
    existing: &'a SubmissionRecord,
    config: &DedupConfig,
) -> Option<DuplicateMatch<'a>> {
    if existing.identity() == new.identity() {
        return None;
    }

    let reason = if existing.content_hash() == new.content_hash() {
        MatchReason::ExactContent
    } else {
        let title_score = similarity(new.title(), existing.title());
        if title_score >= config.title_threshold {
            MatchReason::SimilarTitle { score: title_score }
        } else if new.content_len() >= config.min_content_length
            && existing.content_len() >= config.min_content_length
        {
            let content_score = similarity(new.content(), existing.content());
            if content_score >= config.content_threshold {
                MatchReason::SimilarContent {
                    score: content_score,
                }
            } else {
                return None;
            }
        } else {
            return None;
        }
    };

    Some(DuplicateMatch {
        existing,
        similarity: reason.score(),
        reason,
    })
}
