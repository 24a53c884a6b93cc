//! Batch duplicate check over several new submissions.
//!
//! Every new input is compared against the same, fixed corpus; new inputs
//! are never compared with each other. Inputs that failed to load are
//! reported as [`BatchOutcome::LoadError`] and take no part in any
//! comparison. Checks run in parallel on the rayon pool and merge by
//! identity.

use rayon::prelude::*;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::dedup::{check_duplicate, DedupConfig, DuplicateMatch};
use crate::record::SubmissionRecord;

/// A submission the loader could not turn into a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load {identity}: {reason}")]
pub struct LoadFailure {
    pub identity: String,
    pub reason: String,
}

impl LoadFailure {
    pub fn new(identity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            reason: reason.into(),
        }
    }
}

/// Per-input result of [`check_batch`].
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome<'a> {
    LoadError(String),
    Unique,
    Duplicate(Vec<DuplicateMatch<'a>>),
}

impl BatchOutcome<'_> {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, BatchOutcome::Duplicate(_))
    }
}

/// Check each new input against `existing`.
///
/// The result is keyed by identity. If the same identity appears more
/// than once in `new_inputs`, the last occurrence wins.
pub fn check_batch<'a>(
    new_inputs: &[Result<SubmissionRecord, LoadFailure>],
    existing: &'a [SubmissionRecord],
    config: &DedupConfig,
) -> BTreeMap<String, BatchOutcome<'a>> {
    let outcomes: Vec<(String, BatchOutcome<'a>)> = new_inputs
        .par_iter()
        .map(|input| match input {
            Ok(record) => {
                let check = check_duplicate(record, existing, config);
                let outcome = if check.is_duplicate {
                    BatchOutcome::Duplicate(check.matches)
                } else {
                    BatchOutcome::Unique
                };
                (record.identity().to_string(), outcome)
            }
            Err(failure) => (
                failure.identity.clone(),
                BatchOutcome::LoadError(failure.reason.clone()),
            ),
        })
        .collect();

    outcomes.into_iter().collect()
}

/// True when any outcome in the batch is a duplicate.
pub fn has_duplicates(outcomes: &BTreeMap<String, BatchOutcome<'_>>) -> bool {
    outcomes.values().any(BatchOutcome::is_duplicate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::MatchReason;

    #[test]
    fn test_empty_batch() {
        let outcomes = check_batch(&[], &[], &DedupConfig::default());
        assert!(outcomes.is_empty());
        assert!(!has_duplicates(&outcomes));
    }

    #[test]
    fn test_new_inputs_not_compared_with_each_other() {
        // Two identical new submissions, neither in the corpus.
        let inputs = vec![
            Ok(SubmissionRecord::new("new-1.md", "Same", "Same body")),
            Ok(SubmissionRecord::new("new-2.md", "Same", "Same body")),
        ];
        let corpus = vec![SubmissionRecord::new("old.md", "Other", "Other body")];
        let outcomes = check_batch(&inputs, &corpus, &DedupConfig::default());
        assert_eq!(outcomes["new-1.md"], BatchOutcome::Unique);
        assert_eq!(outcomes["new-2.md"], BatchOutcome::Unique);
    }

    #[test]
    fn test_load_failure_reported_and_isolated() {
        let inputs = vec![
            Err(LoadFailure::new("broken.md", "invalid front matter")),
            Ok(SubmissionRecord::new("dup.md", "x", "Old body")),
        ];
        let corpus = vec![SubmissionRecord::new("old.md", "y", "old BODY")];
        let outcomes = check_batch(&inputs, &corpus, &DedupConfig::default());

        assert_eq!(
            outcomes["broken.md"],
            BatchOutcome::LoadError("invalid front matter".to_string())
        );
        match &outcomes["dup.md"] {
            BatchOutcome::Duplicate(matches) => {
                assert_eq!(matches.len(), 1);
                assert_eq!(matches[0].existing.identity(), "old.md");
                assert_eq!(matches[0].reason, MatchReason::ExactContent);
            }
            other => panic!("expected duplicate, got {:?}", other),
        }
        assert!(has_duplicates(&outcomes));
    }

    #[test]
    fn test_load_failure_display() {
        let failure = LoadFailure::new("a.md", "unterminated front matter");
        assert_eq!(
            failure.to_string(),
            "failed to load a.md: unterminated front matter"
        );
    }
}
