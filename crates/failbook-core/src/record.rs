//! Submission records and exact-content hashing.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::normalize::normalize;

/// SHA-256 of the normalized text, as lowercase hex.
///
/// Formatting-only edits (case, punctuation, spacing) keep the hash; any
/// change to the words changes it.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(text).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// One submission as seen by the duplicate checker.
///
/// The hash is computed once at construction and the fields are private,
/// so a record's hash always agrees with its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionRecord {
    identity: String,
    title: String,
    content: String,
    content_hash: String,
}

impl SubmissionRecord {
    pub fn new(
        identity: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let content = content.into();
        let content_hash = content_hash(&content);
        Self {
            identity: identity.into(),
            title: title.into(),
            content,
            content_hash,
        }
    }

    /// Stable handle (usually the canonical file path). Only used for
    /// self-exclusion and reporting.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Content length in characters, as compared against the minimum
    /// length for content similarity.
    pub fn content_len(&self) -> usize {
        self.content.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_lowercase_hex_sha256() {
        // sha256("hello world")
        assert_eq!(
            content_hash("Hello,   World!"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        // sha256("")
        assert_eq!(
            content_hash("?!"),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_ignores_formatting() {
        let a = "## What Failed\n\nThe model OVERFIT after 3 epochs.";
        let b = "what failed the model overfit after 3 epochs";
        assert_ne!(a, b);
        assert_eq!(content_hash(a), content_hash(b));
        assert_eq!(content_hash(a), content_hash(a));
    }

    #[test]
    fn test_hash_changes_with_words() {
        assert_ne!(
            content_hash("the model overfit after 3 epochs"),
            content_hash("the model overfit after 4 epochs")
        );
    }

    #[test]
    fn test_record_hash_independent_of_identity() {
        let a = SubmissionRecord::new("/a.md", "Title A", "Same body.");
        let b = SubmissionRecord::new("/b.md", "Title B", "same   BODY");
        assert_eq!(a.content_hash(), b.content_hash());
        assert_eq!(a.identity(), "/a.md");
    }

    #[test]
    fn test_content_len_counts_chars() {
        let r = SubmissionRecord::new("x", "", "héllo");
        assert_eq!(r.content_len(), 5);
    }
}
