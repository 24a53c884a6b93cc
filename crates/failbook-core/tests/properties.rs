//! Randomized properties of normalization, hashing, and similarity.

use failbook_core::similarity::{matching_blocks, ratio};
use failbook_core::{content_hash, normalize, similarity};
use proptest::prelude::*;
use proptest::test_runner::Config;

/// Rewrites lowercase ASCII text into a noisier form that normalizes the
/// same way: upper case, a heading prefix, punctuation between words, and
/// irregular spacing.
fn reformat(text: &str) -> String {
    let words: Vec<String> = text.split(' ').map(|w| w.to_uppercase()).collect();
    format!("## {}!\n", words.join(" \t-  "))
}

proptest! {
    #![proptest_config(Config::with_cases(128))]

    #[test]
    fn normalize_is_idempotent(text in "\\PC{0,60}") {
        let once = normalize(&text);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn hash_ignores_formatting(text in "[a-z0-9_ ]{0,40}") {
        prop_assert_eq!(content_hash(&reformat(&text)), content_hash(&text));
    }

    #[test]
    fn hash_matches_hash_of_normalized_form(text in "\\PC{0,60}") {
        prop_assert_eq!(content_hash(&normalize(&text)), content_hash(&text));
    }

    #[test]
    fn similarity_is_symmetric_and_bounded(a in "[abcD .-]{0,12}", b in "[abcD .-]{0,12}") {
        let ab = similarity(&a, &b);
        prop_assert_eq!(ab, similarity(&b, &a));
        prop_assert!((0.0..=1.0).contains(&ab), "out of range: {}", ab);
    }

    #[test]
    fn non_empty_text_is_similar_to_itself(a in "[abcD .-]{0,12}") {
        prop_assume!(!normalize(&a).is_empty());
        prop_assert_eq!(similarity(&a, &a), 1.0);
    }

    #[test]
    fn matched_blocks_are_common_and_ordered(a in "[xyzw]{0,15}", b in "[xyzw]{0,15}") {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let blocks = matching_blocks(&a, &b);

        let mut a_end = 0;
        let mut b_end = 0;
        for m in &blocks {
            prop_assert!(m.size > 0);
            prop_assert!(m.a_start >= a_end && m.b_start >= b_end, "blocks overlap");
            prop_assert_eq!(
                &a[m.a_start..m.a_start + m.size],
                &b[m.b_start..m.b_start + m.size]
            );
            a_end = m.a_start + m.size;
            b_end = m.b_start + m.size;
        }

        let matched: usize = blocks.iter().map(|m| m.size).sum();
        if !(a.is_empty() && b.is_empty()) {
            let expected = 2.0 * matched as f64 / (a.len() + b.len()) as f64;
            prop_assert_eq!(ratio(&a, &b), expected);
        }
    }
}
