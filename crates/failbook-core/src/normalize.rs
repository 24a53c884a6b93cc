//! Canonical text form shared by hashing and similarity scoring.
//!
//! Two texts that differ only in case, punctuation, or spacing normalize
//! to the same string, so they hash identically and score 1.0 against
//! each other.

/// Normalize text for comparison.
///
/// Lowercases, drops every character that is neither a word character
/// (alphanumeric or `_`) nor whitespace, collapses whitespace runs into a
/// single space, and trims both ends. Punctuation is removed without
/// splitting words: `"fine-tuning"` becomes `"finetuning"`.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut pending_space = false;

    for c in lowered.chars() {
        if c.is_whitespace() {
            pending_space = true;
        } else if is_word_char(c) {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        }
    }

    out
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
