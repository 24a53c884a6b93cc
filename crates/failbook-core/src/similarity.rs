//! Ratcliff/Obershelp similarity ratio.
//!
//! The ratio is `2·M / T`, where `T` is the combined length of both
//! strings and `M` is the total size of the matching blocks found by
//! taking the longest common substring and recursing on the unmatched
//! text to its left and to its right.
//!
//! Longest-match ties resolve to the block starting earliest in the first
//! string, then earliest in the second. That tie-break makes the raw ratio
//! order-dependent for some inputs, so [`similarity`] orders the pair
//! canonically before scoring.

use std::collections::HashMap;

use crate::normalize::normalize;

/// Similarity of two raw texts in `[0.0, 1.0]`, computed on their
/// normalized forms.
///
/// Identical non-empty normalized texts score `1.0`; texts that share no
/// character score `0.0`. Two texts that are both empty after
/// normalization also score `0.0`: there is nothing to compare, so an
/// empty title never counts as evidence of duplication.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);

    if a.is_empty() && b.is_empty() {
        return 0.0;
    }

    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let first: Vec<char> = first.chars().collect();
    let second: Vec<char> = second.chars().collect();

    ratio(&first, &second)
}

/// Raw ratio over already-normalized character sequences, in argument
/// order. Returns `1.0` when both are empty.
pub fn ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = SequenceMatcher::new(a, b).matched_len();
    2.0 * matched as f64 / total as f64
}

/// A maximal common block: `a[a_start..a_start + size] == b[b_start..b_start + size]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchingBlock {
    pub a_start: usize,
    pub b_start: usize,
    pub size: usize,
}

/// Matcher over two character sequences with a position index of `b`.
struct SequenceMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    b_positions: HashMap<char, Vec<usize>>,
}

impl<'a> SequenceMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b_positions: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in b.iter().enumerate() {
            b_positions.entry(*c).or_default().push(j);
        }
        Self { a, b, b_positions }
    }

    /// Sum of all matching block sizes.
    fn matched_len(&self) -> usize {
        self.matching_blocks().iter().map(|m| m.size).sum()
    }

    /// Matching blocks ordered by position.
    fn matching_blocks(&self) -> Vec<MatchingBlock> {
        let mut blocks = Vec::new();
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
            let m = self.longest_match(a_lo, a_hi, b_lo, b_hi);
            if m.size == 0 {
                continue;
            }
            if a_lo < m.a_start && b_lo < m.b_start {
                pending.push((a_lo, m.a_start, b_lo, m.b_start));
            }
            if m.a_start + m.size < a_hi && m.b_start + m.size < b_hi {
                pending.push((m.a_start + m.size, a_hi, m.b_start + m.size, b_hi));
            }
            blocks.push(m);
        }

        blocks.sort_by_key(|m| (m.a_start, m.b_start));
        blocks
    }

    /// Longest common block within `a[a_lo..a_hi]` and `b[b_lo..b_hi]`.
    ///
    /// `prev[j - b_lo]` holds the length of the common run ending at
    /// `a[i - 1]` and `b[j]`; only positions where `b` holds `a[i]` are
    /// visited. The two row buffers are reused across rows, and only the
    /// touched cells are reset.
    fn longest_match(&self, a_lo: usize, a_hi: usize, b_lo: usize, b_hi: usize) -> MatchingBlock {
        let mut best = MatchingBlock {
            a_start: a_lo,
            b_start: b_lo,
            size: 0,
        };
        let width = b_hi.saturating_sub(b_lo);
        let mut prev = vec![0usize; width];
        let mut next = vec![0usize; width];
        let mut prev_touched: Vec<usize> = Vec::new();
        let mut next_touched: Vec<usize> = Vec::new();

        for i in a_lo..a_hi {
            if let Some(positions) = self.b_positions.get(&self.a[i]) {
                for &j in positions {
                    if j < b_lo {
                        continue;
                    }
                    if j >= b_hi {
                        break;
                    }
                    let col = j - b_lo;
                    let k = match col.checked_sub(1) {
                        Some(left) => prev[left] + 1,
                        None => 1,
                    };
                    next[col] = k;
                    next_touched.push(col);
                    if k > best.size {
                        best = MatchingBlock {
                            a_start: i + 1 - k,
                            b_start: j + 1 - k,
                            size: k,
                        };
                    }
                }
            }
            for &col in &prev_touched {
                prev[col] = 0;
            }
            prev_touched.clear();
            std::mem::swap(&mut prev, &mut next);
            std::mem::swap(&mut prev_touched, &mut next_touched);
        }

        best
    }
}

/// Matching blocks between two raw character sequences, in argument order.
pub fn matching_blocks(a: &[char], b: &[char]) -> Vec<MatchingBlock> {
    SequenceMatcher::new(a, b).matching_blocks()
}
