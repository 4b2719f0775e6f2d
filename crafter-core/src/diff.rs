//! Line-level diff engine.
//!
//! Classifies every line of a *modified* document as changed or unchanged relative
//! to an *original* document by computing a longest common subsequence over the two
//! line sequences. Lines are compared with exact string equality (no trimming, no
//! whitespace normalisation), so an indentation-only edit counts as a change.
//!
//! The DP table is O(m·n) in both time and space. That is fine for editor-sized
//! buffers (a few thousand lines); no windowing is attempted.

use std::collections::BTreeSet;

/// An ordered sequence of lines in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineSequence(Vec<String>);

impl LineSequence {
    /// Splits `text` into lines.
    ///
    /// Follows `str::lines` semantics: `\n` and `\r\n` both terminate a line, a
    /// trailing line break does not produce an extra empty line, and the empty string
    /// yields an empty sequence.
    pub fn from_text(text: &str) -> Self {
        Self(text.lines().map(str::to_owned).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for LineSequence {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Changed-line classification for a modified sequence of length `len`.
///
/// Only the changed indices are stored; every other index in `0..len` is unchanged,
/// so each line is classified exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    changed: BTreeSet<usize>,
    len: usize,
}

impl DiffResult {
    /// Indices of changed lines, ascending.
    pub fn changed(&self) -> &BTreeSet<usize> {
        &self.changed
    }

    /// Indices of unchanged lines, ascending.
    pub fn unchanged(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(|i| !self.changed.contains(i))
    }

    pub fn is_changed(&self, index: usize) -> bool {
        self.changed.contains(&index)
    }

    /// Length of the modified sequence this result classifies.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` when no line of the modified sequence changed.
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }
}

/// Returns the lines of `modified` that are not part of an LCS with `original`.
///
/// The table is filled from the bottom-right corner and walked forward from `(0, 0)`.
/// On equal sub-solutions the walk advances through `original` first, which treats the
/// original line as deleted and leaves the competing modified line to be marked
/// changed. That tie-break is load-bearing for output parity and must not be flipped.
pub fn changed_lines<A, B>(original: &[A], modified: &[B]) -> DiffResult
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let m = original.len();
    let n = modified.len();

    // dp[i][j] = LCS length of original[i..] and modified[j..]
    let mut dp = vec![vec![0usize; n + 1]; m + 1];
    for i in (0..m).rev() {
        for j in (0..n).rev() {
            dp[i][j] = if original[i].as_ref() == modified[j].as_ref() {
                dp[i + 1][j + 1] + 1
            } else {
                dp[i + 1][j].max(dp[i][j + 1])
            };
        }
    }

    let mut unchanged = vec![false; n];
    let (mut i, mut j) = (0, 0);
    while i < m && j < n {
        if original[i].as_ref() == modified[j].as_ref() {
            unchanged[j] = true;
            i += 1;
            j += 1;
        } else if dp[i + 1][j] >= dp[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }

    let changed = unchanged
        .iter()
        .enumerate()
        .filter_map(|(idx, &same)| (!same).then_some(idx))
        .collect();

    DiffResult { changed, len: n }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed(original: &[&str], modified: &[&str]) -> Vec<usize> {
        changed_lines(original, modified).changed().iter().copied().collect()
    }

    #[test]
    fn identical_sequences_have_no_changes() {
        let lines = ["import pygame", "", "pygame.init()"];
        assert!(changed_lines(&lines, &lines).is_empty());
    }

    #[test]
    fn single_line_substitution() {
        assert_eq!(changed(&["a", "b", "c"], &["a", "x", "c"]), vec![1]);
    }

    #[test]
    fn empty_original_marks_everything() {
        assert_eq!(changed(&[], &["a", "b"]), vec![0, 1]);
    }

    #[test]
    fn empty_modified_is_empty() {
        let result = changed_lines(&["a", "b"], &[] as &[&str]);
        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
    }

    #[test]
    fn disjoint_sequences_mark_all_modified_lines() {
        assert_eq!(changed(&["a", "b"], &["x", "y", "z"]), vec![0, 1, 2]);
    }

    #[test]
    fn insertion_in_the_middle() {
        assert_eq!(changed(&["a", "c"], &["a", "b", "c"]), vec![1]);
    }

    #[test]
    fn deletion_marks_nothing() {
        assert_eq!(changed(&["a", "b", "c"], &["a", "c"]), Vec::<usize>::new());
    }

    #[test]
    fn tie_break_prefers_advancing_original() {
        // Both "a" and "b" are LCS candidates of length 1. Skipping the original's
        // leading "b" on the tie lets "a" match, so the trailing "b" is changed.
        assert_eq!(changed(&["b", "a"], &["a", "b"]), vec![1]);
    }

    #[test]
    fn whitespace_is_significant() {
        assert_eq!(changed(&["    x = 1"], &["  x = 1"]), vec![0]);
    }

    #[test]
    fn every_index_is_classified_once() {
        let result = changed_lines(&["a", "b", "c", "d"], &["b", "q", "d", "e"]);
        let unchanged: Vec<usize> = result.unchanged().collect();
        assert_eq!(unchanged, vec![0, 2]);
        assert_eq!(result.changed().len() + unchanged.len(), result.len());
        assert!(unchanged.iter().all(|i| !result.is_changed(*i)));
    }

    #[test]
    fn text_splitting_ignores_trailing_newline() {
        let seq = LineSequence::from_text("a\r\nb\n");
        assert_eq!(seq.as_slice(), &["a".to_owned(), "b".to_owned()]);
        assert!(LineSequence::from_text("").is_empty());
    }
}
