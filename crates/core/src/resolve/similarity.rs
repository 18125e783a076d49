//! Gestalt pattern matching (Ratcliff/Obershelp) similarity.
//!
//! The ratio is `2 * M / T`, where `T` is the total character count of both
//! strings and `M` the number of characters in the matching blocks found by
//! recursively taking the longest common run and matching what lies to its
//! left and right. Longest-run ties go to the earliest run in the first
//! string, which makes `M` order dependent for some inputs; the score uses
//! the larger of both directions so it stays symmetric.

#[derive(Clone, Copy, Debug, Default)]
pub struct SimilarityScorer;

impl SimilarityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Similarity in `[0, 1]`. Equal strings score 1.0, strings sharing no character 0.0.
    pub fn score(&self, query: &str, candidate_text: &str) -> f64 {
        let left: Vec<char> = query.chars().collect();
        let right: Vec<char> = candidate_text.chars().collect();
        let total = left.len() + right.len();
        if total == 0 {
            return 1.0;
        }

        let matched =
            matching_characters(&left, &right).max(matching_characters(&right, &left));
        (2 * matched) as f64 / total as f64
    }
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, a_lo, a_hi, b_lo, b_hi);
        if size == 0 {
            continue;
        }

        matched += size;
        if a_lo < i && b_lo < j {
            pending.push((a_lo, i, b_lo, j));
        }
        if i + size < a_hi && j + size < b_hi {
            pending.push((i + size, a_hi, j + size, b_hi));
        }
    }

    matched
}

/// Longest common run in `a[a_lo..a_hi]` and `b[b_lo..b_hi]` as `(start_a, start_b, len)`.
fn longest_match(
    a: &[char],
    b: &[char],
    a_lo: usize,
    a_hi: usize,
    b_lo: usize,
    b_hi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (a_lo, b_lo, 0);
    let width = b_hi - b_lo;
    let mut previous = vec![0_usize; width + 1];
    let mut current = vec![0_usize; width + 1];

    for i in a_lo..a_hi {
        for j in b_lo..b_hi {
            let column = j - b_lo + 1;
            current[column] = if a[i] == b[j] { previous[column - 1] + 1 } else { 0 };

            let run = current[column];
            if run > best_size {
                best_i = i + 1 - run;
                best_j = j + 1 - run;
                best_size = run;
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }

    (best_i, best_j, best_size)
}

#[cfg(test)]
mod tests {
    use super::{longest_match, SimilarityScorer};

    fn score(a: &str, b: &str) -> f64 {
        SimilarityScorer::new().score(a, b)
    }

    fn chars(value: &str) -> Vec<char> {
        value.chars().collect()
    }

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(score("ariel", "ariel"), 1.0);
        assert_eq!(score("", ""), 1.0);
    }

    #[test]
    fn disjoint_strings_score_zero() {
        assert_eq!(score("abc", "xyz"), 0.0);
        assert_eq!(score("", "ariel"), 0.0);
    }

    #[test]
    fn partial_overlap_uses_twice_matches_over_total_length() {
        assert_eq!(score("abcd", "bcde"), 0.75);
        assert_eq!(score("ariel", "ariel smith"), 10.0 / 16.0);
    }

    #[test]
    fn recursion_counts_blocks_on_both_sides_of_the_longest_run() {
        // only "abc" matches; the leftovers "x", "y" and "z" share nothing
        assert_eq!(score("xabcy", "abcz"), 6.0 / 9.0);
        // "ab" then "d" to the right of it
        assert_eq!(score("abxd", "abyd"), 6.0 / 8.0);
    }

    #[test]
    fn score_is_symmetric_and_deterministic() {
        let pairs = [
            ("sam", "sam lee sam.lee"),
            ("abab", "baba"),
            ("tide", "diet"),
            ("ariel", "arielle arielle jones arielle"),
        ];
        for (left, right) in pairs {
            let forward = score(left, right);
            assert_eq!(forward, score(right, left), "{left} vs {right}");
            assert_eq!(forward, score(left, right));
            assert!((0.0..=1.0).contains(&forward));
        }
    }

    #[test]
    fn longest_match_prefers_earliest_run_on_ties() {
        let a = chars("abxab");
        let b = chars("ab");
        assert_eq!(longest_match(&a, &b, 0, a.len(), 0, b.len()), (0, 0, 2));
    }

    #[test]
    fn handles_multibyte_characters_per_char() {
        assert_eq!(score("zoë", "zoë"), 1.0);
        assert_eq!(score("zoë", "zoe"), 4.0 / 6.0);
    }
}
