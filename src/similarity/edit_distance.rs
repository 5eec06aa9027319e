//! Normalized edit-distance ratio.
//!
//! Distances use the indel convention: insertions and deletions cost 1 and a
//! substitution costs 2 (one deletion plus one insertion). Under that weighting
//! `distance = len1 + len2 - 2 * LCS`, where LCS is the longest common
//! character subsequence, so the ratio `(len1 + len2 - distance) / (len1 + len2)`
//! reduces to `2 * LCS / (len1 + len2)`.
//!
//! The character LCS is computed with a bit-parallel recurrence (64 columns per
//! machine word), which keeps whole hex payloads of several kilobytes cheap to
//! compare across every student pair.

use std::collections::HashMap;

const WORD_BITS: usize = 64;

/// Per-character occurrence bitmaps of the pattern string.
struct PatternMasks {
    masks: HashMap<char, Vec<u64>>,
    words: usize,
    len: usize,
}

impl PatternMasks {
    fn new(pattern: &[char]) -> Self {
        let words = pattern.len().div_ceil(WORD_BITS);
        let mut masks: HashMap<char, Vec<u64>> = HashMap::new();
        for (i, &c) in pattern.iter().enumerate() {
            masks.entry(c).or_insert_with(|| vec![0; words])[i / WORD_BITS] |=
                1u64 << (i % WORD_BITS);
        }
        Self {
            masks,
            words,
            len: pattern.len(),
        }
    }
}

/// Longest common subsequence length over characters.
fn lcs_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    // The shorter string becomes the bit pattern.
    let (pattern, text) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let pm = PatternMasks::new(pattern);
    let no_match = vec![0u64; pm.words];

    // A zero bit in `v` marks a pattern position that is part of the LCS.
    let mut v = vec![u64::MAX; pm.words];

    for c in text {
        let mask = pm.masks.get(c).unwrap_or(&no_match);
        let mut carry = false;
        for (word, &m) in v.iter_mut().zip(mask.iter()) {
            let u = *word & m;
            let (sum, c1) = word.overflowing_add(u);
            let (sum, c2) = sum.overflowing_add(carry as u64);
            carry = c1 || c2;
            *word = sum | (*word & !m);
        }
    }

    let tail_bits = pm.len % WORD_BITS;
    v.iter()
        .enumerate()
        .map(|(i, &word)| {
            let valid = if i + 1 == pm.words && tail_bits != 0 {
                (1u64 << tail_bits) - 1
            } else {
                u64::MAX
            };
            (!word & valid).count_ones() as usize
        })
        .sum()
}

/// Edit distance with unit-cost insertion/deletion and substitution cost 2.
pub fn indel_distance(text1: &str, text2: &str) -> usize {
    let a: Vec<char> = text1.chars().collect();
    let b: Vec<char> = text2.chars().collect();
    a.len() + b.len() - 2 * lcs_chars(&a, &b)
}

/// Normalized edit-distance ratio in `[0, 1]`.
///
/// Inputs are compared as given; case and whitespace normalization happen
/// during preprocessing.
pub fn levenshtein_similarity(text1: &str, text2: &str) -> f64 {
    let a: Vec<char> = text1.chars().collect();
    let b: Vec<char> = text2.chars().collect();

    match (a.is_empty(), b.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        (false, false) => {}
    }

    let total = a.len() + b.len();
    let distance = total - 2 * lcs_chars(&a, &b);

    (total - distance) as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference weighted edit distance via the full DP table.
    fn naive_distance(a: &str, b: &str) -> usize {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let mut dp = vec![vec![0usize; b.len() + 1]; a.len() + 1];
        for (i, row) in dp.iter_mut().enumerate() {
            row[0] = i;
        }
        for j in 0..=b.len() {
            dp[0][j] = j;
        }
        for i in 1..=a.len() {
            for j in 1..=b.len() {
                let substitution = if a[i - 1] == b[j - 1] { 0 } else { 2 };
                dp[i][j] = (dp[i - 1][j] + 1)
                    .min(dp[i][j - 1] + 1)
                    .min(dp[i - 1][j - 1] + substitution);
            }
        }
        dp[a.len()][b.len()]
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(levenshtein_similarity("", ""), 1.0);
        assert_eq!(levenshtein_similarity("abc", ""), 0.0);
        assert_eq!(levenshtein_similarity("", "abc"), 0.0);
        assert_eq!(indel_distance("", ""), 0);
        assert_eq!(indel_distance("abc", ""), 3);
    }

    #[test]
    fn test_identical_strings() {
        assert_eq!(levenshtein_similarity("mov a, #55h", "mov a, #55h"), 1.0);
    }

    #[test]
    fn test_substitution_costs_two() {
        // kitten -> sitting: 2 substitutions + 1 insertion
        assert_eq!(indel_distance("kitten", "sitting"), 5);
        let ratio = levenshtein_similarity("kitten", "sitting");
        assert!((ratio - 8.0 / 13.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_char_difference() {
        let ratio = levenshtein_similarity("mov a, #55h", "mov a, #56h");
        assert!(ratio > 0.9 && ratio < 1.0);
    }

    #[test]
    fn test_completely_different() {
        assert_eq!(levenshtein_similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_case_sensitive() {
        assert!(levenshtein_similarity("MOV", "mov") < 1.0);
    }

    #[test]
    fn test_matches_reference_dp_across_word_boundaries() {
        let long_a: String = "0200030203e8".repeat(13);
        let long_b: String = "02000302f3e8".repeat(11) + "75fe00";
        let cases = [
            ("abcdef", "azced"),
            ("mov a, #55h add a, r0", "mov a, #85 add a, r1"),
            (long_a.as_str(), long_b.as_str()),
            (long_a.as_str(), "e8"),
            ("中文註解", "註解中文"),
        ];

        for (a, b) in cases {
            assert_eq!(indel_distance(a, b), naive_distance(a, b), "{} / {}", a, b);
            assert_eq!(indel_distance(b, a), naive_distance(a, b));
        }
    }

    #[test]
    fn test_pattern_exactly_one_word() {
        let a = "0123456789abcdef".repeat(4);
        let b = "0123456789abcdef".repeat(3) + "fedcba9876543210";
        assert_eq!(a.len(), 64);
        assert_eq!(indel_distance(&a, &b), naive_distance(&a, &b));
    }
}
