//! Token sequence similarity based on the longest common subsequence.

/// Split text into whitespace-delimited tokens.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Length of the longest common subsequence of two token sequences.
///
/// Classical dynamic program (`dp[i][j] = dp[i-1][j-1] + 1` on a match,
/// `max(dp[i-1][j], dp[i][j-1])` otherwise) evaluated with two rolling rows,
/// so memory stays linear in the shorter sequence.
pub fn lcs_length<T: PartialEq>(tokens1: &[T], tokens2: &[T]) -> usize {
    if tokens1.is_empty() || tokens2.is_empty() {
        return 0;
    }

    let (outer, inner) = if tokens1.len() >= tokens2.len() {
        (tokens1, tokens2)
    } else {
        (tokens2, tokens1)
    };

    let mut prev = vec![0usize; inner.len() + 1];
    let mut curr = vec![0usize; inner.len() + 1];

    for a in outer {
        for (j, b) in inner.iter().enumerate() {
            curr[j + 1] = if a == b {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[inner.len()]
}

/// Similarity = `2 * LCS / (len1 + len2)` over whitespace tokens.
///
/// # Returns
///
/// `1.0` when both texts have no tokens, `0.0` when exactly one has none.
pub fn token_sequence_similarity(text1: &str, text2: &str) -> f64 {
    let tokens1 = tokenize(text1);
    let tokens2 = tokenize(text2);

    match (tokens1.is_empty(), tokens2.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        (false, false) => {}
    }

    let lcs = lcs_length(&tokens1, &tokens2);
    let total = tokens1.len() + tokens2.len();

    (2 * lcs) as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert!(tokenize("").is_empty());
        assert_eq!(tokenize("mov a, #55h"), vec!["mov", "a,", "#55h"]);
        assert_eq!(tokenize("mov   a,\n\t#55h  "), vec!["mov", "a,", "#55h"]);
    }

    #[test]
    fn test_lcs_length_empty() {
        let empty: Vec<&str> = vec![];
        assert_eq!(lcs_length(&empty, &empty), 0);
        assert_eq!(lcs_length(&["a"], &empty), 0);
        assert_eq!(lcs_length(&empty, &["a"]), 0);
    }

    #[test]
    fn test_lcs_length_identical_and_disjoint() {
        let tokens = ["mov", "a", "#55h"];
        assert_eq!(lcs_length(&tokens, &tokens), 3);
        assert_eq!(lcs_length(&tokens, &["clr", "r0", "ret"]), 0);
    }

    #[test]
    fn test_lcs_length_partial_overlap() {
        let seq1 = ["mov", "a,", "#55h", "add", "a,", "r0"];
        let seq2 = ["mov", "a,", "#85", "add", "a,", "r1"];
        assert_eq!(lcs_length(&seq1, &seq2), 4);
    }

    #[test]
    fn test_lcs_length_non_contiguous() {
        assert_eq!(lcs_length(&["a", "x", "b", "y", "c"], &["a", "b", "c"]), 3);
        assert_eq!(lcs_length(&["a", "b", "c"], &["c", "b", "a"]), 1);
    }

    #[test]
    fn test_similarity_worked_example() {
        let score =
            token_sequence_similarity("mov a, #55h add a, r0", "mov a, #85 add a, r1");
        assert!((score - 8.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_similarity_edge_cases() {
        assert_eq!(token_sequence_similarity("", ""), 1.0);
        assert_eq!(token_sequence_similarity("   ", "\n"), 1.0);
        assert_eq!(token_sequence_similarity("mov a", ""), 0.0);
        assert_eq!(token_sequence_similarity("", "mov a"), 0.0);
        assert_eq!(token_sequence_similarity("mov a, #55h", "clr r0"), 0.0);
    }

    #[test]
    fn test_similarity_ignores_whitespace_layout() {
        assert_eq!(
            token_sequence_similarity("mov a, #55h\nadd a, r0", "mov  a,  #55h add a, r0"),
            1.0
        );
    }

    #[test]
    fn test_similarity_reordered_blocks() {
        let original = "mov a, #1 mov b, #2 mul ab ret";
        let reordered = "mov b, #2 mov a, #1 mul ab ret";
        let score = token_sequence_similarity(original, reordered);
        assert!(score > 0.5 && score < 1.0);
    }

    #[test]
    fn test_single_token() {
        assert_eq!(token_sequence_similarity("nop", "nop"), 1.0);
        assert_eq!(token_sequence_similarity("nop", "ret"), 0.0);
    }
}
