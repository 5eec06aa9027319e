//! Text similarity metrics.
//!
//! Two complementary string-alignment scores are provided:
//! - [`token_sequence_similarity`]: LCS ratio over whitespace tokens, robust to
//!   operand renaming inside otherwise identical instruction streams.
//! - [`levenshtein_similarity`]: normalized edit-distance ratio over raw
//!   characters, sensitive to every textual change.
//!
//! Both return a value in `[0, 1]`, are symmetric, and score `1.0` only for
//! identical inputs. Two empty inputs score `1.0`, one empty input `0.0`.

pub mod edit_distance;
pub mod token_seq;

pub use edit_distance::{indel_distance, levenshtein_similarity};
pub use token_seq::{lcs_length, token_sequence_similarity, tokenize};

use crate::models::MetricBreakdown;

/// Compute both metrics for one pair of texts.
pub fn compare_texts(a: &str, b: &str) -> MetricBreakdown {
    MetricBreakdown {
        token_seq: token_sequence_similarity(a, b),
        levenshtein: levenshtein_similarity(a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "mov a, #55h",
        "mov a, #55h add a, r0",
        "org 0000h ljmp main main: mov p1, #0ffh sjmp main end",
        "0200030203e8",
        "中文 註解 mov",
    ];

    #[test]
    fn test_metrics_bounded_and_symmetric() {
        for &a in SAMPLES {
            for &b in SAMPLES {
                let ab = compare_texts(a, b);
                let ba = compare_texts(b, a);
                assert_eq!(ab, ba, "asymmetric for {:?} / {:?}", a, b);
                assert!((0.0..=1.0).contains(&ab.token_seq));
                assert!((0.0..=1.0).contains(&ab.levenshtein));
            }
        }
    }

    #[test]
    fn test_identity_and_emptiness() {
        for &a in SAMPLES {
            let same = compare_texts(a, a);
            assert_eq!(same.token_seq, 1.0);
            assert_eq!(same.levenshtein, 1.0);

            if !a.is_empty() {
                let empty = compare_texts(a, "");
                assert_eq!(empty.token_seq, 0.0);
                assert_eq!(empty.levenshtein, 0.0);
            }
        }
    }
}
