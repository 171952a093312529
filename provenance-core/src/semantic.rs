//! OCR-vs-metadata similarity diagnostics, attached to both the signature
//! and perceptual document-verification paths.
//!
//! Purely local text comparison; no external services involved.

/// Fraction of OCR text vs. stored metadata similarity below which a
/// signature- or perceptual-path match is flagged for a closer look.
pub const SIMILARITY_FLAG_FLOOR: f64 = 0.8;

fn token_set(text: &str) -> std::collections::HashSet<String> {
    text.split_whitespace()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Jaccard similarity over whitespace-delimited, lowercased tokens.
pub fn jaccard_score(a: &str, b: &str) -> f64 {
    let sa = token_set(a);
    let sb = token_set(b);
    if sa.is_empty() && sb.is_empty() {
        return 1.0;
    }
    if sa.is_empty() || sb.is_empty() {
        return 0.0;
    }
    let inter = sa.intersection(&sb).count();
    let union = sa.union(&sb).count();
    inter as f64 / union as f64
}

/// Ratcliff/Obershelp-style sequence similarity ratio: `2M / T`, where `M`
/// is the length of a longest common (contiguous-run) matching block and
/// `T` is the combined length of both strings.
///
/// This mirrors the shape of Python's `difflib.SequenceMatcher.ratio`
/// closely enough for a diagnostic similarity score; it does not need to
/// reproduce `difflib`'s exact matching-blocks algorithm bit-for-bit.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let matches = longest_common_subsequence_len(&a, &b);
    (2 * matches) as f64 / (a.len() + b.len()) as f64
}

fn longest_common_subsequence_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Combined similarity metric (0..1): average of [`sequence_ratio`] and
/// [`jaccard_score`].
pub fn combined_similarity(a: &str, b: &str) -> f64 {
    (sequence_ratio(a, b) + jaccard_score(a, b)) / 2.0
}

/// Terse diff-like summary of where two strings first diverge, for UI
/// diagnostics. Not a general-purpose diff; just enough context around
/// the first mismatch to explain a low similarity score.
pub fn short_diff_summary(a: &str, b: &str, max_chars: usize) -> String {
    if a == b {
        return "no textual differences detected".to_string();
    }
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let mut i = 0;
    while i < a_chars.len() && i < b_chars.len() && a_chars[i] == b_chars[i] {
        i += 1;
    }
    let start = i.saturating_sub(20);
    let excerpt_a: String = a_chars[start..].iter().take(max_chars).collect();
    let excerpt_b: String = b_chars[start.min(b_chars.len())..].iter().take(max_chars).collect();
    format!("A: {excerpt_a}\nB: {excerpt_b}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jaccard_is_one_for_identical_token_sets() {
        assert_eq!(jaccard_score("alpha beta gamma", "gamma beta alpha"), 1.0);
    }

    #[test]
    fn jaccard_is_zero_when_one_side_is_empty() {
        assert_eq!(jaccard_score("alpha", ""), 0.0);
    }

    #[test]
    fn jaccard_ignores_token_case() {
        assert_eq!(jaccard_score("Jamie Lin", "JAMIE LIN"), 1.0);
    }

    #[test]
    fn sequence_ratio_is_one_for_identical_strings() {
        assert_eq!(sequence_ratio("same text", "same text"), 1.0);
    }

    #[test]
    fn sequence_ratio_is_partial_for_overlapping_strings() {
        let ratio = sequence_ratio("the quick brown fox", "the slow brown fox");
        assert!(ratio > 0.5 && ratio < 1.0, "unexpected ratio: {ratio}");
    }

    #[test]
    fn combined_similarity_flags_dissimilar_text() {
        let score = combined_similarity("Quarterly Report by Jamie Lin", "completely unrelated content here");
        assert!(score < SIMILARITY_FLAG_FLOOR);
    }

    #[test]
    fn short_diff_summary_reports_no_differences_for_equal_strings() {
        assert_eq!(short_diff_summary("a", "a", 200), "no textual differences detected");
    }
}
