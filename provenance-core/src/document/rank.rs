//! The document verifier's acceptance ranking tuple.

use std::cmp::Ordering;

/// `(overlap_score, dist_score, text_rank, text_score)`, compared
/// lexicographically; higher wins. Candidates are sorted by this tuple to
/// find the best and second-best match for the acceptance gate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RankTuple {
    pub overlap_score: f64,
    pub dist_score: f64,
    pub text_rank: u8,
    pub text_score: f64,
}

impl Eq for RankTuple {}

impl PartialOrd for RankTuple {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankTuple {
    fn cmp(&self, other: &Self) -> Ordering {
        self.overlap_score
            .total_cmp(&other.overlap_score)
            .then_with(|| self.dist_score.total_cmp(&other.dist_score))
            .then_with(|| self.text_rank.cmp(&other.text_rank))
            .then_with(|| self.text_score.total_cmp(&other.text_score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_score_dominates_the_ordering() {
        let a = RankTuple { overlap_score: 0.9, dist_score: 0.1, text_rank: 0, text_score: -1.0 };
        let b = RankTuple { overlap_score: 0.95, dist_score: 0.99, text_rank: 2, text_score: 1.0 };
        assert!(b > a, "higher overlap_score must win regardless of other fields");
    }

    #[test]
    fn ties_fall_through_to_dist_score_then_text_rank_then_text_score() {
        let base = RankTuple { overlap_score: 0.8, dist_score: 0.82, text_rank: 1, text_score: 0.0 };
        let better_dist = RankTuple { dist_score: 0.83, ..base };
        assert!(better_dist > base);

        let better_rank = RankTuple { text_rank: 2, ..base };
        assert!(better_rank > base);

        let better_score = RankTuple { text_score: 0.5, ..base };
        assert!(better_score > base);
    }
}
