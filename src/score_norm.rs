use crate::tree::LabeledTree;
use closed01::Closed01;

/// Normalization applied to a raw preserved-duo count.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ScoreNorm {
    /// Report the raw duo count.
    Raw,

    /// Divide by the larger edge count of the two trees.
    MaxEdges,
}

/// Scales a raw duo count into [0, 1] by the larger edge count of the two
/// trees. Two single-node trees have no duos to preserve and score zero.
pub fn normalized_score<L>(raw: usize, a: &LabeledTree<L>, b: &LabeledTree<L>) -> Closed01<f32> {
    let denom = a.num_edges().max(b.num_edges());
    if denom == 0 {
        return Closed01::zero();
    }
    Closed01::new(raw as f32 / denom as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_bracket;

    #[test]
    fn zero_edges_normalize_to_zero() {
        let a = parse_bracket("{a}").unwrap();
        let b = parse_bracket("{a}").unwrap();
        assert_eq!(0.0, normalized_score(0, &a, &b).get());
    }

    #[test]
    fn full_score_normalizes_to_one() {
        let a = parse_bracket("{a{b}{c}}").unwrap();
        assert_eq!(1.0, normalized_score(2, &a, &a).get());
    }
}
