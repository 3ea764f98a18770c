//! The polynomial-time matcher: a local-match graph over all node pairs,
//! four depth-parity seed matchings, and a completion pass per seed.

use crate::evaluate::{preserved_duos, Mapping, NodeAssignment};
use crate::solver::max_weight_matching;
use crate::tree::LabeledTree;
use ndarray::Array2;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Makes any label match outweigh no match at all in the seed matchings.
const LABEL_MATCH_EPSILON: f32 = 1e-5;
/// Same role in the completion pass; below any structural bonus.
const COMPLETION_EPSILON: f32 = 1e-6;

/// Runs the full seed/complete/select pipeline and returns the best-scoring
/// completed mapping. Runtime is polynomial in tree size; there is no budget.
///
/// The result for (a, b) need not equal the result for (b, a); callers that
/// want a symmetric figure compute both directions and keep the maximum.
pub fn compute<L: Eq + Hash + Debug>(a: &LabeledTree<L>, b: &LabeledTree<L>) -> Mapping {
    let weights = local_match_weights(a, b);
    let mut best: Mapping = Vec::new();
    let mut best_eval = 0;
    for seed in seed_matchings(a, b, &weights) {
        let sol = complete(a, b, seed);
        let eval = preserved_duos(a, b, &sol);
        // ties keep the later candidate
        if eval >= best_eval {
            best_eval = eval;
            best = sol;
        }
    }
    best
}

/// Weights of the local-match graph: for every node pair, the number of duos
/// that mapping the pair could preserve one level down, or zero for unequal
/// labels.
fn local_match_weights<L: Eq + Hash>(a: &LabeledTree<L>, b: &LabeledTree<L>) -> Array2<f32> {
    let counts_a: Vec<_> = (0..a.num_nodes()).map(|v| child_label_counts(a, v)).collect();
    let counts_b: Vec<_> = (0..b.num_nodes()).map(|w| child_label_counts(b, w)).collect();

    let mut weights = Array2::zeros((a.num_nodes(), b.num_nodes()));
    for v in 0..a.num_nodes() {
        for w in 0..b.num_nodes() {
            if a.label(v) == b.label(w) {
                weights[(v, w)] =
                    LABEL_MATCH_EPSILON + shared_child_labels(&counts_a[v], &counts_b[w]) as f32;
            }
        }
    }
    weights
}

fn child_label_counts<L: Eq + Hash>(tree: &LabeledTree<L>, v: usize) -> HashMap<&L, u32> {
    let mut counts = HashMap::new();
    for c in tree.children(v) {
        *counts.entry(tree.label(c)).or_insert(0) += 1;
    }
    counts
}

/// Sum over labels of the smaller child count on either side.
fn shared_child_labels<L: Eq + Hash>(a: &HashMap<&L, u32>, b: &HashMap<&L, u32>) -> u32 {
    a.iter()
        .map(|(lbl, &n)| n.min(b.get(lbl).copied().unwrap_or(0)))
        .sum()
}

/// The four seed matchings of the depth-parity partitions, in enumeration
/// order even/even, even/odd, odd/even, odd/odd.
///
/// A duo links depth d to depth d+1, so each partition biases the seed
/// towards a different depth alignment of the two trees.
fn seed_matchings<L>(
    a: &LabeledTree<L>,
    b: &LabeledTree<L>,
    weights: &Array2<f32>,
) -> [Mapping; 4] {
    let (a_even, a_odd) = split_by_depth_parity(a);
    let (b_even, b_odd) = split_by_depth_parity(b);
    [
        restricted_matching(weights, &a_even, &b_even),
        restricted_matching(weights, &a_even, &b_odd),
        restricted_matching(weights, &a_odd, &b_even),
        restricted_matching(weights, &a_odd, &b_odd),
    ]
}

fn split_by_depth_parity<L>(tree: &LabeledTree<L>) -> (Vec<usize>, Vec<usize>) {
    (0..tree.num_nodes()).partition(|&v| tree.depth(v) % 2 == 0)
}

/// Maximum-weight matching of the local-match graph restricted to one node
/// subset per tree.
fn restricted_matching(weights: &Array2<f32>, left: &[usize], right: &[usize]) -> Mapping {
    let sub = Array2::from_shape_fn((left.len(), right.len()), |(i, j)| {
        weights[(left[i], right[j])]
    });
    max_weight_matching(&sub)
        .into_iter()
        .map(|(i, j)| NodeAssignment::new(left[i], right[j]))
        .collect()
}

/// Extends a seed with a residual matching over the still-unmatched nodes.
/// Pairs whose parents, or whose children, are already matched to each other
/// in the seed attract one another, letting consistent local matches
/// reinforce beyond one level.
fn complete<L: Eq + Hash>(a: &LabeledTree<L>, b: &LabeledTree<L>, seed: Mapping) -> Mapping {
    let mut partner_of_a: Vec<Option<usize>> = vec![None; a.num_nodes()];
    let mut matched_b = vec![false; b.num_nodes()];
    for m in &seed {
        partner_of_a[m.node_a] = Some(m.node_b);
        matched_b[m.node_b] = true;
    }
    let free_a: Vec<usize> = (0..a.num_nodes()).filter(|&v| partner_of_a[v].is_none()).collect();
    let free_b: Vec<usize> = (0..b.num_nodes()).filter(|&w| !matched_b[w]).collect();

    let mut weights = Array2::zeros((free_a.len(), free_b.len()));
    for (i, &v) in free_a.iter().enumerate() {
        for (j, &w) in free_b.iter().enumerate() {
            if a.label(v) != b.label(w) {
                continue;
            }
            let mut score = COMPLETION_EPSILON;
            if let (Some(pv), Some(pw)) = (a.parent(v), b.parent(w)) {
                if partner_of_a[pv] == Some(pw) {
                    score += 1.0;
                }
            }
            for c in a.children(v) {
                if let Some(d) = partner_of_a[c] {
                    if b.parent(d) == Some(w) {
                        score += 1.0;
                    }
                }
            }
            weights[(i, j)] = score;
        }
    }

    let mut sol = seed;
    sol.extend(
        max_weight_matching(&weights)
            .into_iter()
            .map(|(i, j)| NodeAssignment::new(free_a[i], free_b[j])),
    );
    sol
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_bracket;
    use approx::assert_abs_diff_eq;

    #[test]
    fn local_weights_count_shared_child_labels() {
        let a = parse_bracket("{r{b}{b}{c}}").unwrap();
        let b = parse_bracket("{r{b}{c}{c}}").unwrap();
        let weights = local_match_weights(&a, &b);
        // roots share one b-child and one c-child
        assert_abs_diff_eq!(2.0 + LABEL_MATCH_EPSILON, weights[(0, 0)], epsilon = 1e-7);
        // r vs b: label mismatch
        assert_abs_diff_eq!(0.0, weights[(0, 1)]);
        // leaf b vs leaf b: label match, no children
        assert_abs_diff_eq!(LABEL_MATCH_EPSILON, weights[(1, 1)], epsilon = 1e-9);
    }

    #[test]
    fn parity_split_follows_depth() {
        let t = parse_bracket("{a{b{c}}{d}}").unwrap();
        let (even, odd) = split_by_depth_parity(&t);
        assert_eq!(vec![0, 2], even);
        assert_eq!(vec![1, 3], odd);
    }

    #[test]
    fn completion_extends_matched_parents() {
        let a = parse_bracket("{r{x{y}}}").unwrap();
        let b = parse_bracket("{r{x{y}}}").unwrap();
        // seed matches only the roots; completion should pull in x and then
        // leave y for the epsilon tier of the same residual matching
        let seed = vec![NodeAssignment::new(0, 0)];
        let sol = complete(&a, &b, seed);
        assert!(sol.contains(&NodeAssignment::new(1, 1)));
        assert_eq!(3, sol.len());
    }

    #[test]
    fn identical_single_duo_trees_score_one() {
        let a = parse_bracket("{a{b}}").unwrap();
        let b = parse_bracket("{a{b}}").unwrap();
        let sol = compute(&a, &b);
        assert_eq!(1, preserved_duos(&a, &b, &sol));
    }
}
