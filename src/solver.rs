//! Combinatorial backends: a maximum-weight bipartite matching built on the
//! Hungarian method, and a branch-and-bound search for the duo program of the
//! exact measure.

use crate::tree::LabeledTree;
use munkres::{solve_assignment, WeightMatrix};
use ndarray::Array2;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// How often the search polls the wall clock, in node expansions.
const DEADLINE_POLL_MASK: u32 = 0x3ff;

/// Best assignment found by a solver run, plus whether it is certified
/// optimal. An uncertified outcome is the regular result of an exhausted time
/// budget, not an error.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub pairs: Vec<(usize, usize)>,
    pub certified: bool,
}

/// Maximum-weight matching on a complete bipartite graph given as a weight
/// matrix (rows = left side, columns = right side).
///
/// The Hungarian method minimizes cost over a square matrix, so the weights
/// are mirrored around their maximum and the short side is padded with
/// zero-profit entries. Assignments of weight zero never improve the
/// objective and are dropped from the result.
pub fn max_weight_matching(weights: &Array2<f32>) -> Vec<(usize, usize)> {
    let (rows, cols) = weights.dim();
    let n = rows.max(cols);
    if n == 0 {
        return Vec::new();
    }
    let max_w = weights.iter().fold(0.0f32, |m, &w| m.max(w));
    let mut costs = WeightMatrix::from_fn(n, |(i, j)| {
        if i < rows && j < cols {
            max_w - weights[(i, j)]
        } else {
            max_w
        }
    });
    let positions = solve_assignment(&mut costs).expect("square cost matrix is solvable");
    positions
        .into_iter()
        .filter(|p| p.row < rows && p.column < cols && weights[(p.row, p.column)] > 0.0)
        .map(|p| (p.row, p.column))
        .collect()
}

/// The exact measure as a binary program: one assignment variable per
/// label-compatible node pair (label-incompatible pairs are never created),
/// one indicator per source-tree duo that can contribute only when both
/// endpoint assignments land on a duo of the target tree, and injectivity on
/// both sides. Objective: number of contributing duos.
///
/// Source nodes are pre-ordered parent-first so the contribution of a duo is
/// known the moment its child end gets assigned.
#[derive(Debug)]
pub struct DuoProgram {
    /// Label-compatible target nodes per source position.
    candidates: Vec<Vec<u32>>,
    /// Order position of the source parent, if any.
    parent_pos: Vec<Option<u32>>,
    /// Parent of each target node.
    target_parent: Vec<Option<u32>>,
    /// Source node per order position.
    source_node: Vec<u32>,
    /// duos_below[k]: source duos whose child end sits at position >= k.
    duos_below: Vec<usize>,
    num_targets: usize,
}

impl DuoProgram {
    pub fn formulate<L: Eq>(a: &LabeledTree<L>, b: &LabeledTree<L>) -> DuoProgram {
        let n = a.num_nodes();

        // parent-first enumeration of the source tree
        let mut source_node = Vec::with_capacity(n);
        let mut pos_of = vec![0u32; n];
        let mut queue = VecDeque::new();
        queue.push_back(a.root());
        while let Some(v) = queue.pop_front() {
            pos_of[v] = source_node.len() as u32;
            source_node.push(v as u32);
            queue.extend(a.children(v));
        }

        let candidates = source_node
            .iter()
            .map(|&v| {
                (0..b.num_nodes())
                    .filter(|&w| b.label(w) == a.label(v as usize))
                    .map(|w| w as u32)
                    .collect()
            })
            .collect();
        let parent_pos: Vec<Option<u32>> = source_node
            .iter()
            .map(|&v| a.parent(v as usize).map(|p| pos_of[p]))
            .collect();
        let target_parent = (0..b.num_nodes())
            .map(|w| b.parent(w).map(|p| p as u32))
            .collect();

        let mut duos_below = vec![0usize; n + 1];
        for k in (0..n).rev() {
            duos_below[k] = duos_below[k + 1] + parent_pos[k].is_some() as usize;
        }

        DuoProgram {
            candidates,
            parent_pos,
            target_parent,
            source_node,
            duos_below,
            num_targets: b.num_nodes(),
        }
    }

    /// Depth-first branch-and-bound. `None` means an unbounded search; with a
    /// budget, the wall clock is polled cooperatively and the best incumbent
    /// is returned uncertified once the deadline passes. The empty assignment
    /// is always feasible, so a result is produced in every case.
    pub fn solve(&self, budget: Option<Duration>) -> Resolution {
        let mut search = Search {
            program: self,
            deadline: budget.map(|b| Instant::now() + b),
            ticks: 0,
            expired: false,
            used: vec![false; self.num_targets],
            chosen: vec![None; self.candidates.len()],
            score: 0,
            best: Vec::new(),
            best_score: 0,
        };
        search.descend(0);
        Resolution {
            pairs: search.best,
            certified: !search.expired,
        }
    }
}

struct Search<'a> {
    program: &'a DuoProgram,
    deadline: Option<Instant>,
    ticks: u32,
    expired: bool,
    /// Target nodes taken by the current prefix.
    used: Vec<bool>,
    /// Chosen target per source position.
    chosen: Vec<Option<u32>>,
    score: usize,
    best: Vec<(usize, usize)>,
    best_score: usize,
}

impl Search<'_> {
    fn out_of_time(&mut self) -> bool {
        if self.expired {
            return true;
        }
        if let Some(deadline) = self.deadline {
            self.ticks = self.ticks.wrapping_add(1);
            if self.ticks & DEADLINE_POLL_MASK == 0 && Instant::now() >= deadline {
                self.expired = true;
            }
        }
        self.expired
    }

    fn descend(&mut self, k: usize) {
        if self.out_of_time() {
            return;
        }
        let program = self.program;
        if k == program.candidates.len() {
            if self.score > self.best_score || (self.best_score == 0 && self.best.is_empty()) {
                self.best_score = self.score;
                self.best = self.collect_pairs();
            }
            return;
        }
        // every undecided duo could still be preserved
        if self.score + program.duos_below[k] <= self.best_score {
            return;
        }

        let parent_target = program.parent_pos[k].and_then(|p| self.chosen[p as usize]);
        // duo-completing targets first, then the remaining candidates
        for pass in 0..2 {
            for &w in &program.candidates[k] {
                let gain = match (parent_target, program.target_parent[w as usize]) {
                    (Some(pt), Some(tp)) => (pt == tp) as usize,
                    _ => 0,
                };
                if (gain == 1) != (pass == 0) || self.used[w as usize] {
                    continue;
                }
                self.used[w as usize] = true;
                self.chosen[k] = Some(w);
                self.score += gain;
                self.descend(k + 1);
                self.score -= gain;
                self.chosen[k] = None;
                self.used[w as usize] = false;
                if self.expired {
                    return;
                }
            }
        }
        // leave the source node unmatched
        self.descend(k + 1);
    }

    fn collect_pairs(&self) -> Vec<(usize, usize)> {
        self.chosen
            .iter()
            .enumerate()
            .filter_map(|(k, w)| w.map(|w| (self.program.source_node[k] as usize, w as usize)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::{preserved_duos, NodeAssignment};
    use crate::tree::TreeBuilder;
    use ndarray::arr2;

    #[test]
    fn matching_picks_heaviest_diagonal() {
        let weights = arr2(&[[3.0, 1.0], [2.0, 4.0]]);
        assert_eq!(vec![(0, 0), (1, 1)], max_weight_matching(&weights));
    }

    #[test]
    fn matching_drops_zero_weight_pairs() {
        let weights = arr2(&[[0.0, 5.0], [0.0, 0.0]]);
        assert_eq!(vec![(0, 1)], max_weight_matching(&weights));
    }

    #[test]
    fn matching_handles_rectangles() {
        let weights = arr2(&[[1.0, 7.0, 2.0]]);
        assert_eq!(vec![(0, 1)], max_weight_matching(&weights));
    }

    #[test]
    fn matching_on_empty_sides() {
        let weights = Array2::<f32>::zeros((0, 3));
        assert!(max_weight_matching(&weights).is_empty());
    }

    fn cherry(root: &'static str, left: &'static str, right: &'static str) -> crate::tree::LabeledTree<&'static str> {
        let mut builder = TreeBuilder::new();
        builder.add_node(0, root).unwrap();
        builder.add_node(1, left).unwrap();
        builder.add_node(2, right).unwrap();
        builder.add_edge(0, 1);
        builder.add_edge(0, 2);
        builder.build().unwrap()
    }

    #[test]
    fn duo_program_certifies_identical_trees() {
        let a = cherry("r", "x", "y");
        let b = cherry("r", "x", "y");
        let resolution = DuoProgram::formulate(&a, &b).solve(None);
        assert!(resolution.certified);
        let mapping: Vec<_> = resolution
            .pairs
            .iter()
            .map(|&(v, w)| NodeAssignment::new(v, w))
            .collect();
        assert_eq!(2, preserved_duos(&a, &b, &mapping));
    }

    #[test]
    fn duo_program_respects_labels() {
        let a = cherry("r", "x", "y");
        let b = cherry("r", "u", "v");
        let resolution = DuoProgram::formulate(&a, &b).solve(None);
        assert!(resolution.certified);
        let mapping: Vec<_> = resolution
            .pairs
            .iter()
            .map(|&(v, w)| NodeAssignment::new(v, w))
            .collect();
        assert_eq!(0, preserved_duos(&a, &b, &mapping));
        for &(v, w) in &resolution.pairs {
            assert_eq!(a.label(v), b.label(w));
        }
    }
}
