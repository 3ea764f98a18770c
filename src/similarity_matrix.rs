//! Pairwise similarity grid over a tree collection.

use crate::evaluate::preserved_duos;
use crate::score_norm::{normalized_score, ScoreNorm};
use crate::tree::LabeledTree;
use crate::{compute_mapping, Algorithm};
use ndarray::Array2;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// How the grid treats the two directions of a tree pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SymmetryPolicy {
    /// Compute the upper triangle only and mirror it into the transpose.
    Mirror,

    /// Compute every cell and reconcile each mirrored pair of cells to their
    /// elementwise maximum.
    BothDirections,
}

impl SymmetryPolicy {
    /// The mirror shortcut is always sound for the exact measure; only the
    /// heuristic can differ between directions.
    pub fn effective(self, algorithm: Algorithm) -> SymmetryPolicy {
        match algorithm {
            Algorithm::Exact => SymmetryPolicy::Mirror,
            Algorithm::Approx => self,
        }
    }
}

/// Score, wall-clock seconds and time-budget flag of one grid cell.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SimilarityCell {
    pub score: f32,
    pub duration: f32,
    pub timed_out: bool,
}

#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    scores: Array2<f32>,
    durations: Array2<f32>,
    timed_out: Array2<bool>,
}

impl SimilarityMatrix {
    pub fn num_trees(&self) -> usize {
        self.scores.nrows()
    }

    pub fn scores(&self) -> &Array2<f32> {
        &self.scores
    }

    pub fn durations(&self) -> &Array2<f32> {
        &self.durations
    }

    pub fn timed_out(&self) -> &Array2<bool> {
        &self.timed_out
    }

    pub fn cell(&self, i: usize, j: usize) -> SimilarityCell {
        SimilarityCell {
            score: self.scores[(i, j)],
            duration: self.durations[(i, j)],
            timed_out: self.timed_out[(i, j)],
        }
    }

    fn set(&mut self, i: usize, j: usize, cell: SimilarityCell) {
        self.scores[(i, j)] = cell.score;
        self.durations[(i, j)] = cell.duration;
        self.timed_out[(i, j)] = cell.timed_out;
    }
}

#[derive(Debug, Clone)]
pub struct MatrixOptions {
    pub algorithm: Algorithm,
    /// Per-cell budget; only the exact matcher honors it.
    pub budget: Option<Duration>,
    pub norm: ScoreNorm,
    pub policy: SymmetryPolicy,
}

/// Fills the N x N grid sequentially, cell by cell, then applies the
/// requested normalization.
pub fn compute_matrix<L: Eq + Hash + Debug>(
    trees: &[LabeledTree<L>],
    options: &MatrixOptions,
) -> SimilarityMatrix {
    let n = trees.len();
    let policy = options.policy.effective(options.algorithm);
    let mut matrix = SimilarityMatrix {
        scores: Array2::zeros((n, n)),
        durations: Array2::zeros((n, n)),
        timed_out: Array2::from_elem((n, n), false),
    };

    for i in 0..n {
        for j in 0..n {
            if i <= j {
                let cell = compute_cell(&trees[i], &trees[j], options);
                matrix.set(i, j, cell);
                if policy == SymmetryPolicy::Mirror {
                    matrix.set(j, i, cell);
                }
            } else if policy == SymmetryPolicy::BothDirections {
                // the transposed cell is already filled; keep the better of
                // the two directions in both cells
                let cell = compute_cell(&trees[i], &trees[j], options);
                if cell.score > matrix.cell(j, i).score {
                    matrix.set(i, j, cell);
                    matrix.set(j, i, cell);
                } else {
                    let mirror = matrix.cell(j, i);
                    matrix.set(i, j, mirror);
                }
            }
        }
    }

    if options.norm == ScoreNorm::MaxEdges {
        for i in 0..n {
            for j in 0..n {
                let raw = matrix.scores[(i, j)] as usize;
                matrix.scores[(i, j)] = normalized_score(raw, &trees[i], &trees[j]).get();
            }
        }
    }
    matrix
}

fn compute_cell<L: Eq + Hash + Debug>(
    a: &LabeledTree<L>,
    b: &LabeledTree<L>,
    options: &MatrixOptions,
) -> SimilarityCell {
    let started = Instant::now();
    let outcome = compute_mapping(options.algorithm, a, b, options.budget);
    if outcome.timed_out {
        return SimilarityCell {
            score: 0.0,
            duration: 0.0,
            timed_out: true,
        };
    }
    SimilarityCell {
        score: preserved_duos(a, b, &outcome.mapping) as f32,
        duration: started.elapsed().as_secs_f32(),
        timed_out: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_always_uses_the_mirror_shortcut() {
        assert_eq!(
            SymmetryPolicy::Mirror,
            SymmetryPolicy::BothDirections.effective(Algorithm::Exact)
        );
        assert_eq!(
            SymmetryPolicy::BothDirections,
            SymmetryPolicy::BothDirections.effective(Algorithm::Approx)
        );
        assert_eq!(
            SymmetryPolicy::Mirror,
            SymmetryPolicy::Mirror.effective(Algorithm::Approx)
        );
    }
}
