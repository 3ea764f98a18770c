//! A similarity score for labeled rooted trees based on preserved duos: the
//! parent -> child adjacencies that a label-respecting, partially injective
//! node mapping keeps intact in both trees at once.
//!
//! Two matchers produce such mappings. [`Algorithm::Exact`] searches a global
//! binary program over all label-compatible node pairs to certified
//! optimality, under an optional best-effort time budget. [`Algorithm::Approx`]
//! runs in polynomial time: it seeds four candidate matchings from the
//! depth-parity partitions of a local-match graph, completes each with a
//! residual matching pass, and keeps the best-scoring completion.
//!
//! [`compute_matrix`] drives either matcher over an entire tree collection,
//! producing similarity, runtime and timeout grids.

pub mod parse;
pub mod report;
pub mod tree;

mod approx;
mod evaluate;
mod exact;
mod score_norm;
mod similarity_matrix;
mod solver;

pub use evaluate::{preserved_duos, Mapping, NodeAssignment};
pub use score_norm::{normalized_score, ScoreNorm};
pub use similarity_matrix::{
    compute_matrix, MatrixOptions, SimilarityCell, SimilarityMatrix, SymmetryPolicy,
};
pub use solver::{max_weight_matching, DuoProgram, Resolution};
pub use tree::{LabeledTree, TreeBuilder, TreeError};

use std::fmt;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

/// Matcher strategies; both share the `(tree, tree, budget)` to
/// `(mapping, timed out)` contract.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Algorithm {
    /// Depth-parity seeded heuristic, polynomial in tree size.
    Approx,
    /// Branch-and-bound duo program, optionally time-budgeted.
    Exact,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Approx => f.write_str("approx"),
            Algorithm::Exact => f.write_str("exact"),
        }
    }
}

/// Mapping produced by a matcher, plus whether a time budget cut the search
/// off before optimality was certified.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub mapping: Mapping,
    pub timed_out: bool,
}

/// Runs the chosen matcher. The budget only applies to [`Algorithm::Exact`];
/// the heuristic's runtime is bounded by tree size alone.
pub fn compute_mapping<L: Eq + Hash + Debug>(
    algorithm: Algorithm,
    a: &LabeledTree<L>,
    b: &LabeledTree<L>,
    budget: Option<Duration>,
) -> MatchOutcome {
    match algorithm {
        Algorithm::Approx => MatchOutcome {
            mapping: approx::compute(a, b),
            timed_out: false,
        },
        Algorithm::Exact => {
            let (mapping, timed_out) = exact::compute(a, b, budget);
            MatchOutcome { mapping, timed_out }
        }
    }
}

/// Preserved-duo count of the heuristic matcher.
pub fn similarity_approx<L: Eq + Hash + Debug>(a: &LabeledTree<L>, b: &LabeledTree<L>) -> usize {
    preserved_duos(a, b, &approx::compute(a, b))
}

/// Preserved-duo count of the exact matcher, and whether the budget ran out
/// before the score was certified optimal.
pub fn similarity_exact<L: Eq + Hash + Debug>(
    a: &LabeledTree<L>,
    b: &LabeledTree<L>,
    budget: Option<Duration>,
) -> (usize, bool) {
    let (mapping, timed_out) = exact::compute(a, b, budget);
    (preserved_duos(a, b, &mapping), timed_out)
}
