//! The exact measure: a global binary program over all label-compatible node
//! pairs, searched to certified optimality unless a time budget cuts it off.

use crate::evaluate::{Mapping, NodeAssignment};
use crate::solver::DuoProgram;
use crate::tree::LabeledTree;
use log::debug;
use std::time::Duration;

/// Computes a mapping maximizing the preserved-duo count. `None` means an
/// unbounded search. The second value is true when the budget expired before
/// optimality was certified; the returned incumbent is still a valid
/// (injective, label-respecting) mapping in that case.
pub fn compute<L: Eq>(
    a: &LabeledTree<L>,
    b: &LabeledTree<L>,
    budget: Option<Duration>,
) -> (Mapping, bool) {
    let resolution = DuoProgram::formulate(a, b).solve(budget);
    if !resolution.certified {
        debug!("duo program hit its time budget, keeping the incumbent");
    }
    let mapping = resolution
        .pairs
        .into_iter()
        .map(|(v, w)| NodeAssignment::new(v, w))
        .collect();
    (mapping, !resolution.certified)
}
