//! Scoring of a node mapping by counting preserved duos.

use crate::tree::LabeledTree;
use std::fmt::Debug;

/// One matched node pair: a node of the first tree and its partner in the
/// second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeAssignment {
    pub node_a: usize,
    pub node_b: usize,
}

impl NodeAssignment {
    pub fn new(node_a: usize, node_b: usize) -> NodeAssignment {
        NodeAssignment { node_a, node_b }
    }
}

/// A partial, injective, label-respecting node correspondence between two
/// trees.
pub type Mapping = Vec<NodeAssignment>;

/// Counts the duos preserved by `mapping`: ordered pairs of mapped nodes that
/// form a parent -> child edge in both trees at once. Pure; returns 0 for the
/// empty mapping.
pub fn preserved_duos<L: Eq + Debug>(
    a: &LabeledTree<L>,
    b: &LabeledTree<L>,
    mapping: &[NodeAssignment],
) -> usize {
    for m in mapping {
        debug_assert_eq!(
            a.label(m.node_a),
            b.label(m.node_b),
            "mapping must respect labels"
        );
    }

    let mut count = 0;
    for mi in mapping {
        for mj in mapping {
            if a.has_duo(mi.node_a, mj.node_a) && b.has_duo(mi.node_b, mj.node_b) {
                count += 1;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeBuilder;

    fn path(labels: &[&'static str]) -> LabeledTree<&'static str> {
        let mut builder = TreeBuilder::new();
        for (i, &lbl) in labels.iter().enumerate() {
            builder.add_node(i, lbl).unwrap();
            if i > 0 {
                builder.add_edge(i - 1, i);
            }
        }
        builder.build().unwrap()
    }

    #[test]
    fn identity_preserves_all() {
        let t = path(&["a", "b", "c"]);
        let sol: Mapping = (0..3).map(|v| NodeAssignment::new(v, v)).collect();
        assert_eq!(t.num_edges(), preserved_duos(&t, &t, &sol));
    }

    #[test]
    fn empty_mapping_scores_zero() {
        let t = path(&["a", "b"]);
        assert_eq!(0, preserved_duos(&t, &t, &[]));
    }

    #[test]
    fn shifted_mapping_preserves_nothing() {
        let t = path(&["a", "a", "a"]);
        // 0 -> 1 and 1 -> 0 invert the only adjacency they cover
        let sol = vec![NodeAssignment::new(0, 1), NodeAssignment::new(1, 0)];
        assert_eq!(0, preserved_duos(&t, &t, &sol));
    }
}
