use tree_duo_matching::parse::parse_bracket;
use tree_duo_matching::tree::TreeBuilder;
use tree_duo_matching::{LabeledTree, Mapping, NodeAssignment};

pub fn tree(bracket: &str) -> LabeledTree<String> {
    parse_bracket(bracket).unwrap()
}

pub fn identity(t: &LabeledTree<String>) -> Mapping {
    (0..t.num_nodes()).map(|v| NodeAssignment::new(v, v)).collect()
}

/// A path of `n` nodes under a single label.
pub fn chain(n: usize, label: &str) -> LabeledTree<String> {
    let mut builder = TreeBuilder::new();
    for v in 0..n {
        builder.add_node(v, label.to_string()).unwrap();
        if v > 0 {
            builder.add_edge(v - 1, v);
        }
    }
    builder.build().unwrap()
}

/// A root with `n - 1` direct children, all under a single label.
pub fn star(n: usize, label: &str) -> LabeledTree<String> {
    let mut builder = TreeBuilder::new();
    for v in 0..n {
        builder.add_node(v, label.to_string()).unwrap();
        if v > 0 {
            builder.add_edge(0, v);
        }
    }
    builder.build().unwrap()
}
