//! A minimal labeled, rooted tree with a per-node depth computed once at
//! construction.

use petgraph::graph::NodeIndex;
use petgraph::{Directed, Graph as PetGraph};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, VecDeque};
use std::fmt::Debug;
use thiserror::Error;

/// Structural violations detected while building a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node id {0} was added twice")]
    DuplicateNode(usize),
    #[error("edge refers to undeclared node id {0}")]
    UnknownNode(usize),
    #[error("node id {0} has more than one parent")]
    SecondParent(usize),
    #[error("expected exactly one root, found {0}")]
    RootCount(usize),
    #[error("tree contains a cycle or unreachable nodes")]
    Unreachable,
}

/// An immutable rooted tree over dense node indices `0..n`, each node carrying
/// a label of type `L`. Read-only for the lifetime of a matching computation.
#[derive(Debug, Clone)]
pub struct LabeledTree<L> {
    labels: Vec<L>,
    /// Node index type. Our trees never exceed 4 billion nodes.
    parents: Vec<Option<u32>>,
    children: Vec<Vec<u32>>,
    depths: Vec<u32>,
    root: u32,
}

impl<L> LabeledTree<L> {
    pub fn num_nodes(&self) -> usize {
        self.labels.len()
    }

    /// Always `num_nodes() - 1` (the tree invariant).
    pub fn num_edges(&self) -> usize {
        self.labels.len() - 1
    }

    pub fn root(&self) -> usize {
        self.root as usize
    }

    #[inline]
    pub fn label(&self, node_idx: usize) -> &L {
        &self.labels[node_idx]
    }

    #[inline]
    pub fn parent(&self, node_idx: usize) -> Option<usize> {
        self.parents[node_idx].map(|p| p as usize)
    }

    pub fn children(&self, node_idx: usize) -> impl Iterator<Item = usize> + '_ {
        self.children[node_idx].iter().map(|&c| c as usize)
    }

    /// Distance from the root; 0 for the root itself.
    #[inline]
    pub fn depth(&self, node_idx: usize) -> usize {
        self.depths[node_idx] as usize
    }

    /// True iff `parent` -> `child` is a duo (directed edge) of this tree.
    #[inline]
    pub fn has_duo(&self, parent: usize, child: usize) -> bool {
        self.parents[child] == Some(parent as u32)
    }

    /// All duos as (parent, child) pairs, ordered by child index.
    pub fn duos(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.labels.len()).filter_map(move |c| self.parents[c].map(|p| (p as usize, c)))
    }
}

impl<L: Clone + Debug> LabeledTree<L> {
    /// Builds a tree from a directed petgraph graph. The graph must be a
    /// rooted tree: a single node without incoming edges, every other node
    /// with exactly one.
    pub fn from_petgraph(pg: &PetGraph<L, (), Directed>) -> Result<Self, TreeError> {
        let mut builder = TreeBuilder::new();
        for i in pg.node_indices() {
            builder.add_node(i.index(), pg[i].clone())?;
        }
        for edge in pg.raw_edges() {
            builder.add_edge(edge.source().index(), edge.target().index());
        }
        builder.build()
    }

    pub fn to_petgraph(&self) -> PetGraph<L, (), Directed> {
        let mut pg = PetGraph::new();
        for i in 0..self.num_nodes() {
            let idx = pg.add_node(self.labels[i].clone());
            debug_assert_eq!(idx.index(), i);
        }
        for (p, c) in self.duos() {
            pg.add_edge(NodeIndex::new(p), NodeIndex::new(c), ());
        }
        pg
    }
}

/// Accumulates nodes and edges under caller-chosen ids, then validates the
/// tree shape and computes depths.
pub struct TreeBuilder<L> {
    // maps node_id to dense index
    node_map: BTreeMap<usize, usize>,
    labels: Vec<L>,
    // (parent, child) under caller ids; resolved in build()
    edges: Vec<(usize, usize)>,
}

impl<L> TreeBuilder<L> {
    pub fn new() -> TreeBuilder<L> {
        TreeBuilder {
            node_map: BTreeMap::new(),
            labels: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Registers a node, returning its dense index.
    pub fn add_node(&mut self, node_id: usize, label: L) -> Result<usize, TreeError> {
        match self.node_map.entry(node_id) {
            Entry::Vacant(e) => {
                let next_idx = self.labels.len();
                self.labels.push(label);
                e.insert(next_idx);
                Ok(next_idx)
            }
            Entry::Occupied(_) => Err(TreeError::DuplicateNode(node_id)),
        }
    }

    /// Records a parent -> child edge; endpoints are resolved in `build`.
    pub fn add_edge(&mut self, parent_id: usize, child_id: usize) {
        self.edges.push((parent_id, child_id));
    }

    pub fn build(self) -> Result<LabeledTree<L>, TreeError> {
        let n = self.labels.len();
        let mut parents: Vec<Option<u32>> = vec![None; n];
        let mut children: Vec<Vec<u32>> = vec![Vec::new(); n];
        for &(parent_id, child_id) in &self.edges {
            let p = *self
                .node_map
                .get(&parent_id)
                .ok_or(TreeError::UnknownNode(parent_id))?;
            let c = *self
                .node_map
                .get(&child_id)
                .ok_or(TreeError::UnknownNode(child_id))?;
            if parents[c].is_some() {
                return Err(TreeError::SecondParent(child_id));
            }
            parents[c] = Some(p as u32);
            children[p].push(c as u32);
        }

        let roots: Vec<usize> = (0..n).filter(|&v| parents[v].is_none()).collect();
        if roots.len() != 1 {
            return Err(TreeError::RootCount(roots.len()));
        }
        let root = roots[0];

        // Breadth-first depth assignment. Nodes on a cycle keep their parent
        // inside the cycle and are never reached from the root.
        let mut depths = vec![0u32; n];
        let mut reached = 1;
        let mut queue = VecDeque::new();
        queue.push_back(root);
        while let Some(v) = queue.pop_front() {
            for &c in &children[v] {
                depths[c as usize] = depths[v] + 1;
                reached += 1;
                queue.push_back(c as usize);
            }
        }
        if reached != n {
            return Err(TreeError::Unreachable);
        }

        Ok(LabeledTree {
            labels: self.labels,
            parents,
            children,
            depths,
            root: root as u32,
        })
    }
}

impl<L> Default for TreeBuilder<L> {
    fn default() -> Self {
        TreeBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_level() -> LabeledTree<&'static str> {
        // a -> b, a -> c, c -> d
        let mut builder = TreeBuilder::new();
        builder.add_node(0, "a").unwrap();
        builder.add_node(1, "b").unwrap();
        builder.add_node(2, "c").unwrap();
        builder.add_node(3, "d").unwrap();
        builder.add_edge(0, 1);
        builder.add_edge(0, 2);
        builder.add_edge(2, 3);
        builder.build().unwrap()
    }

    #[test]
    fn depths_and_duos() {
        let t = two_level();
        assert_eq!(4, t.num_nodes());
        assert_eq!(3, t.num_edges());
        assert_eq!(0, t.root());
        assert_eq!(vec![0, 1, 1, 2], (0..4).map(|v| t.depth(v)).collect::<Vec<_>>());
        assert!(t.has_duo(0, 2));
        assert!(!t.has_duo(0, 3));
        assert_eq!(vec![(0, 1), (0, 2), (2, 3)], t.duos().collect::<Vec<_>>());
        assert_eq!(Some(2), t.parent(3));
        assert_eq!(None, t.parent(0));
    }

    #[test]
    fn duplicate_node_rejected() {
        let mut builder = TreeBuilder::new();
        builder.add_node(7, "a").unwrap();
        assert_eq!(Err(TreeError::DuplicateNode(7)), builder.add_node(7, "b"));
    }

    #[test]
    fn unknown_edge_endpoint_rejected() {
        let mut builder = TreeBuilder::new();
        builder.add_node(0, "a").unwrap();
        builder.add_edge(0, 5);
        assert_eq!(Err(TreeError::UnknownNode(5)), builder.build().map(|_| ()));
    }

    #[test]
    fn second_parent_rejected() {
        let mut builder = TreeBuilder::new();
        builder.add_node(0, "a").unwrap();
        builder.add_node(1, "b").unwrap();
        builder.add_node(2, "c").unwrap();
        builder.add_edge(0, 2);
        builder.add_edge(1, 2);
        assert_eq!(Err(TreeError::SecondParent(2)), builder.build().map(|_| ()));
    }

    #[test]
    fn forest_rejected() {
        let mut builder = TreeBuilder::new();
        builder.add_node(0, "a").unwrap();
        builder.add_node(1, "b").unwrap();
        assert_eq!(Err(TreeError::RootCount(2)), builder.build().map(|_| ()));
    }

    #[test]
    fn cycle_rejected() {
        let mut builder = TreeBuilder::new();
        builder.add_node(0, "a").unwrap();
        builder.add_node(1, "b").unwrap();
        builder.add_node(2, "c").unwrap();
        builder.add_edge(1, 2);
        builder.add_edge(2, 1);
        assert_eq!(Err(TreeError::Unreachable), builder.build().map(|_| ()));
    }

    #[test]
    fn petgraph_round_trip() {
        let t = two_level();
        let round = LabeledTree::from_petgraph(&t.to_petgraph()).unwrap();
        assert_eq!(t.num_nodes(), round.num_nodes());
        assert_eq!(t.duos().collect::<Vec<_>>(), round.duos().collect::<Vec<_>>());
        for v in 0..t.num_nodes() {
            assert_eq!(t.label(v), round.label(v));
            assert_eq!(t.depth(v), round.depth(v));
        }
    }
}
