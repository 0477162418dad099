//! Graph views of a tree, built on petgraph

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::{connected_components, toposort};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::error::{Error, Result};
use crate::path::{NodeRef, PathId};
use crate::point::Point;
use crate::tree::Tree;

// ============================================================================
// Join graph
// ============================================================================

/// Paths of the current view, with an edge from each parent to every path
/// starting on it. Joins to paths outside the view are left out.
pub struct JoinGraph {
    inner: DiGraph<PathId, usize>,
}

impl std::fmt::Debug for JoinGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinGraph")
            .field("path_count", &self.inner.node_count())
            .field("join_count", &self.inner.edge_count())
            .finish()
    }
}

impl JoinGraph {
    pub fn build(tree: &Tree) -> Self {
        let mut inner = DiGraph::with_capacity(tree.len(), tree.len());
        let mut lookup = HashMap::with_capacity(tree.len());
        for id in tree.ids() {
            lookup.insert(id, inner.add_node(id));
        }
        for (id, path) in tree.paths() {
            if let Some(join) = path.start_join {
                if let Some(&parent) = lookup.get(&join.parent) {
                    inner.add_edge(parent, lookup[&id], join.index);
                }
            }
        }
        JoinGraph { inner }
    }

    pub fn path_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn join_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Paths ordered so that every parent precedes its children.
    pub fn topological_order(&self) -> Result<Vec<PathId>> {
        toposort(&self.inner, None)
            .map(|order| order.into_iter().map(|ix| self.inner[ix]).collect())
            .map_err(|cycle| {
                Error::topology(format!(
                    "start joins form a cycle through path {}",
                    self.inner[cycle.node_id()]
                ))
            })
    }

    /// Paths with no parent inside the view.
    pub fn roots(&self) -> Vec<PathId> {
        self.inner
            .node_indices()
            .filter(|&ix| {
                self.inner
                    .neighbors_directed(ix, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|ix| self.inner[ix])
            .collect()
    }
}

// ============================================================================
// Node graph
// ============================================================================

/// Every node of every path in the view, with edges weighted by Euclidean
/// distance: node `i` → `i + 1` along a path, and parent join node → first
/// node of the joining path.
///
/// Primary paths whose first nodes share one location are merged at that
/// location: the first node of the lowest-id primary becomes the parent of
/// the other primaries' first nodes.
pub struct NodeGraph {
    inner: DiGraph<NodeRef, f64>,
    lookup: HashMap<NodeRef, NodeIndex>,
    roots: Vec<NodeIndex>,
}

impl std::fmt::Debug for NodeGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeGraph")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .field("root_count", &self.roots.len())
            .finish()
    }
}

impl NodeGraph {
    /// `epsilon` is the tolerance used to decide whether primary paths share
    /// their first node.
    pub fn build(tree: &Tree, epsilon: f64) -> Self {
        let n = tree.node_count();
        let mut inner = DiGraph::with_capacity(n, n);
        let mut lookup = HashMap::with_capacity(n);

        for (id, path) in tree.paths() {
            let mut previous: Option<(NodeIndex, &Point)> = None;
            for (i, point) in path.points().iter().enumerate() {
                let node = NodeRef::new(id, i);
                let ix = inner.add_node(node);
                lookup.insert(node, ix);
                if let Some((prev_ix, prev_point)) = previous {
                    inner.add_edge(prev_ix, ix, prev_point.distance_to(point));
                }
                previous = Some((ix, point));
            }
        }

        for (id, path) in tree.paths() {
            let Some(join) = path.start_join else {
                continue;
            };
            let Some(&parent_ix) = lookup.get(&join.node()) else {
                continue;
            };
            let gap = match (tree.node(join.node()), path.first()) {
                (Some(a), Some(b)) => a.distance_to(b),
                _ => 0.0,
            };
            inner.add_edge(parent_ix, lookup[&NodeRef::new(id, 0)], gap);
        }

        let mut graph = NodeGraph {
            inner,
            lookup,
            roots: Vec::new(),
        };
        graph.roots = graph.find_roots();
        graph.merge_primary_roots(tree, epsilon);
        graph
    }

    fn find_roots(&self) -> Vec<NodeIndex> {
        self.inner
            .node_indices()
            .filter(|&ix| self.parent(ix).is_none())
            .collect()
    }

    fn merge_primary_roots(&mut self, tree: &Tree, epsilon: f64) {
        if self.roots.len() < 2 {
            return;
        }
        let is_primary_start = |node: NodeRef| {
            node.index == 0 && tree.get(node.path).is_some_and(|p| p.is_primary())
        };
        if !self.roots.iter().all(|&ix| is_primary_start(self.inner[ix])) {
            return;
        }
        let anchor_ix = self.roots[0];
        let Some(anchor) = tree.node(self.inner[anchor_ix]).copied() else {
            return;
        };
        let shared = self.roots[1..].iter().all(|&ix| {
            tree.node(self.inner[ix])
                .is_some_and(|p| p.same_location(&anchor, epsilon))
        });
        if !shared {
            return;
        }
        tracing::debug!("Merging {} primary paths at {}", self.roots.len(), anchor);
        for &ix in &self.roots[1..] {
            let gap = tree
                .node(self.inner[ix])
                .map_or(0.0, |p| p.distance_to(&anchor));
            self.inner.add_edge(anchor_ix, ix, gap);
        }
        self.roots.truncate(1);
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    /// The root of a single connected tree.
    pub fn single_root(&self) -> Result<NodeIndex> {
        match self.roots.as_slice() {
            [root] if connected_components(&self.inner) == 1 => Ok(*root),
            [] => Err(Error::topology("node graph has no root")),
            roots => Err(Error::topology(format!(
                "tree is not a single connected structure ({} roots: {})",
                roots.len(),
                roots
                    .iter()
                    .map(|&ix| {
                        let node = self.inner[ix];
                        format!("{}[{}]", node.path, node.index)
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }

    pub fn node(&self, ix: NodeIndex) -> NodeRef {
        self.inner[ix]
    }

    pub fn index_of(&self, node: NodeRef) -> Option<NodeIndex> {
        self.lookup.get(&node).copied()
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.inner.node_indices()
    }

    pub fn children(&self, ix: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.inner.neighbors_directed(ix, Direction::Outgoing)
    }

    pub fn out_degree(&self, ix: NodeIndex) -> usize {
        self.children(ix).count()
    }

    /// Parent node and the length of the edge leading to `ix`.
    pub fn parent(&self, ix: NodeIndex) -> Option<(NodeIndex, f64)> {
        self.inner
            .edges_directed(ix, Direction::Incoming)
            .next()
            .map(|e| (e.source(), *e.weight()))
    }

    /// `(source, target, length)` for every edge.
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, f64)> + '_ {
        self.inner
            .edge_indices()
            .filter_map(move |e: EdgeIndex| {
                let (a, b) = self.inner.edge_endpoints(e)?;
                Some((a, b, self.inner[e]))
            })
    }

    /// Sum of all edge lengths.
    pub fn cable_length(&self) -> f64 {
        self.edges().map(|(_, _, w)| w).sum()
    }

    pub(crate) fn inner(&self) -> &DiGraph<NodeRef, f64> {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Path;

    fn line(points: &[(f64, f64, f64)]) -> Path {
        Path::new(points.iter().map(|&(x, y, z)| Point::new(x, y, z)).collect()).unwrap()
    }

    #[test]
    fn primaries_sharing_a_root_are_merged() {
        let mut tree = Tree::new();
        tree.add_path(line(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0)])).unwrap();
        tree.add_path(line(&[(0.0, 0.0, 0.0), (-1.0, 0.0, 0.0)])).unwrap();
        let graph = NodeGraph::build(&tree, 0.0);
        let root = graph.single_root().unwrap();
        assert_eq!(graph.node(root), NodeRef::new(PathId(0), 0));
        assert_eq!(graph.out_degree(root), 2);
    }

    #[test]
    fn separate_primaries_stay_disconnected() {
        let mut tree = Tree::new();
        tree.add_path(line(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0)])).unwrap();
        tree.add_path(line(&[(5.0, 0.0, 0.0), (6.0, 0.0, 0.0)])).unwrap();
        let graph = NodeGraph::build(&tree, 0.0);
        assert_eq!(graph.roots().len(), 2);
        assert!(matches!(graph.single_root(), Err(Error::InvalidTopology(_))));

        // ...unless the tolerance is wide enough.
        let graph = NodeGraph::build(&tree, 5.0);
        assert!(graph.single_root().is_ok());
    }

    #[test]
    fn join_graph_orders_parents_first() {
        let mut tree = Tree::new();
        let a = tree.add_path(line(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0)])).unwrap();
        let b = tree
            .add_path(line(&[(1.0, 0.0, 0.0), (2.0, 0.0, 0.0)]).with_start_join(a, 1))
            .unwrap();
        let c = tree
            .add_path(line(&[(2.0, 0.0, 0.0), (3.0, 0.0, 0.0)]).with_start_join(b, 1))
            .unwrap();
        let graph = JoinGraph::build(&tree);
        let order = graph.topological_order().unwrap();
        let pos = |id: PathId| order.iter().position(|x| *x == id).unwrap();
        assert!(pos(a) < pos(b) && pos(b) < pos(c));
        assert_eq!(graph.roots(), vec![a]);
        assert_eq!(graph.join_count(), 2);
    }
}
