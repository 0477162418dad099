//! Horton–Strahler classification
//!
//! Orders are assigned to the nodes of the tree's [`NodeGraph`] in a single
//! post-order walk from the tips to the root:
//!
//! * a node without children has order 1;
//! * a node with one child inherits the child's order;
//! * a node with several children takes the highest child order `m` when
//!   exactly one child has it, and `m + 1` when two or more children tie.
//!
//! A *branch* is a maximal run of same-order nodes. Because a node has at
//! most one child of its own order, branches are simple chains. Paths split
//! by mid-path joins are therefore classified per segment, and for joins at
//! a path's last node the rule reduces to classifying whole paths.

use std::collections::BTreeMap;

use petgraph::graph::NodeIndex;
use petgraph::visit::DfsPostOrder;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::NodeGraph;
use crate::path::{NodeRef, PathId};
use crate::topology::check_epsilon;
use crate::tree::Tree;

/// Maximal run of nodes sharing one Strahler order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub order: u32,
    /// Fork (or merged root) the branch departs from; `None` at the tree root.
    pub origin: Option<NodeRef>,
    /// Nodes of the branch, rootward first.
    pub nodes: Vec<NodeRef>,
    /// Edge lengths along the branch, including the edge from `origin`.
    pub length: f64,
    /// Straight-line distance between the ends over `length`; NaN when the
    /// branch has no length.
    pub contraction: f64,
}

/// Result of a Horton–Strahler analysis. All maps are keyed by order and,
/// for a non-empty tree, hold every order from 1 to the root number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StrahlerAnalysis {
    /// Highest order in the tree; 0 for an empty tree.
    pub root_number: u32,
    pub lengths: BTreeMap<u32, f64>,
    pub branch_counts: BTreeMap<u32, usize>,
    /// Nodes with two or more children, by the order of the node.
    pub branch_point_counts: BTreeMap<u32, usize>,
    /// `branch_counts[k] / branch_counts[k + 1]`, NaN at the root order.
    pub bifurcation_ratios: BTreeMap<u32, f64>,
    /// Order of each path's first node, the highest along the path.
    pub path_orders: BTreeMap<PathId, u32>,
    pub node_orders: BTreeMap<PathId, Vec<u32>>,
    pub branches: BTreeMap<u32, Vec<Branch>>,
}

impl StrahlerAnalysis {
    /// Mean of the defined bifurcation ratios; NaN if there are none.
    pub fn avg_bifurcation_ratio(&self) -> f64 {
        let defined: Vec<f64> = self
            .bifurcation_ratios
            .values()
            .copied()
            .filter(|r| !r.is_nan())
            .collect();
        if defined.is_empty() {
            f64::NAN
        } else {
            defined.iter().sum::<f64>() / defined.len() as f64
        }
    }

    /// Total number of branches across all orders.
    pub fn branch_count(&self) -> usize {
        self.branch_counts.values().sum()
    }

    /// Branches of the root order.
    pub fn primary_branches(&self) -> &[Branch] {
        self.branches
            .get(&self.root_number)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Branches of order 1.
    pub fn terminal_branches(&self) -> &[Branch] {
        self.branches.get(&1).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn node_order(&self, node: NodeRef) -> Option<u32> {
        self.node_orders.get(&node.path)?.get(node.index).copied()
    }
}

/// Assigns Horton–Strahler orders to a tree.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StrahlerAnalyzer {
    epsilon: f64,
}

impl StrahlerAnalyzer {
    pub fn new() -> Self {
        StrahlerAnalyzer { epsilon: 0.0 }
    }

    /// Tolerance for merging primary paths that start at one location.
    pub fn with_epsilon(epsilon: f64) -> Result<Self> {
        check_epsilon(epsilon)?;
        Ok(StrahlerAnalyzer { epsilon })
    }

    /// Classifies the tree's view. Fails with `InvalidTopology` unless the
    /// view forms a single connected tree; an empty view yields an empty
    /// analysis.
    pub fn analyze(&self, tree: &Tree) -> Result<StrahlerAnalysis> {
        tracing::debug!("Retrieving graph...");
        let graph = NodeGraph::build(tree, self.epsilon);
        if graph.is_empty() {
            return Ok(StrahlerAnalysis::default());
        }
        let root = graph.single_root()?;

        tracing::debug!("Assigning order labels...");
        let orders = assign_orders(&graph, root);
        let root_number = orders.iter().copied().max().unwrap_or(0);
        tracing::debug!("Max order: {}", root_number);

        tracing::debug!("Assembling maps...");
        let mut analysis = StrahlerAnalysis {
            root_number,
            ..StrahlerAnalysis::default()
        };
        for k in 1..=root_number {
            analysis.lengths.insert(k, 0.0);
            analysis.branch_counts.insert(k, 0);
            analysis.branch_point_counts.insert(k, 0);
            analysis.branches.insert(k, Vec::new());
        }

        for (_, target, length) in graph.edges() {
            *analysis.lengths.entry(orders[target.index()]).or_default() += length;
        }

        for ix in graph.node_indices() {
            let order = orders[ix.index()];
            if graph.out_degree(ix) > 1 {
                *analysis.branch_point_counts.entry(order).or_default() += 1;
            }
            let is_head = graph
                .parent(ix)
                .is_none_or(|(parent, _)| orders[parent.index()] != order);
            if is_head {
                let branch = trace_branch(tree, &graph, &orders, ix);
                analysis.branches.entry(order).or_default().push(branch);
            }
        }
        for (order, branches) in &analysis.branches {
            analysis.branch_counts.insert(*order, branches.len());
        }

        for k in 1..root_number {
            let ratio = analysis.branch_counts[&k] as f64 / analysis.branch_counts[&(k + 1)] as f64;
            analysis.bifurcation_ratios.insert(k, ratio);
        }
        analysis.bifurcation_ratios.insert(root_number, f64::NAN);

        for ix in graph.node_indices() {
            let node = graph.node(ix);
            let per_path = analysis.node_orders.entry(node.path).or_insert_with(|| {
                vec![0; tree.get(node.path).map_or(0, |p| p.len())]
            });
            per_path[node.index] = orders[ix.index()];
        }
        analysis.path_orders = analysis
            .node_orders
            .iter()
            .map(|(id, orders)| (*id, orders.first().copied().unwrap_or(0)))
            .collect();

        Ok(analysis)
    }
}

/// Post-order walk from `root`; every child is ordered before its parent.
fn assign_orders(graph: &NodeGraph, root: NodeIndex) -> Vec<u32> {
    let mut orders = vec![0u32; graph.node_count()];
    let mut dfs = DfsPostOrder::new(graph.inner(), root);
    while let Some(ix) = dfs.next(graph.inner()) {
        let mut highest = 0;
        let mut ties = 0;
        for child in graph.children(ix) {
            let order = orders[child.index()];
            if order > highest {
                highest = order;
                ties = 1;
            } else if order == highest {
                ties += 1;
            }
        }
        orders[ix.index()] = match ties {
            0 => 1,
            1 => highest,
            _ => highest + 1,
        };
    }
    orders
}

fn trace_branch(tree: &Tree, graph: &NodeGraph, orders: &[u32], head: NodeIndex) -> Branch {
    let order = orders[head.index()];
    let incoming = graph.parent(head);
    let mut length = incoming.map_or(0.0, |(_, w)| w);
    let mut nodes = vec![graph.node(head)];
    let mut current = head;

    while let Some(next) = graph
        .children(current)
        .find(|child| orders[child.index()] == order)
    {
        length += graph.parent(next).map_or(0.0, |(_, w)| w);
        nodes.push(graph.node(next));
        current = next;
    }

    let origin = incoming.map(|(parent, _)| graph.node(parent));
    let start = origin.or(nodes.first().copied()).and_then(|n| tree.node(n));
    let end = nodes.last().and_then(|n| tree.node(*n));
    let contraction = match (start, end) {
        (Some(a), Some(b)) if length > 0.0 => a.distance_to(b) / length,
        _ => f64::NAN,
    };

    Branch {
        order,
        origin,
        nodes,
        length,
        contraction,
    }
}
