//! Branch points, tips, primary and terminal paths

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path::{NodeRef, PathId};
use crate::point::{LocationIndex, Point};
use crate::tree::Tree;

/// A located node together with the path that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub path: PathId,
    pub index: usize,
    pub point: Point,
}

impl Node {
    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(self.path, self.index)
    }
}

/// Derives branch points and tips from the start joins of a tree's view.
///
/// Results are deduplicated by location (see [`LocationIndex`]) and listed
/// in path id / node index order. Joins into paths outside the view still
/// resolve their location through the arena.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopologyClassifier {
    epsilon: f64,
}

impl Default for TopologyClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TopologyClassifier {
    /// Classifier matching locations exactly.
    pub fn new() -> Self {
        TopologyClassifier { epsilon: 0.0 }
    }

    /// Classifier treating points within `epsilon` of each other as one location.
    pub fn with_epsilon(epsilon: f64) -> Result<Self> {
        check_epsilon(epsilon)?;
        Ok(TopologyClassifier { epsilon })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Nodes at which some path of the view begins.
    pub fn branch_points(&self, tree: &Tree) -> Vec<Node> {
        let mut index = LocationIndex::new(self.epsilon);
        let mut found = Vec::new();
        for (_, path) in tree.paths() {
            let Some(join) = path.start_join else {
                continue;
            };
            let Some(point) = tree.node(join.node()) else {
                continue;
            };
            if index.insert(*point) {
                found.push(Node {
                    path: join.parent,
                    index: join.index,
                    point: *point,
                });
            }
        }
        found
    }

    /// First and last nodes of every path that are not branch points.
    pub fn tips(&self, tree: &Tree) -> Vec<Node> {
        let forks = self.fork_index(tree);
        let mut seen = LocationIndex::new(self.epsilon);
        let mut found = Vec::new();
        for (id, path) in tree.paths() {
            let ends = [(0, path.first()), (path.last_index(), path.last())];
            for (index, point) in ends {
                let Some(point) = point else {
                    continue;
                };
                if !forks.contains(point) && seen.insert(*point) {
                    found.push(Node {
                        path: id,
                        index,
                        point: *point,
                    });
                }
            }
        }
        found
    }

    /// Paths of the view without a start join.
    pub fn primary_paths(&self, tree: &Tree) -> Vec<PathId> {
        tree.paths()
            .filter(|(_, p)| p.is_primary())
            .map(|(id, _)| id)
            .collect()
    }

    /// Paths whose first or last node is a tip.
    pub fn terminal_paths(&self, tree: &Tree) -> Vec<PathId> {
        let forks = self.fork_index(tree);
        tree.paths()
            .filter(|(_, p)| {
                [p.first(), p.last()]
                    .into_iter()
                    .flatten()
                    .any(|point| !forks.contains(point))
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Summed length of every path in the view.
    pub fn cable_length(&self, tree: &Tree) -> f64 {
        tree.paths().map(|(_, p)| p.length()).sum()
    }

    pub fn primary_length(&self, tree: &Tree) -> f64 {
        self.sum_lengths(tree, &self.primary_paths(tree))
    }

    pub fn terminal_length(&self, tree: &Tree) -> f64 {
        self.sum_lengths(tree, &self.terminal_paths(tree))
    }

    fn sum_lengths(&self, tree: &Tree, ids: &[PathId]) -> f64 {
        ids.iter()
            .filter_map(|id| tree.get(*id))
            .map(|p| p.length())
            .sum()
    }

    fn fork_index(&self, tree: &Tree) -> LocationIndex {
        let mut index = LocationIndex::new(self.epsilon);
        for node in self.branch_points(tree) {
            index.insert(node.point);
        }
        index
    }
}

pub(crate) fn check_epsilon(epsilon: f64) -> Result<()> {
    if epsilon.is_finite() && epsilon >= 0.0 {
        Ok(())
    } else {
        Err(Error::argument(format!(
            "location tolerance must be finite and non-negative, got {epsilon}"
        )))
    }
}
