//! Path arena with a restrictable view

use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Bound, RangeBounds};

use crate::error::{Error, Result};
use crate::path::{NodeRef, Path, PathId, PathType, StartJoin};
use crate::point::{BoundingBox, Point};

/// A set of paths forming one traced structure.
///
/// Paths live in an arena and are referenced by [`PathId`]; start joins
/// point into the same arena. On top of the arena sits a *view*: the subset
/// of paths currently taking part in analyses. Restrictions narrow the view,
/// [`Tree::reset_restrictions`] restores the full arena. Paths themselves are
/// never modified by a restriction.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    label: Option<String>,
    /// All paths ever added (arena pattern)
    paths: Vec<Path>,
    /// Membership of each arena slot in the current view
    active: Vec<bool>,
    revision: u64,
}

// ============================================================================
// Construction
// ============================================================================
impl Tree {
    pub fn new() -> Self {
        Tree::default()
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Builds a tree from paths whose ids are their positions in `paths`.
    ///
    /// Rejects empty paths, joins to missing parents or out-of-range nodes,
    /// and join cycles.
    pub fn from_paths(label: Option<String>, paths: Vec<Path>) -> Result<Self> {
        for (i, path) in paths.iter().enumerate() {
            if path.is_empty() {
                return Err(Error::argument(format!("path {} has no points", PathId(i))));
            }
        }
        for (i, path) in paths.iter().enumerate() {
            if let Some(join) = path.start_join {
                check_join(&paths, PathId(i), join)?;
            }
        }
        let active = vec![true; paths.len()];
        let tree = Tree {
            label,
            paths,
            active,
            revision: 0,
        };
        tree.compute_orders()?;
        Ok(tree)
    }

    /// Adds a path to the arena (and to the current view).
    ///
    /// A start join must reference a path already in the arena, so paths
    /// added this way can never form a cycle.
    pub fn add_path(&mut self, path: Path) -> Result<PathId> {
        if path.is_empty() {
            return Err(Error::argument("a path needs at least one point"));
        }
        let id = PathId(self.paths.len());
        if let Some(join) = path.start_join {
            check_join(&self.paths, id, join)?;
        }
        self.paths.push(path);
        self.active.push(true);
        self.revision += 1;
        Ok(id)
    }

    /// Re-attaches `child` (or detaches it when `join` is `None`).
    /// Fails without modifying the tree if the new join would close a cycle.
    pub fn set_start_join(&mut self, child: PathId, join: Option<StartJoin>) -> Result<()> {
        if child.0 >= self.paths.len() {
            return Err(Error::argument(format!("no path {child} in tree")));
        }
        if let Some(join) = join {
            check_join(&self.paths, child, join)?;
        }
        let previous = std::mem::replace(&mut self.paths[child.0].start_join, join);
        if let Err(e) = self.compute_orders() {
            self.paths[child.0].start_join = previous;
            return Err(e);
        }
        self.revision += 1;
        Ok(())
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    /// Incremented by every mutation of the tree or its view.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

fn check_join(paths: &[Path], child: PathId, join: StartJoin) -> Result<()> {
    if join.parent == child {
        return Err(Error::topology(format!("path {child} joins itself")));
    }
    let parent = paths.get(join.parent.0).ok_or_else(|| {
        Error::topology(format!("path {child} joins missing path {}", join.parent))
    })?;
    if join.index >= parent.len() {
        return Err(Error::topology(format!(
            "path {child} joins node {} of path {}, which has {} nodes",
            join.index,
            join.parent,
            parent.len()
        )));
    }
    Ok(())
}

// ============================================================================
// Accessors (view-aware unless noted)
// ============================================================================
impl Tree {
    /// Looks up a path in the arena, whether or not it is in the view.
    pub fn get(&self, id: PathId) -> Option<&Path> {
        self.paths.get(id.0)
    }

    /// Point of a node, resolved through the arena.
    pub fn node(&self, node: NodeRef) -> Option<&Point> {
        self.get(node.path)?.node(node.index)
    }

    pub fn is_active(&self, id: PathId) -> bool {
        self.active.get(id.0).copied().unwrap_or(false)
    }

    /// Ids of the paths in the view, ascending.
    pub fn ids(&self) -> impl Iterator<Item = PathId> + '_ {
        self.active
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .map(|(i, _)| PathId(i))
    }

    /// Paths in the view, in id order.
    pub fn paths(&self) -> impl Iterator<Item = (PathId, &Path)> + '_ {
        self.ids().map(move |id| (id, &self.paths[id.0]))
    }

    /// Number of paths in the view.
    pub fn len(&self) -> usize {
        self.active.iter().filter(|on| **on).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of paths in the arena.
    pub fn arena_len(&self) -> usize {
        self.paths.len()
    }

    pub fn node_count(&self) -> usize {
        self.paths().map(|(_, p)| p.len()).sum()
    }

    pub fn path_types(&self) -> BTreeSet<PathType> {
        self.paths().map(|(_, p)| p.path_type).collect()
    }

    /// Paths in the view that start on `id`, with the node index they join at.
    pub fn children_of(&self, id: PathId) -> Vec<(PathId, usize)> {
        self.paths()
            .filter_map(|(child, p)| match p.start_join {
                Some(join) if join.parent == id => Some((child, join.index)),
                _ => None,
            })
            .collect()
    }

    /// First nodes of primary soma paths.
    pub fn soma_nodes(&self) -> Vec<Point> {
        self.paths()
            .filter(|(_, p)| p.is_primary() && p.path_type == PathType::Soma)
            .filter_map(|(_, p)| p.first().copied())
            .collect()
    }

    /// First node of the first primary path.
    pub fn root(&self) -> Option<&Point> {
        self.paths().find(|(_, p)| p.is_primary())?.1.first()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::enclosing(self.paths().flat_map(|(_, p)| p.points().iter()))
    }
}

// ============================================================================
// Path order
// ============================================================================
impl Tree {
    /// Hop count along start joins: 1 for a primary path, parent order + 1
    /// otherwise. Computed over the arena, so it does not change with the view.
    pub fn path_order(&self, id: PathId) -> Result<u32> {
        if id.0 >= self.paths.len() {
            return Err(Error::argument(format!("no path {id} in tree")));
        }
        Ok(self.compute_orders()?[id.0])
    }

    /// Orders of every path in the view.
    pub fn path_orders(&self) -> Result<BTreeMap<PathId, u32>> {
        let orders = self.compute_orders()?;
        Ok(self.ids().map(|id| (id, orders[id.0])).collect())
    }

    fn compute_orders(&self) -> Result<Vec<u32>> {
        let n = self.paths.len();
        let mut orders = vec![0u32; n];
        let mut on_chain = vec![false; n];
        let mut chain = Vec::new();

        for start in 0..n {
            if orders[start] != 0 {
                continue;
            }
            chain.clear();
            let mut current = start;
            let base = loop {
                if orders[current] != 0 {
                    break orders[current];
                }
                if on_chain[current] {
                    return Err(Error::topology(format!(
                        "start joins form a cycle through path {}",
                        PathId(current)
                    )));
                }
                on_chain[current] = true;
                chain.push(current);
                match self.paths[current].start_join {
                    Some(join) => current = join.parent.0,
                    None => break 0,
                }
            };
            for (hops, &id) in chain.iter().rev().enumerate() {
                orders[id] = base + hops as u32 + 1;
                on_chain[id] = false;
            }
        }
        Ok(orders)
    }
}

// ============================================================================
// Restrictions
// ============================================================================
impl Tree {
    pub fn is_restricted(&self) -> bool {
        self.active.iter().any(|on| !on)
    }

    /// Brings every arena path back into the view.
    pub fn reset_restrictions(&mut self) {
        self.active.iter_mut().for_each(|on| *on = true);
        self.revision += 1;
    }

    pub fn restrict_to_types(&mut self, types: &[PathType]) {
        self.retain(|_, p| types.contains(&p.path_type));
    }

    pub fn ignore_types(&mut self, types: &[PathType]) {
        self.retain(|_, p| !types.contains(&p.path_type));
    }

    /// Keeps paths whose path order is one of `orders` (each must be ≥ 1).
    pub fn restrict_to_orders(&mut self, orders: &[u32]) -> Result<()> {
        if let Some(bad) = orders.iter().find(|o| **o == 0) {
            return Err(Error::argument(format!("path orders start at 1, got {bad}")));
        }
        let all = self.compute_orders()?;
        self.retain(|id, _| orders.contains(&all[id.0]));
        Ok(())
    }

    /// Keeps paths whose node count lies in `range`; inclusivity follows the
    /// range type (`2..=5`, `2..5`, `..=5`, ...).
    pub fn restrict_to_size(&mut self, range: impl RangeBounds<usize>) {
        self.retain(|_, p| range.contains(&p.len()));
    }

    /// Keeps paths whose length lies in `range`. NaN bounds are rejected.
    pub fn restrict_to_length(&mut self, range: impl RangeBounds<f64>) -> Result<()> {
        for bound in [range.start_bound(), range.end_bound()] {
            if let Bound::Included(v) | Bound::Excluded(v) = bound {
                if v.is_nan() {
                    return Err(Error::argument("length bounds must not be NaN"));
                }
            }
        }
        self.retain(|_, p| range.contains(&p.length()));
        Ok(())
    }

    /// Keeps paths whose name contains `pattern`.
    pub fn restrict_to_name_pattern(&mut self, pattern: &str) {
        self.retain(|_, p| p.name.contains(pattern));
    }

    pub(crate) fn snapshot_view(&self) -> Vec<bool> {
        self.active.clone()
    }

    pub(crate) fn restore_view(&mut self, view: &[bool]) {
        if view.len() == self.active.len() {
            self.active.copy_from_slice(view);
            self.revision += 1;
        }
    }

    fn retain(&mut self, mut keep: impl FnMut(PathId, &Path) -> bool) {
        let mut removed = 0usize;
        for (i, path) in self.paths.iter().enumerate() {
            if self.active[i] && !keep(PathId(i), path) {
                self.active[i] = false;
                removed += 1;
            }
        }
        self.revision += 1;
        tracing::debug!("Restriction removed {} paths, {} remain", removed, self.len());
        if self.is_empty() && !self.paths.is_empty() {
            tracing::warn!("Restriction left no paths in view");
        }
    }
}
