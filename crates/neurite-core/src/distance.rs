//! Geodesic path distance of every node to a root point

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::JoinGraph;
use crate::path::{NodeRef, PathId};
use crate::point::{Point, centroid};
use crate::tree::Tree;

/// Distance travelled along paths from the root to each node of the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceMap {
    pub distances: BTreeMap<PathId, Vec<f64>>,
    /// Lowest mapped distance, or the fixed lower bound. NaN if nothing was mapped.
    pub min: f64,
    /// Highest mapped distance, or the fixed upper bound. NaN if nothing was mapped.
    pub max: f64,
}

impl DistanceMap {
    pub fn get(&self, node: NodeRef) -> Option<f64> {
        self.distances.get(&node.path)?.get(node.index).copied()
    }

    pub fn path(&self, id: PathId) -> Option<&[f64]> {
        self.distances.get(&id).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeRef, f64)> + '_ {
        self.distances.iter().flat_map(|(id, values)| {
            values
                .iter()
                .enumerate()
                .map(move |(i, d)| (NodeRef::new(*id, i), *d))
        })
    }

    /// Number of mapped nodes.
    pub fn len(&self) -> usize {
        self.distances.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Maps path distances from a root point.
///
/// Primary paths are seeded with the straight-line distance from the root to
/// their first node; every other path continues from its parent's distance at
/// the join node, plus the gap between the join node and its own first node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PathDistanceMapper {
    bounds: Option<(f64, f64)>,
}

impl PathDistanceMapper {
    pub fn new() -> Self {
        PathDistanceMapper { bounds: None }
    }

    /// Reports `min`/`max` as given instead of tracking them.
    pub fn with_bounds(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(Error::argument(format!(
                "distance bounds must be finite with min <= max, got [{min}, {max}]"
            )));
        }
        Ok(PathDistanceMapper {
            bounds: Some((min, max)),
        })
    }

    pub fn map(&self, tree: &Tree, root: &Point) -> Result<DistanceMap> {
        if !root.is_finite() {
            return Err(Error::argument(format!("root {root} is not a finite point")));
        }
        let mut map = DistanceMap {
            distances: BTreeMap::new(),
            min: f64::NAN,
            max: f64::NAN,
        };
        if tree.is_empty() {
            self.apply_bounds(&mut map);
            return Ok(map);
        }

        let order = JoinGraph::build(tree).topological_order()?;
        let (primaries, others): (Vec<PathId>, Vec<PathId>) = order
            .into_iter()
            .partition(|id| tree.get(*id).is_some_and(|p| p.is_primary()));
        if primaries.is_empty() {
            return Err(Error::topology(
                "no primary path to seed distances from",
            ));
        }

        // 1st pass: primary paths
        for id in primaries {
            let Some(path) = tree.get(id) else { continue };
            let seed = path.first().map_or(0.0, |p| p.distance_to(root));
            map.distances.insert(id, accumulate(path.points(), seed));
        }

        // 2nd pass: remaining paths, parents first
        for id in others {
            let Some(path) = tree.get(id) else { continue };
            let Some(join) = path.start_join else { continue };
            let parent_distance = map.get(join.node()).ok_or_else(|| {
                Error::topology(format!(
                    "path {id} joins path {}, which is not part of the analysed view",
                    join.parent
                ))
            })?;
            let gap = match (tree.node(join.node()), path.first()) {
                (Some(a), Some(b)) => a.distance_to(b),
                _ => 0.0,
            };
            map.distances
                .insert(id, accumulate(path.points(), parent_distance + gap));
        }

        let (min, max) = map
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, d)| {
                (lo.min(d), hi.max(d))
            });
        map.min = min;
        map.max = max;
        self.apply_bounds(&mut map);
        tracing::debug!("Range of mapped distances: {}-{}", map.min, map.max);
        Ok(map)
    }

    fn apply_bounds(&self, map: &mut DistanceMap) {
        if let Some((min, max)) = self.bounds {
            map.min = min;
            map.max = max;
        }
    }
}

fn accumulate(points: &[Point], seed: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(points.len());
    let mut total = seed;
    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            total += points[i - 1].distance_to(point);
        }
        out.push(total);
    }
    out
}

// ============================================================================
// Root selection
// ============================================================================

/// How to choose the root point for distance mapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootSelection {
    Explicit(Point),
    /// Centroid of the first nodes of primary soma paths.
    SomaCentroid,
    /// Centroid of the first nodes of all primary paths.
    PrimaryCentroid,
    /// Soma centroid, falling back to the primary centroid.
    Auto,
}

impl RootSelection {
    pub fn resolve(&self, tree: &Tree) -> Result<Point> {
        match self {
            RootSelection::Explicit(p) => Ok(*p),
            RootSelection::SomaCentroid => centroid(&tree.soma_nodes())
                .ok_or_else(|| Error::argument("tree has no primary soma paths")),
            RootSelection::PrimaryCentroid => {
                let firsts: Vec<Point> = tree
                    .paths()
                    .filter(|(_, p)| p.is_primary())
                    .filter_map(|(_, p)| p.first().copied())
                    .collect();
                centroid(&firsts).ok_or_else(|| Error::topology("tree has no primary paths"))
            }
            RootSelection::Auto => RootSelection::SomaCentroid.resolve(tree).or_else(|_| {
                tracing::debug!("No soma attribute found... Defaulting to average of all root nodes");
                RootSelection::PrimaryCentroid.resolve(tree)
            }),
        }
    }
}
