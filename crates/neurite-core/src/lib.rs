//! Neurite Core — topology of traced neuronal reconstructions
//!
//! A reconstruction is a [`Tree`] of [`Path`]s: polylines that may start by
//! joining a node of another path. On top of that model this crate derives
//! branch points and tips, Horton–Strahler and path-order statistics, and
//! geodesic distances from a root.

pub mod batch;
pub mod distance;
pub mod error;
pub mod graph;
pub mod path;
pub mod path_order;
pub mod point;
pub mod stats;
pub mod strahler;
pub mod topology;
pub mod tree;


#[cfg(test)]
pub mod test_utils;

pub use batch::analyze_batch;
pub use distance::{DistanceMap, PathDistanceMapper, RootSelection};
pub use error::{Error, Result};
pub use graph::{JoinGraph, NodeGraph};
pub use path::{NodeRef, Path, PathId, PathType, StartJoin};
pub use path_order::{PathOrderAnalysis, PathOrderAnalyzer};
pub use point::{BoundingBox, LocationIndex, Point, centroid};
pub use stats::TreeSummary;
pub use strahler::{Branch, StrahlerAnalysis, StrahlerAnalyzer};
pub use topology::{Node, TopologyClassifier};
pub use tree::Tree;
