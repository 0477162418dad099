//! Traced polylines and their join references

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::point::Point;

/// Stable identifier of a path inside its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathId(pub usize);

impl std::fmt::Display for PathId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single node of a tree: `index`-th point of path `path`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub path: PathId,
    pub index: usize,
}

impl NodeRef {
    pub const fn new(path: PathId, index: usize) -> Self {
        NodeRef { path, index }
    }
}

/// Semantic tag of a path. Does not affect topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PathType {
    #[default]
    Undefined,
    Soma,
    Axon,
    Dendrite,
    ApicalDendrite,
    Custom,
}

impl PathType {
    pub const ALL: [PathType; 6] = [
        PathType::Undefined,
        PathType::Soma,
        PathType::Axon,
        PathType::Dendrite,
        PathType::ApicalDendrite,
        PathType::Custom,
    ];

    /// Structure identifier used by SWC files.
    pub fn swc_code(self) -> u8 {
        match self {
            PathType::Undefined => 0,
            PathType::Soma => 1,
            PathType::Axon => 2,
            PathType::Dendrite => 3,
            PathType::ApicalDendrite => 4,
            PathType::Custom => 7,
        }
    }

    pub fn from_swc_code(code: u8) -> Option<Self> {
        PathType::ALL.into_iter().find(|t| t.swc_code() == code)
    }

    pub fn label(self) -> &'static str {
        match self {
            PathType::Undefined => "undefined",
            PathType::Soma => "soma",
            PathType::Axon => "axon",
            PathType::Dendrite => "(basal) dendrite",
            PathType::ApicalDendrite => "apical dendrite",
            PathType::Custom => "custom",
        }
    }
}

impl std::str::FromStr for PathType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let norm = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match norm.as_str() {
            "undefined" | "0" => Ok(PathType::Undefined),
            "soma" | "1" => Ok(PathType::Soma),
            "axon" | "2" => Ok(PathType::Axon),
            "dendrite" | "basal_dendrite" | "3" => Ok(PathType::Dendrite),
            "apical_dendrite" | "apical" | "4" => Ok(PathType::ApicalDendrite),
            "custom" | "7" => Ok(PathType::Custom),
            _ => Err(Error::argument(format!("unknown path type '{s}'"))),
        }
    }
}

/// Where a path begins: node `index` of path `parent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StartJoin {
    pub parent: PathId,
    pub index: usize,
}

impl StartJoin {
    pub const fn new(parent: PathId, index: usize) -> Self {
        StartJoin { parent, index }
    }

    pub fn node(&self) -> NodeRef {
        NodeRef::new(self.parent, self.index)
    }
}

/// An ordered polyline of at least one point.
///
/// A path without a start join is *primary*: it is attached directly to the
/// root of its tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub path_type: PathType,
    points: Vec<Point>,
    #[serde(default)]
    pub start_join: Option<StartJoin>,
}

impl Path {
    /// Creates a primary, untyped path. Fails if `points` is empty.
    pub fn new(points: Vec<Point>) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::argument("a path needs at least one point"));
        }
        Ok(Path {
            name: String::new(),
            path_type: PathType::Undefined,
            points,
            start_join: None,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_type(mut self, path_type: PathType) -> Self {
        self.path_type = path_type;
        self
    }

    pub fn with_start_join(mut self, parent: PathId, index: usize) -> Self {
        self.start_join = Some(StartJoin::new(parent, index));
        self
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn node(&self, index: usize) -> Option<&Point> {
        self.points.get(index)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed path; present for deserialized input
    /// that has not been validated yet.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Point> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Point> {
        self.points.last()
    }

    pub fn last_index(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn is_primary(&self) -> bool {
        self.start_join.is_none()
    }

    /// Sum of distances between consecutive nodes.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance_to(&w[1]))
            .sum()
    }

    /// Ratio between the straight-line distance of the end points and the
    /// path length. NaN for zero-length paths.
    pub fn contraction(&self) -> f64 {
        let length = self.length();
        match (self.first(), self.last()) {
            (Some(a), Some(b)) if length > 0.0 => a.distance_to(b) / length,
            _ => f64::NAN,
        }
    }

    /// Mean of the known node radii, if any node has one.
    pub fn mean_radius(&self) -> Option<f64> {
        let radii: Vec<f64> = self.points.iter().filter_map(|p| p.radius).collect();
        if radii.is_empty() {
            None
        } else {
            Some(radii.iter().sum::<f64>() / radii.len() as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_is_rejected() {
        assert!(matches!(Path::new(vec![]), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn length_and_contraction() {
        let path = Path::new(vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(3.0, 4.0, 0.0),
            Point::new(6.0, 0.0, 0.0),
        ])
        .unwrap();
        assert_eq!(path.length(), 10.0);
        assert!((path.contraction() - 0.6).abs() < 1e-12);

        let dot = Path::new(vec![Point::new(1.0, 1.0, 1.0)]).unwrap();
        assert_eq!(dot.length(), 0.0);
        assert!(dot.contraction().is_nan());
    }

    #[test]
    fn path_type_codes_round_trip() {
        for t in PathType::ALL {
            assert_eq!(PathType::from_swc_code(t.swc_code()), Some(t));
        }
        assert_eq!(PathType::from_swc_code(5), None);
        assert_eq!("Apical-Dendrite".parse::<PathType>().unwrap(), PathType::ApicalDendrite);
        assert!("dendrites?".parse::<PathType>().is_err());
    }

    #[test]
    fn mean_radius_ignores_unknown_radii() {
        let path = Path::new(vec![
            Point::new(0.0, 0.0, 0.0).with_radius(1.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(2.0, 0.0, 0.0).with_radius(3.0),
        ])
        .unwrap();
        assert_eq!(path.mean_radius(), Some(2.0));
    }
}
