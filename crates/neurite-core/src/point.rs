//! Geometry primitives: points, location matching, bounding boxes

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// An immutable 3D node of a traced path, with an optional radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

impl Point {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Point {
            x,
            y,
            z,
            radius: None,
        }
    }

    pub const fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    /// Euclidean distance to `other`, ignoring radii.
    pub fn distance_to(&self, other: &Point) -> f64 {
        self.distance_squared_to(other).sqrt()
    }

    pub fn distance_squared_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Whether both points occupy the same location.
    ///
    /// With `epsilon == 0.0` coordinates must match exactly; otherwise the
    /// points must lie within `epsilon` of each other.
    pub fn same_location(&self, other: &Point, epsilon: f64) -> bool {
        if epsilon == 0.0 {
            self.x == other.x && self.y == other.y && self.z == other.z
        } else {
            self.distance_squared_to(other) <= epsilon * epsilon
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Mean location of `points`, or `None` if there are none.
pub fn centroid<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Point> {
    let (mut sx, mut sy, mut sz, mut n) = (0.0, 0.0, 0.0, 0usize);
    for p in points {
        sx += p.x;
        sy += p.y;
        sz += p.z;
        n += 1;
    }
    if n == 0 {
        return None;
    }
    let n = n as f64;
    Some(Point::new(sx / n, sy / n, sz / n))
}

// ============================================================================
// Location index
// ============================================================================

type CellKey = (i64, i64, i64);

/// Spatial hash deduplicating points by location.
///
/// In exact mode (`epsilon == 0.0`) points are keyed by their coordinate bit
/// patterns, with `-0.0` folded onto `0.0`. In tolerant mode points are
/// bucketed into cubic cells of side `epsilon`, so any match lies in one of
/// the 27 cells around a query.
#[derive(Debug, Clone)]
pub struct LocationIndex {
    epsilon: f64,
    cells: HashMap<CellKey, Vec<usize>>,
    points: Vec<Point>,
}

impl LocationIndex {
    /// `epsilon` must be finite and non-negative; callers validate it.
    pub fn new(epsilon: f64) -> Self {
        LocationIndex {
            epsilon,
            cells: HashMap::new(),
            points: Vec::new(),
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Position (insertion order) of a stored point at the same location.
    pub fn find(&self, point: &Point) -> Option<usize> {
        let (cx, cy, cz) = self.cell_of(point);
        if self.epsilon == 0.0 {
            return self.find_in_cell(&(cx, cy, cz), point);
        }
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    // Cell keys saturate for coordinates far beyond `epsilon`.
                    let key = (cx.saturating_add(dx), cy.saturating_add(dy), cz.saturating_add(dz));
                    if let Some(found) = self.find_in_cell(&key, point) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }

    pub fn contains(&self, point: &Point) -> bool {
        self.find(point).is_some()
    }

    /// Stores `point` unless a point at the same location is already present.
    /// Returns whether it was inserted.
    pub fn insert(&mut self, point: Point) -> bool {
        if self.contains(&point) {
            return false;
        }
        let key = self.cell_of(&point);
        self.cells.entry(key).or_default().push(self.points.len());
        self.points.push(point);
        true
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn find_in_cell(&self, key: &CellKey, point: &Point) -> Option<usize> {
        self.cells.get(key)?.iter().copied().find(|&i| {
            self.points[i].same_location(point, self.epsilon)
        })
    }

    fn cell_of(&self, p: &Point) -> CellKey {
        if self.epsilon == 0.0 {
            (bit_key(p.x), bit_key(p.y), bit_key(p.z))
        } else {
            (
                (p.x / self.epsilon).floor() as i64,
                (p.y / self.epsilon).floor() as i64,
                (p.z / self.epsilon).floor() as i64,
            )
        }
    }
}

fn bit_key(v: f64) -> i64 {
    if v == 0.0 { 0 } else { v.to_bits() as i64 }
}

// ============================================================================
// Bounding box
// ============================================================================

/// Axis-aligned extent of a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub origin: Point,
    pub opposite: Point,
}

impl BoundingBox {
    /// Smallest box containing `points`, or `None` if there are none.
    pub fn enclosing<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut lo = Point::new(first.x, first.y, first.z);
        let mut hi = lo;
        for p in iter {
            lo.x = lo.x.min(p.x);
            lo.y = lo.y.min(p.y);
            lo.z = lo.z.min(p.z);
            hi.x = hi.x.max(p.x);
            hi.y = hi.y.max(p.y);
            hi.z = hi.z.max(p.z);
        }
        Some(BoundingBox {
            origin: lo,
            opposite: hi,
        })
    }

    pub fn width(&self) -> f64 {
        self.opposite.x - self.origin.x
    }

    pub fn height(&self) -> f64 {
        self.opposite.y - self.origin.y
    }

    pub fn depth(&self) -> f64 {
        self.opposite.z - self.origin.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_index_folds_negative_zero() {
        let mut index = LocationIndex::new(0.0);
        assert!(index.insert(Point::new(0.0, 1.0, 2.0)));
        assert!(!index.insert(Point::new(-0.0, 1.0, 2.0)));
        assert!(index.insert(Point::new(0.0, 1.0, 2.000001)));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn tolerant_index_matches_across_cell_boundaries() {
        let mut index = LocationIndex::new(0.1);
        assert!(index.insert(Point::new(0.099, 0.0, 0.0)));
        // Different cell, but within epsilon.
        assert!(index.contains(&Point::new(0.101, 0.0, 0.0)));
        assert!(!index.contains(&Point::new(0.25, 0.0, 0.0)));
    }

    #[test]
    fn tolerant_index_handles_saturated_cells() {
        let mut index = LocationIndex::new(1e-12);
        assert!(index.insert(Point::new(1e8, 0.0, 0.0)));
        assert!(!index.insert(Point::new(1e8, 0.0, 0.0)));
        assert!(index.insert(Point::new(1e8, 1.0, 0.0)));
        assert!(index.insert(Point::new(-1e8, 0.0, 0.0)));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn centroid_of_nothing_is_none() {
        assert!(centroid(std::iter::empty()).is_none());
        let pts = [Point::new(0.0, 0.0, 0.0), Point::new(2.0, 4.0, -2.0)];
        assert_eq!(centroid(&pts), Some(Point::new(1.0, 2.0, -1.0)));
    }
}
