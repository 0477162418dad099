//! Fixture trees for the unit tests

use crate::path::{Path, PathId, PathType};
use crate::point::Point;
use crate::tree::Tree;

pub fn pt(x: f64, y: f64, z: f64) -> Point {
    Point::new(x, y, z)
}

/// A primary path through the given coordinates.
pub fn line(coords: &[(f64, f64, f64)]) -> Path {
    Path::new(coords.iter().map(|&(x, y, z)| pt(x, y, z)).collect()).unwrap()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

/// One straight path of three nodes: (0,0,0) → (1,0,0) → (2,0,0).
pub fn single_path() -> Tree {
    let mut tree = Tree::new().with_label("single");
    tree.add_path(line(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (2.0, 0.0, 0.0)]))
        .unwrap();
    tree
}

/// Path B continues from the last node of path A.
///
/// A: (0,0,0) → (1,0,0) → (2,0,0), B: (2,0,0) → (2,1,0) → (2,2,0)
pub fn continuation() -> Tree {
    let mut tree = Tree::new().with_label("continuation");
    let a = tree
        .add_path(line(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (2.0, 0.0, 0.0)]).with_name("A"))
        .unwrap();
    tree.add_path(
        line(&[(2.0, 0.0, 0.0), (2.0, 1.0, 0.0), (2.0, 2.0, 0.0)])
            .with_name("B")
            .with_start_join(a, 2),
    )
    .unwrap();
    tree
}

/// Paths B and C both start at the last node of A.
///
/// A: (0,0,0) → (1,0,0), B: (1,0,0) → (2,1,0), C: (1,0,0) → (2,-1,0)
pub fn bifurcation() -> Tree {
    let mut tree = Tree::new().with_label("bifurcation");
    let a = tree
        .add_path(line(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0)]).with_name("A"))
        .unwrap();
    tree.add_path(
        line(&[(1.0, 0.0, 0.0), (2.0, 1.0, 0.0)])
            .with_name("B")
            .with_start_join(a, 1),
    )
    .unwrap();
    tree.add_path(
        line(&[(1.0, 0.0, 0.0), (2.0, -1.0, 0.0)])
            .with_name("C")
            .with_start_join(a, 1),
    )
    .unwrap();
    tree
}

/// Path B leaves the middle node of a five-node path A.
///
/// A: (0,0,0) → ... → (4,0,0), B: (2,0,0) → (2,3,0) joined at A[2]
pub fn mid_path_join() -> Tree {
    let mut tree = Tree::new().with_label("mid-path");
    let a = tree
        .add_path(line(&[
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (2.0, 0.0, 0.0),
            (3.0, 0.0, 0.0),
            (4.0, 0.0, 0.0),
        ]))
        .unwrap();
    tree.add_path(line(&[(2.0, 0.0, 0.0), (2.0, 3.0, 0.0)]).with_start_join(a, 2))
        .unwrap();
    tree
}

/// A small typed cell: a soma path with one dendritic arbor and one axon.
///
/// ```text
/// S  soma      (0,0,0) → (0,0.5,0)
/// D1 dendrite  (0,0,0) → (5,0,0)        joins S[0]
/// D2 dendrite  (5,0,0) → (8,2,0)        joins D1[1]
/// D3 dendrite  (5,0,0) → (8,-2,0)       joins D1[1]
/// X  axon      (0,0,0) → (0,-10,0)      joins S[0]
/// ```
pub fn typed_neuron() -> Tree {
    let mut tree = Tree::new().with_label("typed");
    let s = tree
        .add_path(
            line(&[(0.0, 0.0, 0.0), (0.0, 0.5, 0.0)])
                .with_name("soma")
                .with_type(PathType::Soma),
        )
        .unwrap();
    let d1 = tree
        .add_path(
            line(&[(0.0, 0.0, 0.0), (5.0, 0.0, 0.0)])
                .with_name("dendrite 1")
                .with_type(PathType::Dendrite)
                .with_start_join(s, 0),
        )
        .unwrap();
    for (name, end) in [("dendrite 2", (8.0, 2.0, 0.0)), ("dendrite 3", (8.0, -2.0, 0.0))] {
        tree.add_path(
            line(&[(5.0, 0.0, 0.0), end])
                .with_name(name)
                .with_type(PathType::Dendrite)
                .with_start_join(d1, 1),
        )
        .unwrap();
    }
    tree.add_path(
        line(&[(0.0, 0.0, 0.0), (0.0, -10.0, 0.0)])
            .with_name("axon")
            .with_type(PathType::Axon)
            .with_start_join(s, 0),
    )
    .unwrap();
    tree
}

/// Full binary tree of `depth` levels of two-node paths; every internal
/// path forks into two children at its last node.
pub fn binary_tree(depth: u32) -> Tree {
    let mut tree = Tree::new().with_label(format!("binary-{depth}"));
    if depth > 0 {
        grow(&mut tree, None, pt(0.0, 0.0, 0.0), 0.0, depth);
    }
    tree
}

fn grow(tree: &mut Tree, parent: Option<PathId>, start: Point, offset: f64, remaining: u32) {
    let end = pt(start.x + offset, start.y + 1.0, 0.0);
    let mut path = Path::new(vec![start, end]).unwrap();
    if let Some(parent) = parent {
        path = path.with_start_join(parent, 1);
    }
    let id = tree.add_path(path).unwrap();
    if remaining > 1 {
        let spread = f64::from(1u32 << remaining);
        grow(tree, Some(id), end, -spread, remaining - 1);
        grow(tree, Some(id), end, spread, remaining - 1);
    }
}
