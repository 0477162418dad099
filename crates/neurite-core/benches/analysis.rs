use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use neurite_core::{Path, PathDistanceMapper, PathId, Point, StrahlerAnalyzer, TopologyClassifier, Tree};

/// Full binary tree of `depth` levels; each path carries `nodes` points.
fn synthetic_tree(depth: u32, nodes: usize) -> Tree {
    let mut tree = Tree::new();
    let mut frontier: Vec<(Option<PathId>, Point, f64)> = vec![(None, Point::new(0.0, 0.0, 0.0), 0.0)];
    for level in 0..depth {
        let mut next = Vec::with_capacity(frontier.len() * 2);
        for (parent, start, dx) in frontier {
            let points: Vec<Point> = (0..nodes)
                .map(|i| {
                    let t = i as f64 / (nodes - 1).max(1) as f64;
                    Point::new(start.x + dx * t, start.y + t, start.z)
                })
                .collect();
            let end = *points.last().unwrap();
            let mut path = Path::new(points).unwrap();
            if let Some(parent) = parent {
                path = path.with_start_join(parent, nodes - 1);
            }
            let id = tree.add_path(path).unwrap();
            let spread = f64::from(1u32 << (depth - level));
            next.push((Some(id), end, -spread));
            next.push((Some(id), end, spread));
        }
        frontier = next;
    }
    tree
}

fn strahler(c: &mut Criterion) {
    let mut group = c.benchmark_group("strahler");
    for depth in [8u32, 12] {
        let tree = synthetic_tree(depth, 10);
        let analyzer = StrahlerAnalyzer::new();
        group.bench_with_input(BenchmarkId::from_parameter(depth), &tree, |b, tree| {
            b.iter(|| analyzer.analyze(tree).unwrap());
        });
    }
    group.finish();
}

fn distance(c: &mut Criterion) {
    let tree = synthetic_tree(12, 10);
    let mapper = PathDistanceMapper::new();
    let root = Point::new(0.0, 0.0, 0.0);
    c.bench_function("distance/12", |b| {
        b.iter(|| mapper.map(&tree, &root).unwrap());
    });
}

fn topology(c: &mut Criterion) {
    let tree = synthetic_tree(12, 10);
    let classifier = TopologyClassifier::new();
    c.bench_function("tips/12", |b| {
        b.iter(|| classifier.tips(&tree));
    });
}

criterion_group!(benches, strahler, distance, topology);
criterion_main!(benches);
