//! Parallel analysis of many trees

use rayon::prelude::*;

use crate::error::Result;
use crate::stats::TreeSummary;
use crate::topology::TopologyClassifier;
use crate::tree::Tree;

/// Measures every tree on the rayon pool, one tree per task.
///
/// Results come back in input order; a failing tree does not affect the others.
pub fn analyze_batch(trees: &[Tree], classifier: &TopologyClassifier) -> Vec<Result<TreeSummary>> {
    tracing::debug!("Analysing {} trees", trees.len());
    trees
        .par_iter()
        .map(|tree| TreeSummary::measure(tree, classifier))
        .collect()
}
