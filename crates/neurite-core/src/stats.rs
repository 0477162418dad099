//! Whole-tree morphometric summary

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::path::PathType;
use crate::strahler::{Branch, StrahlerAnalyzer};
use crate::topology::TopologyClassifier;
use crate::tree::Tree;

/// One row of tree measurements.
///
/// Strahler-derived fields are `None` when the view is not a single
/// connected tree; everything else is always defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSummary {
    pub label: Option<String>,
    /// Path type the view was restricted to, when summarising by type.
    pub path_type: Option<PathType>,
    pub n_paths: usize,
    pub n_nodes: usize,
    pub n_single_point_paths: usize,
    pub n_branch_points: usize,
    pub n_tips: usize,
    pub n_primary_paths: usize,
    pub n_terminal_paths: usize,
    pub cable_length: f64,
    pub primary_length: f64,
    pub terminal_length: f64,
    /// 0 for an empty view.
    pub highest_path_order: u32,
    pub strahler_number: Option<u32>,
    pub strahler_bifurcation_ratio: Option<f64>,
    pub n_branches: Option<usize>,
    pub avg_branch_length: Option<f64>,
    pub avg_contraction: Option<f64>,
    pub primary_branch_length: Option<f64>,
    pub terminal_branch_length: Option<f64>,
    pub mean_radius: Option<f64>,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl TreeSummary {
    /// Measures the tree's current view.
    ///
    /// Fails only when path orders cannot be derived (a join cycle).
    pub fn measure(tree: &Tree, classifier: &TopologyClassifier) -> Result<Self> {
        let orders = tree.path_orders()?;
        let strahler = match StrahlerAnalyzer::with_epsilon(classifier.epsilon())?.analyze(tree) {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                tracing::debug!("Strahler metrics unavailable: {}", e);
                None
            }
        };
        let (width, height, depth) = tree
            .bounding_box()
            .map_or((0.0, 0.0, 0.0), |b| (b.width(), b.height(), b.depth()));
        let radii: Vec<f64> = tree
            .paths()
            .flat_map(|(_, p)| p.points().iter().filter_map(|pt| pt.radius))
            .collect();

        let branches: Option<Vec<&Branch>> = strahler
            .as_ref()
            .map(|s| s.branches.values().flatten().collect());

        Ok(TreeSummary {
            label: tree.label().map(str::to_owned),
            path_type: None,
            n_paths: tree.len(),
            n_nodes: tree.node_count(),
            n_single_point_paths: tree.paths().filter(|(_, p)| p.len() == 1).count(),
            n_branch_points: classifier.branch_points(tree).len(),
            n_tips: classifier.tips(tree).len(),
            n_primary_paths: classifier.primary_paths(tree).len(),
            n_terminal_paths: classifier.terminal_paths(tree).len(),
            cable_length: classifier.cable_length(tree),
            primary_length: classifier.primary_length(tree),
            terminal_length: classifier.terminal_length(tree),
            highest_path_order: orders.values().copied().max().unwrap_or(0),
            strahler_number: strahler.as_ref().map(|s| s.root_number),
            strahler_bifurcation_ratio: strahler.as_ref().map(|s| s.avg_bifurcation_ratio()),
            n_branches: branches.as_ref().map(Vec::len),
            avg_branch_length: branches
                .as_ref()
                .map(|b| mean(b.iter().map(|br| br.length))),
            avg_contraction: branches
                .as_ref()
                .map(|b| mean(b.iter().map(|br| br.contraction).filter(|c| !c.is_nan()))),
            primary_branch_length: strahler
                .as_ref()
                .map(|s| s.primary_branches().iter().map(|b| b.length).sum::<f64>()),
            terminal_branch_length: strahler
                .as_ref()
                .map(|s| s.terminal_branches().iter().map(|b| b.length).sum::<f64>()),
            mean_radius: if radii.is_empty() {
                None
            } else {
                Some(mean(radii.iter().copied()))
            },
            width,
            height,
            depth,
        })
    }

    /// One summary per path type present in the view, soma excluded.
    ///
    /// Each type is measured on a restricted view; the view is restored
    /// before returning, including on error.
    pub fn summarize_by_type(tree: &mut Tree, classifier: &TopologyClassifier) -> Result<Vec<Self>> {
        let snapshot = tree.snapshot_view();
        let types = tree.path_types();
        let mut rows = Vec::new();
        let mut outcome = Ok(());
        for path_type in types.into_iter().filter(|t| *t != PathType::Soma) {
            tree.restrict_to_types(&[path_type]);
            let measured = Self::measure(tree, classifier);
            tree.restore_view(&snapshot);
            match measured {
                Ok(mut row) => {
                    row.path_type = Some(path_type);
                    rows.push(row);
                }
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }
        outcome.map(|_| rows)
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}
