//! Path-order statistics
//!
//! Classifies *paths* by their hop count along start joins (1 for primary
//! paths, 2 for their children, ...). Unlike Strahler order this follows how
//! a reconstruction was segmented, not its branching geometry, and it grows
//! away from the root rather than towards it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::point::LocationIndex;
use crate::topology::check_epsilon;
use crate::tree::Tree;

/// Per-order aggregates. Only orders present in the view have entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PathOrderAnalysis {
    /// Highest path order in the view; 0 for an empty view.
    pub max_order: u32,
    pub counts: BTreeMap<u32, usize>,
    /// Distinct join locations lying on paths of each order.
    pub branch_point_counts: BTreeMap<u32, usize>,
    pub lengths: BTreeMap<u32, f64>,
    /// `counts[k] / counts[k - 1]`; NaN for order 1 and when order `k - 1`
    /// has no paths in the view.
    pub bifurcation_ratios: BTreeMap<u32, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PathOrderAnalyzer {
    epsilon: f64,
}

impl PathOrderAnalyzer {
    pub fn new() -> Self {
        PathOrderAnalyzer { epsilon: 0.0 }
    }

    /// Tolerance for counting joins at one location as one branch point.
    pub fn with_epsilon(epsilon: f64) -> Result<Self> {
        check_epsilon(epsilon)?;
        Ok(PathOrderAnalyzer { epsilon })
    }

    pub fn analyze(&self, tree: &Tree) -> Result<PathOrderAnalysis> {
        let orders = tree.path_orders()?;
        let mut analysis = PathOrderAnalysis::default();

        for (id, path) in tree.paths() {
            let order = orders[&id];
            *analysis.counts.entry(order).or_default() += 1;
            *analysis.lengths.entry(order).or_default() += path.length();
            analysis.branch_point_counts.entry(order).or_default();
        }

        let mut forks: BTreeMap<u32, LocationIndex> = BTreeMap::new();
        for (_, path) in tree.paths() {
            let Some(join) = path.start_join else {
                continue;
            };
            // Forks on paths outside the view are not counted.
            let (Some(&order), Some(point)) = (orders.get(&join.parent), tree.node(join.node()))
            else {
                continue;
            };
            let index = forks
                .entry(order)
                .or_insert_with(|| LocationIndex::new(self.epsilon));
            if index.insert(*point) {
                *analysis.branch_point_counts.entry(order).or_default() += 1;
            }
        }

        for (&order, &count) in &analysis.counts {
            let ratio = match order.checked_sub(1).and_then(|k| analysis.counts.get(&k)) {
                Some(&previous) if order > 1 => count as f64 / previous as f64,
                _ => f64::NAN,
            };
            analysis.bifurcation_ratios.insert(order, ratio);
        }
        analysis.max_order = analysis.counts.keys().next_back().copied().unwrap_or(0);

        tracing::debug!(
            "Path order analysis: {} orders over {} paths",
            analysis.counts.len(),
            tree.len()
        );
        Ok(analysis)
    }
}
