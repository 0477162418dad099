//! CLI command implementations

use std::path::{Path as FsPath, PathBuf};

use anyhow::{Context, bail};
use neurite_core::{
    Path, PathDistanceMapper, PathOrderAnalyzer, Point, RootSelection, StrahlerAnalyzer,
    TopologyClassifier, Tree, TreeSummary, analyze_batch,
};
use serde::{Deserialize, Serialize};

use crate::config::{Config, OutputFormat};

/// Settings resolved from the config file and command-line overrides.
pub struct Settings {
    pub config: Config,
    pub format: OutputFormat,
}

/// On-disk form of a tree: paths are identified by their position.
#[derive(Debug, Deserialize)]
struct TreeFile {
    #[serde(default)]
    label: Option<String>,
    paths: Vec<Path>,
}

pub fn load_tree(file: &FsPath) -> anyhow::Result<Tree> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let parsed: TreeFile = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse {}", file.display()))?;
    let label = parsed
        .label
        .or_else(|| file.file_stem().map(|s| s.to_string_lossy().into_owned()));
    let tree = Tree::from_paths(label, parsed.paths)
        .with_context(|| format!("Invalid tree in {}", file.display()))?;
    tracing::debug!("Loaded {} paths from {}", tree.len(), file.display());
    Ok(tree)
}

fn load_restricted(file: &FsPath, ctx: &Settings) -> anyhow::Result<Tree> {
    let mut tree = load_tree(file)?;
    ctx.config.restrict.apply(&mut tree)?;
    if tree.is_restricted() {
        tracing::info!("{} of {} paths kept after restrictions", tree.len(), tree.arena_len());
    }
    Ok(tree)
}

fn classifier(ctx: &Settings) -> anyhow::Result<TopologyClassifier> {
    Ok(TopologyClassifier::with_epsilon(ctx.config.topology.epsilon)?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ── summary ───────────────────────────────────────────────────

pub fn summary(files: &[PathBuf], by_type: bool, ctx: &Settings) -> anyhow::Result<()> {
    let classifier = classifier(ctx)?;
    let mut trees = files
        .iter()
        .map(|f| load_restricted(f, ctx))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let rows = if by_type {
        let mut rows = Vec::new();
        for tree in &mut trees {
            rows.extend(TreeSummary::summarize_by_type(tree, &classifier)?);
        }
        rows
    } else {
        analyze_batch(&trees, &classifier)
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?
    };

    match ctx.format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            print_summary_table(&rows);
            Ok(())
        }
    }
}

fn print_summary_table(rows: &[TreeSummary]) {
    let header: Vec<String> = rows
        .iter()
        .map(|r| {
            let label = r.label.clone().unwrap_or_else(|| "-".to_string());
            match r.path_type {
                Some(t) => format!("{label} [{}]", t.label()),
                None => label,
            }
        })
        .collect();
    let table: Vec<(&str, Vec<String>)> = vec![
        ("paths", rows.iter().map(|r| r.n_paths.to_string()).collect()),
        ("nodes", rows.iter().map(|r| r.n_nodes.to_string()).collect()),
        ("single-point paths", rows.iter().map(|r| r.n_single_point_paths.to_string()).collect()),
        ("branch points", rows.iter().map(|r| r.n_branch_points.to_string()).collect()),
        ("tips", rows.iter().map(|r| r.n_tips.to_string()).collect()),
        ("primary paths", rows.iter().map(|r| r.n_primary_paths.to_string()).collect()),
        ("terminal paths", rows.iter().map(|r| r.n_terminal_paths.to_string()).collect()),
        ("cable length", rows.iter().map(|r| num(r.cable_length)).collect()),
        ("primary length", rows.iter().map(|r| num(r.primary_length)).collect()),
        ("terminal length", rows.iter().map(|r| num(r.terminal_length)).collect()),
        ("highest path order", rows.iter().map(|r| r.highest_path_order.to_string()).collect()),
        ("strahler number", rows.iter().map(|r| opt(r.strahler_number.map(|n| n.to_string()))).collect()),
        ("strahler bif. ratio", rows.iter().map(|r| opt(r.strahler_bifurcation_ratio.map(num))).collect()),
        ("branches", rows.iter().map(|r| opt(r.n_branches.map(|n| n.to_string()))).collect()),
        ("avg branch length", rows.iter().map(|r| opt(r.avg_branch_length.map(num))).collect()),
        ("avg contraction", rows.iter().map(|r| opt(r.avg_contraction.map(num))).collect()),
        ("primary branch length", rows.iter().map(|r| opt(r.primary_branch_length.map(num))).collect()),
        ("terminal branch length", rows.iter().map(|r| opt(r.terminal_branch_length.map(num))).collect()),
        ("mean radius", rows.iter().map(|r| opt(r.mean_radius.map(num))).collect()),
        ("width", rows.iter().map(|r| num(r.width)).collect()),
        ("height", rows.iter().map(|r| num(r.height)).collect()),
        ("depth", rows.iter().map(|r| num(r.depth)).collect()),
    ];

    print!("{:<24}", "metric");
    for h in &header {
        print!("  {h:>16}");
    }
    println!();
    for (name, values) in table {
        print!("{name:<24}");
        for v in values {
            print!("  {v:>16}");
        }
        println!();
    }
}

fn num(v: f64) -> String {
    if v.is_nan() { "NaN".to_string() } else { format!("{v:.3}") }
}

fn opt(v: Option<String>) -> String {
    v.unwrap_or_else(|| "-".to_string())
}

// ── strahler / path-order ─────────────────────────────────────

pub fn strahler(file: &FsPath, ctx: &Settings) -> anyhow::Result<()> {
    let tree = load_restricted(file, ctx)?;
    let analysis = StrahlerAnalyzer::with_epsilon(ctx.config.topology.epsilon)?.analyze(&tree)?;
    tracing::info!("Strahler number of {}: {}", tree.label().unwrap_or("tree"), analysis.root_number);

    match ctx.format {
        OutputFormat::Json => print_json(&analysis),
        OutputFormat::Table => {
            println!("Strahler number: {}", analysis.root_number);
            println!("{:>5}  {:>8}  {:>13}  {:>12}  {:>8}", "order", "branches", "branch points", "length", "ratio");
            for order in (1..=analysis.root_number).rev() {
                println!(
                    "{:>5}  {:>8}  {:>13}  {:>12}  {:>8}",
                    order,
                    analysis.branch_counts[&order],
                    analysis.branch_point_counts[&order],
                    num(analysis.lengths[&order]),
                    num(analysis.bifurcation_ratios[&order]),
                );
            }
            println!("Average bifurcation ratio: {}", num(analysis.avg_bifurcation_ratio()));
            Ok(())
        }
    }
}

pub fn path_order(file: &FsPath, ctx: &Settings) -> anyhow::Result<()> {
    let tree = load_restricted(file, ctx)?;
    let analysis = PathOrderAnalyzer::with_epsilon(ctx.config.topology.epsilon)?.analyze(&tree)?;

    match ctx.format {
        OutputFormat::Json => print_json(&analysis),
        OutputFormat::Table => {
            println!("Highest path order: {}", analysis.max_order);
            println!("{:>5}  {:>6}  {:>13}  {:>12}  {:>8}", "order", "paths", "branch points", "length", "ratio");
            for (order, count) in &analysis.counts {
                println!(
                    "{:>5}  {:>6}  {:>13}  {:>12}  {:>8}",
                    order,
                    count,
                    analysis.branch_point_counts[order],
                    num(analysis.lengths[order]),
                    num(analysis.bifurcation_ratios[order]),
                );
            }
            Ok(())
        }
    }
}

// ── distance ──────────────────────────────────────────────────

pub fn distance(
    file: &FsPath,
    root: Option<Point>,
    min: Option<f64>,
    max: Option<f64>,
    ctx: &Settings,
) -> anyhow::Result<()> {
    let tree = load_restricted(file, ctx)?;
    let selection = root.map_or(RootSelection::Auto, RootSelection::Explicit);
    let root = selection.resolve(&tree)?;

    let min = min.or(ctx.config.distance.min);
    let max = max.or(ctx.config.distance.max);
    let mapper = match (min, max) {
        (Some(min), Some(max)) => PathDistanceMapper::with_bounds(min, max)?,
        (None, None) => PathDistanceMapper::new(),
        _ => bail!("distance bounds need both a minimum and a maximum"),
    };
    let map = mapper.map(&tree, &root)?;
    tracing::info!("Mapped {} nodes from root {}", map.len(), root);

    match ctx.format {
        OutputFormat::Json => print_json(&map),
        OutputFormat::Table => {
            println!("Root: {root}");
            println!("Range: {} - {}", num(map.min), num(map.max));
            println!("{:>6}  {:>6}  {:>12}  {:>12}", "path", "nodes", "start", "end");
            for (id, values) in &map.distances {
                let start = values.first().copied().unwrap_or(f64::NAN);
                let end = values.last().copied().unwrap_or(f64::NAN);
                println!("{:>6}  {:>6}  {:>12}  {:>12}", id.to_string(), values.len(), num(start), num(end));
            }
            Ok(())
        }
    }
}

/// Parses `X,Y,Z` into a point.
pub fn parse_point(s: &str) -> Result<Point, String> {
    let coords = s
        .split(',')
        .map(|c| c.trim().parse::<f64>().map_err(|e| format!("'{c}': {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    match coords.as_slice() {
        [x, y, z] => Ok(Point::new(*x, *y, *z)),
        _ => Err(format!("expected X,Y,Z, got '{s}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("1, 2.5,-3").unwrap(), Point::new(1.0, 2.5, -3.0));
        assert!(parse_point("1,2").is_err());
        assert!(parse_point("a,b,c").is_err());
    }

    #[test]
    fn test_load_tree_uses_file_stem_as_label() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("cell-7.json");
        std::fs::write(
            &file,
            r#"{"paths": [{"points": [{"x": 0, "y": 0, "z": 0}, {"x": 1, "y": 0, "z": 0}]}]}"#,
        )
        .unwrap();
        let tree = load_tree(&file).unwrap();
        assert_eq!(tree.label(), Some("cell-7"));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_load_tree_rejects_dangling_join() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("bad.json");
        std::fs::write(
            &file,
            r#"{"paths": [{"points": [{"x": 0, "y": 0, "z": 0}], "start_join": {"parent": 4, "index": 0}}]}"#,
        )
        .unwrap();
        let err = load_tree(&file).unwrap_err();
        assert!(format!("{err:#}").contains("invalid topology"));
    }
}
