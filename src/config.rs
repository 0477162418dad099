//! `neurite.toml` loading

use std::ops::Bound;
use std::path::Path;

use anyhow::Context;
use neurite_core::{PathType, Tree};
use serde::Deserialize;

pub const DEFAULT_CONFIG: &str = "neurite.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub topology: TopologyConfig,
    pub distance: DistanceConfig,
    pub restrict: RestrictConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TopologyConfig {
    /// Location tolerance; 0 means exact coordinate equality
    pub epsilon: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DistanceConfig {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Restrictions applied to every loaded tree before analysis.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RestrictConfig {
    pub types: Vec<PathType>,
    pub ignore_types: Vec<PathType>,
    pub orders: Vec<u32>,
    pub min_size: Option<usize>,
    pub max_size: Option<usize>,
    pub min_length: Option<f64>,
    pub max_length: Option<f64>,
    pub name_pattern: Option<String>,
    /// Whether size and length bounds keep paths lying exactly on them
    pub inclusive: bool,
}

impl Default for RestrictConfig {
    fn default() -> Self {
        RestrictConfig {
            types: Vec::new(),
            ignore_types: Vec::new(),
            orders: Vec::new(),
            min_size: None,
            max_size: None,
            min_length: None,
            max_length: None,
            name_pattern: None,
            inclusive: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Config {
    /// Reads `path` if given, else `./neurite.toml` if present, else defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG);
                if fallback.is_file() {
                    Self::from_file(fallback)
                } else {
                    tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG);
                    Ok(Config::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

impl RestrictConfig {
    pub fn is_empty(&self) -> bool {
        *self == RestrictConfig {
            inclusive: self.inclusive,
            ..RestrictConfig::default()
        }
    }

    /// Narrows the tree's view; each configured criterion composes with the previous.
    pub fn apply(&self, tree: &mut Tree) -> anyhow::Result<()> {
        if !self.types.is_empty() {
            tree.restrict_to_types(&self.types);
        }
        if !self.ignore_types.is_empty() {
            tree.ignore_types(&self.ignore_types);
        }
        if !self.orders.is_empty() {
            tree.restrict_to_orders(&self.orders)?;
        }
        if self.min_size.is_some() || self.max_size.is_some() {
            tree.restrict_to_size(bounds(self.min_size, self.max_size, self.inclusive));
        }
        if self.min_length.is_some() || self.max_length.is_some() {
            tree.restrict_to_length(bounds(self.min_length, self.max_length, self.inclusive))?;
        }
        if let Some(pattern) = &self.name_pattern {
            tree.restrict_to_name_pattern(pattern);
        }
        Ok(())
    }
}

fn bounds<T>(min: Option<T>, max: Option<T>, inclusive: bool) -> (Bound<T>, Bound<T>) {
    let wrap = |v: Option<T>| match v {
        Some(v) if inclusive => Bound::Included(v),
        Some(v) => Bound::Excluded(v),
        None => Bound::Unbounded,
    };
    (wrap(min), wrap(max))
}
