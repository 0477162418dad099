//! Neurite CLI entry point

use clap::{Parser, Subcommand};
use neurite_core::Point;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use config::{Config, OutputFormat};

#[derive(Parser)]
#[command(name = "neurite")]
#[command(about = "Topology analysis of traced neuronal reconstructions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ./neurite.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format, overriding the config file
    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Location tolerance, overriding the config file
    #[arg(long, global = true)]
    epsilon: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise one or more trees
    Summary {
        #[arg(required = true)]
        trees: Vec<PathBuf>,

        /// One row per path type instead of one per tree
        #[arg(long)]
        by_type: bool,
    },
    /// Horton-Strahler analysis of a tree
    Strahler { tree: PathBuf },
    /// Path-order analysis of a tree
    PathOrder { tree: PathBuf },
    /// Path distance of every node to a root
    Distance {
        tree: PathBuf,

        /// Root as X,Y,Z (defaults to the soma, else the primary path starts)
        #[arg(long, value_parser = commands::parse_point)]
        root: Option<Point>,

        /// Fixed lower bound of the reported range
        #[arg(long)]
        min: Option<f64>,

        /// Fixed upper bound of the reported range
        #[arg(long)]
        max: Option<f64>,
    },
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "neurite={0},neurite_core={0}",
            log_level
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Commands::Version = cli.command {
        println!("Neurite v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(epsilon) = cli.epsilon {
        config.topology.epsilon = epsilon;
    }
    let settings = commands::Settings {
        format: cli.format.unwrap_or(config.output.format),
        config,
    };

    match cli.command {
        Commands::Summary { trees, by_type } => commands::summary(&trees, by_type, &settings),
        Commands::Strahler { tree } => commands::strahler(&tree, &settings),
        Commands::PathOrder { tree } => commands::path_order(&tree, &settings),
        Commands::Distance {
            tree,
            root,
            min,
            max,
        } => commands::distance(&tree, root, min, max, &settings),
        Commands::Version => Ok(()),
    }
}
