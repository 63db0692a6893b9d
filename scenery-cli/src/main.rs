//! Scenery layer export
//!
//! Resolves one layer tree from a JSON store snapshot and prints the result:
//! every property value inherited, every dataset link followed, every tag
//! labelled.
//!
//! Usage:
//!   scenery-export --snapshot scene.json --layer <LAYER_ID> [--flatten]

use anyhow::{Context, Result};
use clap::Parser;
use scenery_cli::{export, load_store, ExportOptions};
use scenery_layers::EngineConfig;
use scenery_types::{LayerId, SceneId};
use std::{fs, path::PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "scenery-export")]
#[command(about = "Resolve a Scenery layer tree and export it as JSON")]
struct Args {
    /// JSON store snapshot to read
    #[arg(short, long)]
    snapshot: PathBuf,

    /// Root layer to resolve
    #[arg(short, long)]
    layer: LayerId,

    /// Engine config file (TOML)
    #[arg(short, long, default_value = "scenery.toml")]
    config: PathBuf,

    /// Restrict reads to these scenes (repeatable)
    #[arg(long = "scene")]
    scenes: Vec<SceneId>,

    /// Emit the list of items instead of the tree
    #[arg(long)]
    flatten: bool,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = EngineConfig::load_from(&args.config).context("Failed to load engine config")?;
    let store = load_store(&args.snapshot)?;

    let options = ExportOptions {
        layer: args.layer,
        scenes: args.scenes,
        flatten: args.flatten,
        config,
    };
    let json = serde_json::to_string_pretty(&export(&store, &options)?)?;

    match &args.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
