//! hdoc: generate versioned API docs from the C headers in a git repository.
//!
//! - `hdoc doc hdoc.json`: process every tag and `HEAD`, then publish
//! - `hdoc gen hdoc.json`: write a starter config

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hdoc::config::TEMPLATE;
use hdoc::emit::Published;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "hdoc",
    about = "Generate versioned API documentation from C headers in a git repository"
)]
struct Cli {
    /// Log every step, including skipped subtrees
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate docs for every tagged version and HEAD
    Doc {
        /// Project config file; its directory must be the git repository
        config: PathBuf,
    },
    /// Write a config template
    Gen {
        /// Path to create
        file: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { "hdoc=debug" } else { "hdoc=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Doc { config } => {
            match hdoc::pipeline::generate_docs(&config)? {
                Published::Commit(oid) => info!(commit = %oid, "docs published"),
                Published::Directory(dir) => info!(dir = %dir.display(), "docs written"),
            }
            Ok(())
        }
        Command::Gen { file } => {
            if file.exists() {
                bail!("refusing to overwrite {}", file.display());
            }
            fs::write(&file, TEMPLATE)
                .with_context(|| format!("failed to write {}", file.display()))?;
            println!("{}", file.display());
            Ok(())
        }
    }
}
