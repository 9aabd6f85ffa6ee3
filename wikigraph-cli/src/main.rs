//! wikigraph CLI - export the link graph of a Markdown wiki to a graph store.
//!
//! Every page becomes a `Page` node keyed by its title, and every internal
//! `[text](Page.md)` link becomes a `LINKS_TO` relationship.

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::export::ExportOptions;
use commands::*;
use config::WikiConfig;
use output::OutputFormat;

/// Export the link graph of a Markdown wiki to a graph store.
#[derive(Parser)]
#[command(name = "wikigraph")]
#[command(author, version)]
#[command(about = "Export the link graph of a Markdown wiki to a graph store")]
#[command(propagate_version = true)]
#[command(after_help = "Examples:
  wikigraph convert html wiki   Convert an HTML export to Markdown
  wikigraph check               Verify the store is reachable
  wikigraph export ./wiki       Write pages and links to the store
  wikigraph export ./wiki -n    Show what would be written
  wikigraph links ./wiki/Home.md")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format (overrides config default)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Config file (default: ./.wikigraph.toml if present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify that the graph store is reachable
    Check,

    /// Build the link graph of a wiki directory and write it to the store
    Export {
        /// Directory holding the exported pages
        dir: PathBuf,

        /// Pages or links per write transaction
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Directory for the dangling-reference log
        #[arg(long, value_name = "DIR")]
        log_dir: Option<PathBuf>,

        /// Stop submitting batches after this many seconds (0 = no limit)
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Build the graph and print the summary without touching the store
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Convert an HTML wiki export into Markdown pages
    Convert {
        /// Directory holding the exported `.html` pages
        source: PathBuf,

        /// Directory to write the Markdown pages to
        dest: PathBuf,

        /// Replace the contents of a non-empty destination
        #[arg(short, long)]
        force: bool,
    },

    /// Show the links one page contributes, with their resolved titles
    Links {
        /// Page file to inspect
        file: PathBuf,
    },

    /// Show page and link counts held by the store
    Status,

    /// Delete every page and link from the store
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug,neo4rs=info"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = WikiConfig::resolve(cli.config.as_deref())?;

    // Resolve output format: CLI flag > config default > Table
    let format = cli.format.unwrap_or_else(|| {
        config
            .default_format()
            .and_then(|f| f.parse().ok())
            .unwrap_or(OutputFormat::Table)
    });

    if let Some(use_color) = config.use_color() {
        colored::control::set_override(use_color);
    }

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            let _ = Cli::command().print_help();
            println!();
            return Ok(());
        }
    };

    match command {
        Commands::Check => check::run(&config, format).await,
        Commands::Export {
            dir,
            batch_size,
            log_dir,
            timeout,
            dry_run,
        } => {
            let options = ExportOptions {
                batch_size,
                log_dir,
                timeout_secs: timeout,
                dry_run,
            };
            export::run(&dir, options, &config, format).await
        }
        Commands::Convert {
            source,
            dest,
            force,
        } => convert::run(&source, &dest, force, format).await,
        Commands::Links { file } => links::run(&file, format).await,
        Commands::Status => status::run(&config, format).await,
        Commands::Clear { yes } => clear::run(yes, &config, format).await,
    }
}
