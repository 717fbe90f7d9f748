//! varswap - scan and rewrite variable references in animation scripts
//!
//! # Commands
//!
//! - `varswap scan` - List variable references, optionally for one id
//! - `varswap replace` - Rewrite every reference to one id
//!
//! # Usage
//!
//! ```bash
//! # Everything that touches variable 4
//! varswap scan --file moves.json --var 4
//!
//! # Preview, then rewrite variable 4 as 12 (writes moves.varswap.json)
//! varswap replace --file moves.json --from 4 --to 12 --dry-run
//! varswap replace --file moves.json --from 4 --to 12
//! ```
//!
//! # Config (varswap.toml)
//!
//! ```toml
//! [replace]
//! output_suffix = "varswap"
//! log = true
//! log_suffix = "_varswap_log.csv"
//!
//! [scan]
//! breakdown = true
//! ```

mod config;
mod document;
mod replace;
mod scan;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// varswap - variable reference scanner for animation scripts
#[derive(Parser)]
#[command(name = "varswap")]
#[command(about = "Scan and rewrite variable references in animation scripts")]
#[command(version)]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List variable references
    Scan(scan::ScanArgs),

    /// Replace one variable id with another everywhere
    Replace(replace::ReplaceArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Scan(args) => scan::execute(args),
        Commands::Replace(args) => replace::execute(args),
    }
}
