//! Scan command - list variable references

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::config::VarswapConfig;
use crate::document::load_script;

/// Arguments for the scan command
#[derive(Args)]
pub struct ScanArgs {
    /// Script document (JSON)
    #[arg(short, long)]
    pub file: PathBuf,

    /// Only list references to this variable id
    #[arg(long, allow_negative_numbers = true)]
    pub var: Option<i32>,

    /// Path to varswap.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn execute(args: ScanArgs) -> Result<()> {
    let config = VarswapConfig::resolve(args.config.as_deref())?;
    let script = load_script(&args.file)?;
    tracing::debug!(
        file = %args.file.display(),
        sequences = script.sequence_count(),
        "loaded script"
    );

    let report = varswap::scan(&script, args.var);
    if report.is_empty() {
        match args.var {
            Some(var) => println!("No occurrences with var {} found.", var),
            None => println!("No variable references found."),
        }
        return Ok(());
    }

    for entry in &report.entries {
        println!("{}", entry);
    }
    println!("{} occurrence(s) listed.", report.entries.len());
    if config.scan.breakdown {
        println!("{}", report.breakdown_line());
    }
    Ok(())
}
