//! Replace command - rewrite one variable id everywhere
//!
//! Writes the edited document next to the input (or to `--out`, or over the
//! input with `--in-place`) and appends one audit row per change.

use anyhow::{Context, Result};
use clap::Args;
use std::fs::OpenOptions;
use std::path::PathBuf;

use crate::config::VarswapConfig;
use crate::document::{file_label, load_script, log_path, save_script, suffixed_output};

/// Arguments for the replace command
#[derive(Args)]
pub struct ReplaceArgs {
    /// Script document (JSON)
    #[arg(short, long)]
    pub file: PathBuf,

    /// Variable id to replace
    #[arg(long, allow_negative_numbers = true)]
    pub from: i32,

    /// Replacement variable id
    #[arg(long, allow_negative_numbers = true)]
    pub to: i32,

    /// Output document (default: <stem>.<suffix>.<ext>)
    #[arg(short, long, conflicts_with = "in_place")]
    pub out: Option<PathBuf>,

    /// Overwrite the input document
    #[arg(long)]
    pub in_place: bool,

    /// Report changes without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Audit log (CSV, appended)
    #[arg(long, conflicts_with = "no_log")]
    pub log: Option<PathBuf>,

    /// Skip the audit log
    #[arg(long)]
    pub no_log: bool,

    /// Path to varswap.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn execute(args: ReplaceArgs) -> Result<()> {
    if args.from == args.to {
        anyhow::bail!("--from and --to are both {}; nothing to replace", args.from);
    }
    let config = VarswapConfig::resolve(args.config.as_deref())?;
    let mut script = load_script(&args.file)?;

    let records = varswap::replace_var(&mut script, args.from, args.to, args.dry_run);
    if records.is_empty() {
        println!("No occurrences with var {} found.", args.from);
        return Ok(());
    }

    for record in &records {
        println!(
            "- Pattern {}, Frame {}, {}: raw {} -> {}",
            record.pattern_label, record.frame, record.node_label, record.raw_before, record.raw_after
        );
    }

    if args.dry_run {
        println!(
            "Dry run: {} occurrence(s) of var {} would become var {}.",
            records.len(),
            args.from,
            args.to
        );
        return Ok(());
    }

    let output = if args.in_place {
        args.file.clone()
    } else {
        args.out
            .clone()
            .unwrap_or_else(|| suffixed_output(&args.file, &config.replace.output_suffix))
    };
    save_script(&output, &script)?;
    println!(
        "Replaced {} occurrence(s) of var {} with var {} -> {}",
        records.len(),
        args.from,
        args.to,
        output.display()
    );

    if args.no_log || (!config.replace.log && args.log.is_none()) {
        return Ok(());
    }
    let log = args
        .log
        .clone()
        .unwrap_or_else(|| log_path(&output, &config.replace.log_suffix));
    if let Some(dir) = log.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create audit log directory: {}", dir.display()))?;
    }
    let with_header = !log.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log)
        .with_context(|| format!("Failed to open audit log: {}", log.display()))?;
    varswap::write_audit(file, &file_label(&output), &records, with_header)
        .with_context(|| format!("Failed to write audit log: {}", log.display()))?;
    tracing::info!("Audit log: {}", log.display());
    Ok(())
}
