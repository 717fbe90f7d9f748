//! Script documents on disk (JSON)

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use varswap::Script;

pub fn load_script(path: &Path) -> Result<Script> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse script: {}", path.display()))
}

pub fn save_script(path: &Path, script: &Script) -> Result<()> {
    let text = serde_json::to_string_pretty(script).context("Failed to serialize script")?;
    std::fs::write(path, text).with_context(|| format!("Failed to write script: {}", path.display()))
}

/// `dir/name.json` -> `dir/name.<suffix>.json`
pub fn suffixed_output(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{}.{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}.{}", stem, suffix),
    };
    input.with_file_name(name)
}

/// `dir/name.json` -> `dir/name<suffix>`
pub fn log_path(output: &Path, suffix: &str) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!("{}{}", stem, suffix))
}

/// File name used as the first audit column
pub fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
