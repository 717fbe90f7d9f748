//! varswap.toml parsing
//!
//! Every field is optional; a missing file means defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// File looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG: &str = "varswap.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VarswapConfig {
    #[serde(default)]
    pub replace: ReplaceSection,
    #[serde(default)]
    pub scan: ScanSection,
}

/// Output naming for `replace`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaceSection {
    /// Inserted before the extension of the default output file
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,

    /// Write the audit log unless `--no-log`
    #[serde(default = "default_true")]
    pub log: bool,

    /// Appended to the output stem to name the default audit log
    #[serde(default = "default_log_suffix")]
    pub log_suffix: String,
}

impl Default for ReplaceSection {
    fn default() -> Self {
        Self {
            output_suffix: default_output_suffix(),
            log: true,
            log_suffix: default_log_suffix(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanSection {
    /// Print the per-kind breakdown line
    #[serde(default = "default_true")]
    pub breakdown: bool,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self { breakdown: true }
    }
}

fn default_output_suffix() -> String {
    "varswap".to_string()
}

fn default_log_suffix() -> String {
    "_varswap_log.csv".to_string()
}

fn default_true() -> bool {
    true
}

impl VarswapConfig {
    /// Load config from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Explicit path, else `./varswap.toml` if present, else defaults
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let local = Path::new(DEFAULT_CONFIG);
                if local.is_file() {
                    Self::load(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = VarswapConfig::parse("").unwrap();
        assert_eq!(config.replace.output_suffix, "varswap");
        assert!(config.replace.log);
        assert_eq!(config.replace.log_suffix, "_varswap_log.csv");
        assert!(config.scan.breakdown);
    }

    #[test]
    fn test_partial_config() {
        let config = VarswapConfig::parse(
            r#"
[replace]
log = false

[scan]
breakdown = false
"#,
        )
        .unwrap();
        assert!(!config.replace.log);
        assert_eq!(config.replace.output_suffix, "varswap");
        assert!(!config.scan.breakdown);
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(VarswapConfig::parse("[render]\nmode = 1\n").is_err());
        assert!(VarswapConfig::parse("[replace]\nsuffix = \"x\"\n").is_err());
    }
}
