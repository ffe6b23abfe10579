use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use fin_ledger::LedgerConfig;
use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::cli::OutputFormat;

/// Runner configuration, loaded from an optional TOML file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Maximum log level: `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: String,
    pub format: OutputFormat,
    pub ledger: LedgerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".into(),
            format: OutputFormat::Text,
            ledger: LedgerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Effective log level; `--verbose` raises it to at least `debug`.
    pub fn max_level(&self, verbose: bool) -> anyhow::Result<Level> {
        let configured = Level::from_str(&self.log_level)
            .map_err(|_| anyhow::anyhow!("unknown log level: {}", self.log_level))?;
        Ok(if verbose {
            configured.max(Level::DEBUG)
        } else {
            configured
        })
    }
}
