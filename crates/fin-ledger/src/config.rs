use serde::{Deserialize, Serialize};

/// Configuration for the ledger core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Number of entries the per-account lock map may hold before entries for
    /// idle accounts are pruned.
    pub lock_prune_threshold: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            lock_prune_threshold: 1024,
        }
    }
}
