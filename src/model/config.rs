use serde::{Deserialize, Serialize};

use crate::ops::filter::BaseFilter;

/// Configuration from `.slate/config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub list: ListConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConfig {
    /// Filter used by `slate list` when no flag is given
    #[serde(default = "default_filter")]
    pub default_filter: BaseFilter,
    /// Prefix each listed line with its short id
    #[serde(default = "default_true")]
    pub show_ids: bool,
    /// Truncate listed lines to this many terminal cells (0 = no limit)
    #[serde(default)]
    pub max_width: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        ListConfig {
            default_filter: default_filter(),
            show_ids: true,
            max_width: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// How long a write waits for another process holding the store lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_filter() -> BaseFilter {
    BaseFilter::All
}

fn default_lock_timeout_ms() -> u64 {
    5000
}
