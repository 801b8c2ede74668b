//! Session management configuration.

use serde::{Deserialize, Serialize};

/// Session management configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime in minutes. Also the session token TTL.
    #[serde(default = "default_ttl")]
    pub ttl_minutes: u64,
    /// Maximum number of live sessions kept in memory.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u64,
    /// Interval for expired session pruning in seconds.
    #[serde(default = "default_prune_interval")]
    pub prune_interval_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: default_ttl(),
            max_sessions: default_max_sessions(),
            prune_interval_seconds: default_prune_interval(),
        }
    }
}

fn default_ttl() -> u64 {
    12 * 60
}

fn default_max_sessions() -> u64 {
    100_000
}

fn default_prune_interval() -> u64 {
    300
}
