//! Sync tuning settings
//!
//! Loaded as the `sync` section of the application configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Limits applied to one bulk sync run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncSettings {
    /// Upper bound for a single VTT round trip
    pub call_timeout_ms: u64,
    /// Concurrent upserts within one resource category
    pub fan_out: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            call_timeout_ms: 10_000,
            fan_out: 4,
        }
    }
}

impl SyncSettings {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn fan_out(&self) -> usize {
        self.fan_out.max(1)
    }
}
