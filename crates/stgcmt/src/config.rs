use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Storage commitment settings of the local application entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StgCmtConfig {
    /// Seconds between the N-ACTION response and the first N-EVENT-REPORT attempt.
    #[serde(default)]
    pub delay_secs: u64,
    /// Further attempts after the first one fails.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_interval_secs() -> u64 {
    60
}

impl Default for StgCmtConfig {
    fn default() -> Self {
        StgCmtConfig {
            delay_secs: 0,
            max_retries: default_max_retries(),
            retry_interval_secs: default_retry_interval_secs(),
        }
    }
}

impl StgCmtConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    /// Whether a report that already failed `retries` re-sends may be tried again.
    pub fn may_retry(&self, retries: u32) -> bool {
        retries < self.max_retries
    }
}
