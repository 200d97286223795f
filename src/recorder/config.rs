use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a recorder session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Period of the elapsed-time ticker
    /// Default: 1 second
    pub tick: Duration,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
        }
    }
}
