use serde::{Deserialize, Serialize};

/// Lifecycle state of a recorder session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderState {
    Idle,
    Recording,
    Paused,
}

/// Point-in-time view of a recorder session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderStatus {
    pub state: RecorderState,

    /// Ticks counted while recording; frozen while paused, 0 when idle
    pub elapsed_secs: u64,

    /// Chunks kept so far in the current session
    pub chunks_count: usize,

    /// Name of the held device, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}
