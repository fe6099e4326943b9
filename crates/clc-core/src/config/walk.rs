//! Group walk engine settings.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Tuning knobs for the concurrent group walk.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct WalkConfig {
    /// Maximum number of annotation callbacks running at once.
    #[serde(default = "default_worker_count")]
    #[validate(range(min = 1, max = 256))]
    pub worker_count: usize,
    /// Buffer size of the channels between the walk stages.
    #[serde(default = "default_channel_capacity")]
    #[validate(range(min = 1, max = 65536))]
    pub channel_capacity: usize,
    /// Optional deadline for a whole walk, in seconds.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub deadline_seconds: Option<u64>,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            channel_capacity: default_channel_capacity(),
            deadline_seconds: None,
        }
    }
}

fn default_worker_count() -> usize {
    20
}

fn default_channel_capacity() -> usize {
    64
}
