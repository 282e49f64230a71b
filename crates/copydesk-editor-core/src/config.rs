//! Editor tuning knobs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default number of undo steps kept per session.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Default quiet period before an edit is committed to history.
pub const DEFAULT_CAPTURE_DELAY_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EditorConfig {
    /// Maximum history entries; the oldest entry is evicted past this.
    pub history_capacity: usize,
    /// Debounce window for history capture, in milliseconds.
    pub capture_delay_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            capture_delay_ms: DEFAULT_CAPTURE_DELAY_MS,
        }
    }
}

impl EditorConfig {
    pub fn capture_delay(&self) -> Duration {
        Duration::from_millis(self.capture_delay_ms)
    }
}
