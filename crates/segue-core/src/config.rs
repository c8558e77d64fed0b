//! Scheduler configuration.
//!
//! [`SchedulerConfig`] is deserialized from JSON. Every field defaults
//! sensibly so a completely empty `{}` document is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::Error;

/// Tuning knobs for the boundary scheduler and its session driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Slack added to every computed wake-up to absorb adapter timer jitter.
    pub epsilon_ms: u64,
    /// Fixed re-check delay while playback sits in a gap between events.
    pub gap_recheck_ms: u64,
    /// Load the next segment automatically when the current one ends.
    pub auto_advance: bool,
    /// Buffer size of the cue notification broadcast channel.
    pub event_bus_capacity: usize,
    /// Buffer size of the session command channel.
    pub command_buffer: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            epsilon_ms: 5,
            gap_recheck_ms: 100,
            auto_advance: true,
            event_bus_capacity: 256,
            command_buffer: 32,
        }
    }
}

impl SchedulerConfig {
    /// Deserialize a `SchedulerConfig` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str).map_err(|e| Error::Config(format!("parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None`, missing, or unparsable.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse scheduler config {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No scheduler config at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read scheduler config {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.epsilon_ms == 0 {
            warnings.push(
                "epsilon_ms is 0; wake-ups may land just before a boundary and re-arm".into(),
            );
        }
        if self.gap_recheck_ms == 0 {
            warnings.push("gap_recheck_ms is 0; gaps will be polled without delay".into());
        }
        if self.event_bus_capacity == 0 {
            warnings.push("event_bus_capacity is 0; it will be raised to 1".into());
        }
        if self.command_buffer == 0 {
            warnings.push("command_buffer is 0; it will be raised to 1".into());
        }

        warnings
    }

    /// Wake-up slack as a [`Duration`].
    pub fn epsilon(&self) -> Duration {
        Duration::from_millis(self.epsilon_ms)
    }

    /// Gap re-check delay as a [`Duration`].
    pub fn gap_recheck(&self) -> Duration {
        Duration::from_millis(self.gap_recheck_ms)
    }
}
