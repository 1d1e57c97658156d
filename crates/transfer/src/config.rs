//! Writer tuning knobs.
//!
//! Read from camelCase JSON. Absent keys fall back to defaults so a partial
//! file only overrides what it names.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::progress::{DEFAULT_PROGRESS_BYTES, DEFAULT_PROGRESS_INTERVAL, ProgressThrottle};

/// Default transfer buffer size: 32 KiB.
pub const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

/// Largest accepted transfer buffer: 16 MiB.
pub const MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WriterConfig {
    /// Size of the reusable transfer buffer; bounds every chunk.
    pub buffer_size: usize,
    /// Minimum time between progress notifications.
    pub progress_interval_ms: u64,
    /// Bytes written since the last notification that force a new one.
    pub progress_bytes: u64,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            progress_interval_ms: DEFAULT_PROGRESS_INTERVAL.as_millis() as u64,
            progress_bytes: DEFAULT_PROGRESS_BYTES,
        }
    }
}

impl WriterConfig {
    /// Loads configuration from a JSON file.
    ///
    /// A missing file yields defaults; so does malformed JSON, with a
    /// warning. Values are not range-checked here; see [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str::<WriterConfig>(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse writer config, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size == 0 || self.buffer_size > MAX_BUFFER_SIZE {
            return Err(ConfigError::Invalid(format!(
                "bufferSize must be between 1 and {MAX_BUFFER_SIZE}, got {}",
                self.buffer_size
            )));
        }
        if self.progress_bytes == 0 {
            return Err(ConfigError::Invalid("progressBytes must be positive".into()));
        }
        Ok(())
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// Builds a fresh progress throttle from these settings.
    pub fn throttle(&self) -> ProgressThrottle {
        ProgressThrottle::new(self.progress_interval(), self.progress_bytes)
    }
}
