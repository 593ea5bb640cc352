//! Configuration bundle handed to activity storage construction.
//!
//! The persistence layer treats most of these values as opaque: the flush and
//! purge options belong to the indexing pipeline that consumes the storages and
//! are carried through unchanged. Only `grow_step` is read here.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_FLUSH_BUFFER_MAX_DELAY_SECS, DEFAULT_FLUSH_BUFFER_SIZE, DEFAULT_GROW_STEP,
    DEFAULT_PURGE_JOB_FREQUENCY_MINS, DEFAULT_UNDELETABLE_BUFFER_SIZE,
};
use crate::error::{ActivityError, Result};

fn default_flush_buffer_size() -> usize {
    DEFAULT_FLUSH_BUFFER_SIZE
}

fn default_flush_buffer_max_delay_secs() -> u64 {
    DEFAULT_FLUSH_BUFFER_MAX_DELAY_SECS
}

fn default_purge_job_frequency_mins() -> u64 {
    DEFAULT_PURGE_JOB_FREQUENCY_MINS
}

fn default_undeletable_buffer_size() -> usize {
    DEFAULT_UNDELETABLE_BUFFER_SIZE
}

fn default_grow_step() -> usize {
    DEFAULT_GROW_STEP
}

/// Tunables for activity storage. Every field has a default so partial JSON
/// documents deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// Pending updates buffered before the pipeline flushes them to storage.
    #[serde(default = "default_flush_buffer_size")]
    pub flush_buffer_size: usize,
    /// Upper bound on how long buffered updates may wait before a flush.
    #[serde(default = "default_flush_buffer_max_delay_secs")]
    pub flush_buffer_max_delay_secs: u64,
    /// How often the purge job drops values of deleted documents.
    #[serde(default = "default_purge_job_frequency_mins")]
    pub purge_job_frequency_mins: u64,
    /// Recently deleted uids shielded from purge.
    #[serde(default = "default_undeletable_buffer_size")]
    pub undeletable_buffer_size: usize,
    /// Number of slots a mapped column grows by when a write lands past its end.
    #[serde(default = "default_grow_step")]
    pub grow_step: usize,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            flush_buffer_size: default_flush_buffer_size(),
            flush_buffer_max_delay_secs: default_flush_buffer_max_delay_secs(),
            purge_job_frequency_mins: default_purge_job_frequency_mins(),
            undeletable_buffer_size: default_undeletable_buffer_size(),
            grow_step: default_grow_step(),
        }
    }
}

impl ActivityConfig {
    #[must_use]
    pub fn builder() -> ActivityConfigBuilder {
        ActivityConfigBuilder::default()
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).map_err(|err| ActivityError::Config {
            reason: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs_err::read_to_string(path).map_err(|err| ActivityError::io(path, err))?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.grow_step == 0 {
            return Err(ActivityError::Config {
                reason: "grow_step must be non-zero".into(),
            });
        }
        if self.flush_buffer_size == 0 {
            return Err(ActivityError::Config {
                reason: "flush_buffer_size must be non-zero".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActivityConfigBuilder {
    inner: ActivityConfig,
}

impl ActivityConfigBuilder {
    #[must_use]
    pub fn flush_buffer_size(mut self, size: usize) -> Self {
        self.inner.flush_buffer_size = size;
        self
    }

    #[must_use]
    pub fn flush_buffer_max_delay_secs(mut self, secs: u64) -> Self {
        self.inner.flush_buffer_max_delay_secs = secs;
        self
    }

    #[must_use]
    pub fn purge_job_frequency_mins(mut self, mins: u64) -> Self {
        self.inner.purge_job_frequency_mins = mins;
        self
    }

    #[must_use]
    pub fn undeletable_buffer_size(mut self, size: usize) -> Self {
        self.inner.undeletable_buffer_size = size;
        self
    }

    #[must_use]
    pub fn grow_step(mut self, slots: usize) -> Self {
        self.inner.grow_step = slots;
        self
    }

    pub fn build(self) -> Result<ActivityConfig> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}
