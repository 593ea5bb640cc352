//! Durable last-aggregation watermark, one small text file per field.
//!
//! The time-bucketed aggregation process reads [`AggregatesMetadata::last_updated_time`]
//! to decide which activity records still need folding into buckets, then
//! checkpoints its progress with [`AggregatesMetadata::update_time`].

use std::path::{Path, PathBuf};

use crate::constants::{AGGREGATES_EXTENSION, MIN_WATERMARK};
use crate::error::{ActivityError, Result};
use crate::io::atomic::{read_if_exists, write_atomic};
use crate::storage::validate_field_name;

/// Time tick in the units chosen by the aggregation process.
pub type Tick = i64;

/// Watermark of a single field.
///
/// Callers are expected to move the watermark forward only; a regression is
/// logged but still written. Writers of the same field through separate handles
/// or processes must be serialized by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatesMetadata {
    field_name: String,
    last_updated_time: Tick,
    backing_file: Option<PathBuf>,
}

impl AggregatesMetadata {
    /// Load the watermark of `field_name` from `directory`, creating it at
    /// zero when the field has never been seen.
    ///
    /// Two first-time opens of the same field can race, and the later one
    /// may rewrite `"0"` over a value the other has already checkpointed;
    /// callers serialize access per field, as they do for updates.
    pub fn open(directory: &Path, field_name: &str) -> Result<Self> {
        validate_field_name(field_name)?;
        let path = aggregates_path(directory, field_name);

        let last_updated_time = match read_if_exists(&path)? {
            Some(bytes) => parse_watermark(&path, &bytes)?,
            None => {
                write_atomic(&path, MIN_WATERMARK.to_string().as_bytes())?;
                tracing::debug!(
                    activity.field = field_name,
                    activity.path = %path.display(),
                    "created aggregation watermark"
                );
                MIN_WATERMARK
            }
        };

        Ok(Self {
            field_name: field_name.to_string(),
            last_updated_time,
            backing_file: Some(path),
        })
    }

    /// A watermark with no backing file; updates only change the cached value.
    #[must_use]
    pub fn in_memory(field_name: &str) -> Self {
        Self {
            field_name: field_name.to_string(),
            last_updated_time: MIN_WATERMARK,
            backing_file: None,
        }
    }

    #[must_use]
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Cached watermark. Never touches the file.
    #[must_use]
    pub fn last_updated_time(&self) -> Tick {
        self.last_updated_time
    }

    #[must_use]
    pub fn backing_file(&self) -> Option<&Path> {
        self.backing_file.as_deref()
    }

    /// Persist `tick` as the new watermark.
    ///
    /// The file is replaced atomically, and the cached value only changes once
    /// the write has committed, so a failed update leaves both the file and
    /// [`last_updated_time`](Self::last_updated_time) at the previous value.
    pub fn update_time(&mut self, tick: Tick) -> Result<()> {
        if tick < self.last_updated_time {
            tracing::warn!(
                activity.field = %self.field_name,
                activity.previous = self.last_updated_time,
                activity.tick = tick,
                "aggregation watermark moved backwards"
            );
        }
        if let Some(path) = &self.backing_file {
            write_atomic(path, tick.to_string().as_bytes())?;
            tracing::debug!(
                activity.field = %self.field_name,
                activity.tick = tick,
                "aggregation watermark checkpointed"
            );
        }
        self.last_updated_time = tick;
        Ok(())
    }
}

pub(crate) fn aggregates_path(directory: &Path, field_name: &str) -> PathBuf {
    directory.join(format!("{field_name}.{AGGREGATES_EXTENSION}"))
}

// A single trailing line ending is accepted; any other padding is malformed.
fn parse_watermark(path: &Path, bytes: &[u8]) -> Result<Tick> {
    let parsed = std::str::from_utf8(bytes).ok().and_then(|text| {
        let text = text
            .strip_suffix("\r\n")
            .or_else(|| text.strip_suffix('\n'))
            .unwrap_or(text);
        text.parse::<Tick>().ok()
    });
    parsed.ok_or_else(|| {
        let contents = String::from_utf8_lossy(bytes).into_owned();
        tracing::error!(
            activity.path = %path.display(),
            activity.contents = %contents,
            "aggregation watermark is not an integer"
        );
        ActivityError::MalformedWatermark {
            path: path.to_path_buf(),
            contents,
        }
    })
}
