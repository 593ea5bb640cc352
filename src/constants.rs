//! File naming and sizing constants for activity storage directories.

/// Extension of the per-field aggregation watermark file.
pub const AGGREGATES_EXTENSION: &str = "aggregates";
/// Extension of the per-field raw value array.
pub const PRIMITIVES_EXTENSION: &str = "data";
/// Uid column shared by every field of a partition.
pub const COMPOSITE_INDEX_FILE: &str = "activity.indexes";
/// Directory-level bookkeeping file.
pub const METADATA_FILE: &str = "activity.metadata";

/// Watermark written for a field that has never been aggregated.
pub const MIN_WATERMARK: i64 = 0;

/// Width in bytes of one primitive value slot (`i32`).
pub const VALUE_SLOT_WIDTH: usize = 4;
/// Width in bytes of one uid slot (`u64`).
pub const UID_SLOT_WIDTH: usize = 8;
/// Uid value marking an unoccupied document slot.
pub const EMPTY_UID: u64 = 0;

pub const DEFAULT_GROW_STEP: usize = 1024;
pub const DEFAULT_FLUSH_BUFFER_SIZE: usize = 50_000;
pub const DEFAULT_FLUSH_BUFFER_MAX_DELAY_SECS: u64 = 15;
pub const DEFAULT_PURGE_JOB_FREQUENCY_MINS: u64 = 30;
pub const DEFAULT_UNDELETABLE_BUFFER_SIZE: usize = 500;

/// Format version stamped into freshly created directory metadata.
pub const METADATA_VERSION: &str = "1";
