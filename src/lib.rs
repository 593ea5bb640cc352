#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![cfg_attr(test, allow(clippy::uninlined_format_args))]
#![allow(clippy::module_name_repetitions)]
//
// Documentation lints: internal helpers are self-describing; public APIs still
// carry docs where the behaviour is not obvious from the signature.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
//
// Slot offsets and file lengths are bounded by the mapped file size.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]
//
// Storage accessors return `Result` even when the value is trivially known so
// "used before init()" stays an error rather than a panic.
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::needless_pass_by_value)]

//! File-backed persistence for per-field activity values.
//!
//! Activity values are secondary, frequently mutated numeric signals (click
//! counts, boosts) kept beside a full-text index. This crate manages the files
//! of one index partition:
//!
//! - `<field>.aggregates`: last-aggregation watermark ([`AggregatesMetadata`]);
//! - `<field>.data`: raw values of one field ([`ActivityPrimitivesStorage`]);
//! - `activity.indexes`: document uids tying fields together
//!   ([`CompositeActivityStorage`]);
//! - `activity.metadata`: directory bookkeeping ([`Metadata`]).
//!
//! ```no_run
//! use sensei_activity::{ActivityPersistence, lookup};
//!
//! # fn main() -> sensei_activity::Result<()> {
//! let persistence = lookup("/var/lib/activity/partition-0");
//! let mut watermark = persistence.aggregates_metadata("clicks")?;
//! watermark.update_time(watermark.last_updated_time() + 60)?;
//! # Ok(())
//! # }
//! ```

/// The sensei-activity crate version (matches `Cargo.toml`).
pub const SENSEI_ACTIVITY_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod aggregates;
pub mod config;
pub mod constants;
pub mod error;
mod io;
pub mod metadata;
pub mod persistence;
pub mod storage;

pub use aggregates::{AggregatesMetadata, Tick};
pub use config::{ActivityConfig, ActivityConfigBuilder};
pub use constants::*;
pub use error::{ActivityError, Result};
pub use metadata::Metadata;
pub use persistence::{
    ActivityPersistence, FileActivityPersistence, InMemoryActivityPersistence,
    PersistenceProvider, in_memory, lookup, lookup_with_config,
};
pub use storage::{ActivityPrimitivesStorage, CompositeActivityStorage};
