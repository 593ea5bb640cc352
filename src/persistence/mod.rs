//! Access point resolving a storage directory and config into ready storage handles.
//!
//! Two variants implement [`ActivityPersistence`]: [`FileActivityPersistence`]
//! over a directory, and [`InMemoryActivityPersistence`] for tests and
//! throwaway contexts. Code that wants to swap one for the other receives a
//! [`PersistenceProvider`] instead of calling [`lookup`] directly.

mod file;
mod memory;
mod provider;

pub use file::FileActivityPersistence;
pub use memory::InMemoryActivityPersistence;
pub use provider::PersistenceProvider;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::aggregates::AggregatesMetadata;
use crate::config::ActivityConfig;
use crate::error::Result;
use crate::metadata::Metadata;
use crate::storage::{ActivityPrimitivesStorage, CompositeActivityStorage};

/// Capability set every persistence variant provides.
pub trait ActivityPersistence: fmt::Debug + Send + Sync {
    /// Root directory, or `None` when nothing is persisted.
    fn directory(&self) -> Option<&Path>;

    /// The config this instance was built with, as the same `Arc`.
    fn config(&self) -> &Arc<ActivityConfig>;

    /// Directory bookkeeping, initialised on the first call and cached after.
    fn metadata(&self) -> Result<&Metadata>;

    /// A freshly constructed and initialised composite storage.
    fn composite_storage(&self) -> Result<CompositeActivityStorage>;

    /// A freshly constructed and initialised storage for one field.
    fn primitives_storage(&self, field_name: &str) -> Result<ActivityPrimitivesStorage>;

    /// The aggregation watermark of `field_name`, created at zero if unseen.
    fn aggregates_metadata(&self, field_name: &str) -> Result<AggregatesMetadata>;
}

/// Build a file-backed instance over `directory` with the default config.
///
/// Every call returns an independent instance with its own metadata cache.
#[must_use]
pub fn lookup(directory: impl AsRef<Path>) -> FileActivityPersistence {
    lookup_with_config(directory, Arc::new(ActivityConfig::default()))
}

#[must_use]
pub fn lookup_with_config(
    directory: impl AsRef<Path>,
    config: Arc<ActivityConfig>,
) -> FileActivityPersistence {
    FileActivityPersistence::new(directory, config)
}

/// An instance that never reads or writes the filesystem.
#[must_use]
pub fn in_memory() -> InMemoryActivityPersistence {
    InMemoryActivityPersistence::new(Arc::new(ActivityConfig::default()))
}
