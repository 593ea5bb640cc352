//! Raw activity value storages: one array per field plus the composite view
//! that ties every field of a partition to its document uids.

mod composite;
mod primitives;

pub use composite::CompositeActivityStorage;
pub use primitives::ActivityPrimitivesStorage;

use std::path::{Path, PathBuf};

use crate::error::{ActivityError, Result};

/// Where a storage keeps its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Location {
    Directory(PathBuf),
    Memory,
}

impl Location {
    pub(crate) fn directory(&self) -> Option<&Path> {
        match self {
            Self::Directory(dir) => Some(dir),
            Self::Memory => None,
        }
    }
}

/// Field names become file stems, so they must not escape the directory.
pub(crate) fn validate_field_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(ActivityError::InvalidFieldName {
            name: name.to_string(),
        });
    }
    Ok(())
}
