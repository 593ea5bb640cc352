//! Directory-level bookkeeping for an activity storage partition.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{METADATA_FILE, METADATA_VERSION};
use crate::error::{ActivityError, Result};
use crate::io::atomic::{read_if_exists, write_atomic};

/// Format version and document count recorded for a storage directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub version: String,
    pub count: u32,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            version: METADATA_VERSION.to_string(),
            count: 0,
        }
    }
}

impl Metadata {
    /// Read the metadata of `directory`, writing defaults when none exist yet.
    pub fn init(directory: &Path) -> Result<Self> {
        let path = metadata_path(directory);
        match read_if_exists(&path)? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|err| {
                ActivityError::MetadataCorrupted {
                    path: path.clone(),
                    reason: err.to_string(),
                }
            }),
            None => {
                let metadata = Self::default();
                metadata.persist(directory)?;
                tracing::debug!(activity.path = %path.display(), "created directory metadata");
                Ok(metadata)
            }
        }
    }

    pub fn persist(&self, directory: &Path) -> Result<()> {
        let path = metadata_path(directory);
        let bytes = serde_json::to_vec(self).map_err(|err| ActivityError::MetadataCorrupted {
            path: path.clone(),
            reason: err.to_string(),
        })?;
        write_atomic(&path, &bytes)
    }
}

fn metadata_path(directory: &Path) -> PathBuf {
    directory.join(METADATA_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_creates_defaults_once() {
        let dir = TempDir::new().expect("tempdir");
        let metadata = Metadata::init(dir.path()).expect("init");
        assert_eq!(metadata, Metadata::default());
        assert!(dir.path().join(METADATA_FILE).exists());
    }

    #[test]
    fn persisted_count_is_read_back() {
        let dir = TempDir::new().expect("tempdir");
        let mut metadata = Metadata::init(dir.path()).expect("init");
        metadata.count = 17;
        metadata.persist(dir.path()).expect("persist");
        assert_eq!(Metadata::init(dir.path()).expect("reinit").count, 17);
    }

    #[test]
    fn garbage_is_reported_as_corruption() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join(METADATA_FILE), "not json").expect("seed");
        let err = Metadata::init(dir.path()).expect_err("corrupt");
        assert!(matches!(err, ActivityError::MetadataCorrupted { .. }));
    }
}
