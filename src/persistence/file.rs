use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::aggregates::AggregatesMetadata;
use crate::config::ActivityConfig;
use crate::error::Result;
use crate::metadata::Metadata;
use crate::persistence::ActivityPersistence;
use crate::storage::{ActivityPrimitivesStorage, CompositeActivityStorage};

/// Persistence rooted at one storage directory.
#[derive(Debug)]
pub struct FileActivityPersistence {
    directory: PathBuf,
    config: Arc<ActivityConfig>,
    metadata: OnceCell<Metadata>,
}

impl FileActivityPersistence {
    #[must_use]
    pub fn new(directory: impl AsRef<Path>, config: Arc<ActivityConfig>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            config,
            metadata: OnceCell::new(),
        }
    }

    /// Whether [`metadata`](ActivityPersistence::metadata) has already run.
    #[must_use]
    pub fn metadata_loaded(&self) -> bool {
        self.metadata.get().is_some()
    }
}

impl ActivityPersistence for FileActivityPersistence {
    fn directory(&self) -> Option<&Path> {
        Some(&self.directory)
    }

    fn config(&self) -> &Arc<ActivityConfig> {
        &self.config
    }

    fn metadata(&self) -> Result<&Metadata> {
        self.metadata
            .get_or_try_init(|| Metadata::init(&self.directory))
    }

    fn composite_storage(&self) -> Result<CompositeActivityStorage> {
        let mut storage = CompositeActivityStorage::new(&self.directory, &self.config);
        storage.init()?;
        Ok(storage)
    }

    fn primitives_storage(&self, field_name: &str) -> Result<ActivityPrimitivesStorage> {
        let mut storage = ActivityPrimitivesStorage::new(field_name, &self.directory, &self.config);
        storage.init()?;
        Ok(storage)
    }

    fn aggregates_metadata(&self, field_name: &str) -> Result<AggregatesMetadata> {
        AggregatesMetadata::open(&self.directory, field_name)
    }
}
