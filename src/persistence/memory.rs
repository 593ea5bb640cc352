use std::path::Path;
use std::sync::Arc;

use crate::aggregates::AggregatesMetadata;
use crate::config::ActivityConfig;
use crate::error::Result;
use crate::metadata::Metadata;
use crate::persistence::ActivityPersistence;
use crate::storage::{
    ActivityPrimitivesStorage, CompositeActivityStorage, validate_field_name,
};

/// Heap-only persistence. Every storage and watermark it hands out starts
/// empty and is gone once dropped.
#[derive(Debug)]
pub struct InMemoryActivityPersistence {
    config: Arc<ActivityConfig>,
    metadata: Metadata,
}

impl InMemoryActivityPersistence {
    #[must_use]
    pub fn new(config: Arc<ActivityConfig>) -> Self {
        Self {
            config,
            metadata: Metadata::default(),
        }
    }
}

impl ActivityPersistence for InMemoryActivityPersistence {
    fn directory(&self) -> Option<&Path> {
        None
    }

    fn config(&self) -> &Arc<ActivityConfig> {
        &self.config
    }

    fn metadata(&self) -> Result<&Metadata> {
        Ok(&self.metadata)
    }

    fn composite_storage(&self) -> Result<CompositeActivityStorage> {
        let mut storage = CompositeActivityStorage::in_memory(&self.config);
        storage.init()?;
        Ok(storage)
    }

    fn primitives_storage(&self, field_name: &str) -> Result<ActivityPrimitivesStorage> {
        let mut storage = ActivityPrimitivesStorage::in_memory(field_name, &self.config);
        storage.init()?;
        Ok(storage)
    }

    fn aggregates_metadata(&self, field_name: &str) -> Result<AggregatesMetadata> {
        validate_field_name(field_name)?;
        Ok(AggregatesMetadata::in_memory(field_name))
    }
}
