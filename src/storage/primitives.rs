//! Per-field raw value array keyed by document index.

use std::path::Path;

use crate::config::ActivityConfig;
use crate::constants::{PRIMITIVES_EXTENSION, VALUE_SLOT_WIDTH};
use crate::error::{ActivityError, Result};
use crate::io::column::Column;
use crate::storage::{Location, validate_field_name};

/// Raw `i32` activity values for a single field.
///
/// Construction only records where the values live; [`init`](Self::init) must
/// succeed before any read or write. On disk the values are a little-endian
/// `i32` array in `<dir>/<field>.data`.
#[derive(Debug)]
pub struct ActivityPrimitivesStorage {
    field_name: String,
    location: Location,
    grow_step: usize,
    column: Option<Column>,
}

impl ActivityPrimitivesStorage {
    #[must_use]
    pub fn new(
        field_name: impl Into<String>,
        directory: impl AsRef<Path>,
        config: &ActivityConfig,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            location: Location::Directory(directory.as_ref().to_path_buf()),
            grow_step: config.grow_step,
            column: None,
        }
    }

    /// A heap-backed storage that never touches the filesystem.
    #[must_use]
    pub fn in_memory(field_name: impl Into<String>, config: &ActivityConfig) -> Self {
        Self {
            field_name: field_name.into(),
            location: Location::Memory,
            grow_step: config.grow_step,
            column: None,
        }
    }

    /// Open or create the backing array. Must be called exactly once.
    pub fn init(&mut self) -> Result<()> {
        if self.column.is_some() {
            return Err(ActivityError::init(self.target(), "init() called twice"));
        }
        validate_field_name(&self.field_name)
            .map_err(|err| ActivityError::init(self.target(), err.to_string()))?;
        let column = match &self.location {
            Location::Directory(dir) => {
                let path = dir.join(format!("{}.{PRIMITIVES_EXTENSION}", self.field_name));
                Column::open(&path, VALUE_SLOT_WIDTH, self.grow_step).map_err(|err| match err {
                    ActivityError::Initialization { .. } => err,
                    other => ActivityError::init(self.target(), other.to_string()),
                })?
            }
            Location::Memory => Column::heap(VALUE_SLOT_WIDTH, self.grow_step),
        };
        self.column = Some(column);
        Ok(())
    }

    #[must_use]
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.column.is_some()
    }

    /// Backing file, once initialised against a directory.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.column.as_ref().and_then(Column::path)
    }

    /// Value for `index`; slots never written read as zero.
    pub fn get(&self, index: usize) -> Result<i32> {
        let column = self.column()?;
        Ok(column
            .slot(index)
            .and_then(|bytes| <[u8; VALUE_SLOT_WIDTH]>::try_from(bytes).ok())
            .map_or(0, i32::from_le_bytes))
    }

    pub fn set(&mut self, index: usize, value: i32) -> Result<()> {
        self.column_mut()?.write_slot(index, &value.to_le_bytes())
    }

    /// Number of addressable slots.
    pub fn len(&self) -> Result<usize> {
        Ok(self.column()?.len())
    }

    pub fn flush(&self) -> Result<()> {
        self.column()?.flush()
    }

    fn column(&self) -> Result<&Column> {
        self.column.as_ref().ok_or_else(|| ActivityError::NotInitialized {
            target: self.target(),
        })
    }

    fn column_mut(&mut self) -> Result<&mut Column> {
        let Self {
            field_name,
            location,
            column,
            ..
        } = self;
        column.as_mut().ok_or_else(|| ActivityError::NotInitialized {
            target: describe(field_name, location),
        })
    }

    fn target(&self) -> String {
        describe(&self.field_name, &self.location)
    }
}

fn describe(field_name: &str, location: &Location) -> String {
    match location.directory() {
        Some(dir) => format!("primitives storage {field_name:?} in {}", dir.display()),
        None => format!("in-memory primitives storage {field_name:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config() -> ActivityConfig {
        ActivityConfig::builder().grow_step(16).build().expect("config")
    }

    #[test]
    fn use_before_init_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let mut storage = ActivityPrimitivesStorage::new("clicks", dir.path(), &config());
        assert!(matches!(
            storage.get(0),
            Err(ActivityError::NotInitialized { .. })
        ));
        assert!(matches!(
            storage.set(0, 1),
            Err(ActivityError::NotInitialized { .. })
        ));
        assert!(!dir.path().join("clicks.data").exists());
    }

    #[test]
    fn values_persist_across_handles() {
        let dir = TempDir::new().expect("tempdir");
        {
            let mut storage = ActivityPrimitivesStorage::new("clicks", dir.path(), &config());
            storage.init().expect("init");
            storage.set(5, 42).expect("set");
            storage.set(20, -3).expect("set");
            storage.flush().expect("flush");
        }
        let mut storage = ActivityPrimitivesStorage::new("clicks", dir.path(), &config());
        storage.init().expect("init");
        assert_eq!(storage.get(5).expect("get"), 42);
        assert_eq!(storage.get(20).expect("get"), -3);
        assert_eq!(storage.get(6).expect("get"), 0);
        assert_eq!(storage.get(10_000).expect("get past end"), 0);
        assert_eq!(storage.len().expect("len"), 32);
        assert_eq!(storage.path(), Some(dir.path().join("clicks.data").as_path()));
    }

    #[test]
    fn double_init_is_an_initialization_error() {
        let mut storage = ActivityPrimitivesStorage::in_memory("clicks", &config());
        storage.init().expect("first init");
        let err = storage.init().expect_err("second init");
        assert!(err.is_initialization());
    }

    #[test]
    fn missing_directory_fails_init() {
        let dir = TempDir::new().expect("tempdir");
        let mut storage =
            ActivityPrimitivesStorage::new("clicks", dir.path().join("absent"), &config());
        let err = storage.init().expect_err("missing dir");
        assert!(err.is_initialization());
        assert!(!storage.is_initialized());
    }

    #[test]
    fn bad_field_name_fails_init() {
        let dir = TempDir::new().expect("tempdir");
        let mut storage = ActivityPrimitivesStorage::new("../escape", dir.path(), &config());
        assert!(storage.init().expect_err("bad name").is_initialization());
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn rejected_oversized_write_keeps_persisted_values() {
        let dir = TempDir::new().expect("tempdir");
        {
            let mut storage = ActivityPrimitivesStorage::new("clicks", dir.path(), &config());
            storage.init().expect("init");
            storage.set(5, 42).expect("set");
            storage.set(20, 77).expect("set");
            storage.flush().expect("flush");

            let err = storage.set(1 << 61, 1).expect_err("oversized index");
            assert!(matches!(err, ActivityError::CapacityExceeded { .. }));
            assert_eq!(storage.get(5).expect("get"), 42);
            assert_eq!(storage.len().expect("len"), 32);

            storage.set(1, 9).expect("set");
            storage.flush().expect("flush");
        }
        let mut storage = ActivityPrimitivesStorage::new("clicks", dir.path(), &config());
        storage.init().expect("reinit");
        assert_eq!(storage.get(20).expect("get"), 77);
        assert_eq!(storage.get(1).expect("get"), 9);
    }

    #[test]
    fn in_memory_storage_has_no_path() {
        let mut storage = ActivityPrimitivesStorage::in_memory("boost", &config());
        storage.init().expect("init");
        storage.set(1, 9).expect("set");
        assert_eq!(storage.get(1).expect("get"), 9);
        assert!(storage.path().is_none());
    }
}
