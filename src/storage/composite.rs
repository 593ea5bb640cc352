//! Unified read/write view over every field of one index partition.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::config::ActivityConfig;
use crate::constants::{COMPOSITE_INDEX_FILE, EMPTY_UID, PRIMITIVES_EXTENSION, UID_SLOT_WIDTH};
use crate::error::{ActivityError, Result};
use crate::io::column::Column;
use crate::storage::{ActivityPrimitivesStorage, Location, validate_field_name};

/// Document uid column plus the primitive storages of a partition.
///
/// Slot `i` of every field belongs to the document whose uid sits in slot `i`
/// of `activity.indexes`. A uid of zero marks a free slot.
#[derive(Debug)]
pub struct CompositeActivityStorage {
    location: Location,
    config: ActivityConfig,
    state: Option<State>,
}

#[derive(Debug)]
struct State {
    uids: Column,
    positions: HashMap<u64, usize>,
    fields: BTreeMap<String, ActivityPrimitivesStorage>,
}

impl CompositeActivityStorage {
    #[must_use]
    pub fn new(directory: impl AsRef<Path>, config: &ActivityConfig) -> Self {
        Self {
            location: Location::Directory(directory.as_ref().to_path_buf()),
            config: config.clone(),
            state: None,
        }
    }

    #[must_use]
    pub fn in_memory(config: &ActivityConfig) -> Self {
        Self {
            location: Location::Memory,
            config: config.clone(),
            state: None,
        }
    }

    /// Map the uid column and open every field storage found in the directory.
    pub fn init(&mut self) -> Result<()> {
        if self.state.is_some() {
            return Err(ActivityError::init(self.target(), "init() called twice"));
        }
        let state = match &self.location {
            Location::Directory(dir) => self.open_directory(dir)?,
            Location::Memory => State {
                uids: Column::heap(UID_SLOT_WIDTH, self.config.grow_step),
                positions: HashMap::new(),
                fields: BTreeMap::new(),
            },
        };
        self.state = Some(state);
        Ok(())
    }

    fn open_directory(&self, dir: &Path) -> Result<State> {
        let wrap = |err: ActivityError| match err {
            ActivityError::Initialization { .. } => err,
            other => ActivityError::init(self.target(), other.to_string()),
        };
        let uids = Column::open(
            &dir.join(COMPOSITE_INDEX_FILE),
            UID_SLOT_WIDTH,
            self.config.grow_step,
        )
        .map_err(wrap)?;

        let mut positions = HashMap::new();
        for index in 0..uids.len() {
            let uid = read_uid(&uids, index);
            if uid != EMPTY_UID {
                positions.insert(uid, index);
            }
        }

        let mut fields = BTreeMap::new();
        let entries = fs_err::read_dir(dir).map_err(|err| wrap(ActivityError::io(dir, err)))?;
        for entry in entries {
            let entry = entry.map_err(|err| wrap(ActivityError::io(dir, err)))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(PRIMITIVES_EXTENSION) {
                continue;
            }
            let Some(field) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let mut storage = ActivityPrimitivesStorage::new(field, dir, &self.config);
            storage.init()?;
            fields.insert(field.to_string(), storage);
        }

        tracing::debug!(
            activity.dir = %dir.display(),
            activity.documents = positions.len(),
            activity.fields = fields.len(),
            "composite storage initialised"
        );
        Ok(State {
            uids,
            positions,
            fields,
        })
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    #[must_use]
    pub fn directory(&self) -> Option<&Path> {
        self.location.directory()
    }

    /// Uid stored at `index`, or `None` for a free or out-of-range slot.
    pub fn uid(&self, index: usize) -> Result<Option<u64>> {
        let state = self.state()?;
        if index >= state.uids.len() {
            return Ok(None);
        }
        Ok(Some(read_uid(&state.uids, index)).filter(|uid| *uid != EMPTY_UID))
    }

    /// Bind `uid` to slot `index`, replacing whatever uid held it before.
    ///
    /// A uid occupies at most one slot: if it was bound elsewhere, that slot
    /// is freed.
    pub fn set_uid(&mut self, index: usize, uid: u64) -> Result<()> {
        let state = self.state_mut()?;
        let previous = if index < state.uids.len() {
            read_uid(&state.uids, index)
        } else {
            EMPTY_UID
        };
        state.uids.write_slot(index, &uid.to_le_bytes())?;
        if previous != EMPTY_UID
            && previous != uid
            && state.positions.get(&previous) == Some(&index)
        {
            state.positions.remove(&previous);
        }
        if uid != EMPTY_UID {
            if let Some(stale) = state.positions.insert(uid, index) {
                if stale != index {
                    state.uids.write_slot(stale, &EMPTY_UID.to_le_bytes())?;
                }
            }
        }
        Ok(())
    }

    pub fn index_of(&self, uid: u64) -> Result<Option<usize>> {
        Ok(self.state()?.positions.get(&uid).copied())
    }

    /// Raw value of `field` at `index`; unknown fields read as zero.
    pub fn get(&self, field_name: &str, index: usize) -> Result<i32> {
        match self.state()?.fields.get(field_name) {
            Some(storage) => storage.get(index),
            None => Ok(0),
        }
    }

    /// Write a raw value, creating the field's storage on first use.
    pub fn set(&mut self, field_name: &str, index: usize, value: i32) -> Result<()> {
        validate_field_name(field_name)?;
        let Self {
            location,
            config,
            state,
        } = self;
        let state = initialized(state, location)?;
        if let Some(storage) = state.fields.get_mut(field_name) {
            return storage.set(index, value);
        }
        let mut storage = match location {
            Location::Directory(dir) => ActivityPrimitivesStorage::new(field_name, dir, config),
            Location::Memory => ActivityPrimitivesStorage::in_memory(field_name, config),
        };
        storage.init()?;
        storage.set(index, value)?;
        state.fields.insert(field_name.to_string(), storage);
        Ok(())
    }

    pub fn field_names(&self) -> Result<Vec<&str>> {
        Ok(self.state()?.fields.keys().map(String::as_str).collect())
    }

    pub fn field(&self, field_name: &str) -> Result<Option<&ActivityPrimitivesStorage>> {
        Ok(self.state()?.fields.get(field_name))
    }

    /// Number of slots in the uid column.
    pub fn len(&self) -> Result<usize> {
        Ok(self.state()?.uids.len())
    }

    /// Number of slots currently bound to a uid.
    pub fn document_count(&self) -> Result<usize> {
        Ok(self.state()?.positions.len())
    }

    pub fn flush(&self) -> Result<()> {
        let state = self.state()?;
        state.uids.flush()?;
        for storage in state.fields.values() {
            storage.flush()?;
        }
        Ok(())
    }

    fn state(&self) -> Result<&State> {
        self.state.as_ref().ok_or_else(|| ActivityError::NotInitialized {
            target: self.target(),
        })
    }

    fn state_mut(&mut self) -> Result<&mut State> {
        initialized(&mut self.state, &self.location)
    }

    fn target(&self) -> String {
        describe(&self.location)
    }
}

fn initialized<'a>(state: &'a mut Option<State>, location: &Location) -> Result<&'a mut State> {
    state.as_mut().ok_or_else(|| ActivityError::NotInitialized {
        target: describe(location),
    })
}

fn describe(location: &Location) -> String {
    match location.directory() {
        Some(dir) => format!("composite storage in {}", dir.display()),
        None => "in-memory composite storage".to_string(),
    }
}

fn read_uid(column: &Column, index: usize) -> u64 {
    column
        .slot(index)
        .and_then(|bytes| <[u8; UID_SLOT_WIDTH]>::try_from(bytes).ok())
        .map_or(EMPTY_UID, u64::from_le_bytes)
}
