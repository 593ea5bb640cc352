//! Fixed-width slot arrays, either memory mapped from a file or held on the heap.

use std::path::{Path, PathBuf};

use memmap2::{MmapMut, MmapOptions};

use crate::error::{ActivityError, Result};

/// A growable array of `width`-byte slots addressed by document index.
#[derive(Debug)]
pub(crate) struct Column {
    width: usize,
    grow_step: usize,
    backing: Backing,
}

#[derive(Debug)]
enum Backing {
    Mapped {
        path: PathBuf,
        file: fs_err::File,
        // Zero-length files cannot be mapped on every platform.
        map: Option<MmapMut>,
    },
    Heap(Vec<u8>),
}

impl Column {
    /// Open (creating if absent) the file at `path` and map it.
    pub(crate) fn open(path: &Path, width: usize, grow_step: usize) -> Result<Self> {
        let file = fs_err::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|err| ActivityError::io(path, err))?;
        let len = file
            .metadata()
            .map_err(|err| ActivityError::io(path, err))?
            .len();
        if len % width as u64 != 0 {
            return Err(ActivityError::init(
                path.display().to_string(),
                format!("file length {len} is not a multiple of slot width {width}"),
            ));
        }
        let map = if len == 0 {
            None
        } else {
            Some(map_file(&file, path)?)
        };
        tracing::debug!(
            activity.path = %path.display(),
            activity.slots = len / width as u64,
            "opened mapped column"
        );
        Ok(Self {
            width,
            grow_step: grow_step.max(1),
            backing: Backing::Mapped {
                path: path.to_path_buf(),
                file,
                map,
            },
        })
    }

    pub(crate) fn heap(width: usize, grow_step: usize) -> Self {
        Self {
            width,
            grow_step: grow_step.max(1),
            backing: Backing::Heap(Vec::new()),
        }
    }

    pub(crate) fn path(&self) -> Option<&Path> {
        match &self.backing {
            Backing::Mapped { path, .. } => Some(path),
            Backing::Heap(_) => None,
        }
    }

    /// Number of addressable slots, including never-written ones.
    pub(crate) fn len(&self) -> usize {
        self.bytes().len() / self.width
    }

    pub(crate) fn slot(&self, index: usize) -> Option<&[u8]> {
        let start = index.checked_mul(self.width)?;
        self.bytes().get(start..start.checked_add(self.width)?)
    }

    /// Overwrite one slot, growing the column in `grow_step` chunks when needed.
    pub(crate) fn write_slot(&mut self, index: usize, bytes: &[u8]) -> Result<()> {
        debug_assert_eq!(bytes.len(), self.width);
        let needed = index
            .checked_add(1)
            .filter(|needed| needed.checked_mul(self.width).is_some())
            .ok_or_else(|| self.capacity_error(index))?;
        self.ensure_slots(needed, index)?;
        let start = index * self.width;
        let width = self.width;
        if let Some(dst) = self.bytes_mut().get_mut(start..start + width) {
            dst.copy_from_slice(bytes);
        }
        Ok(())
    }

    /// Push dirty mapped pages to disk.
    pub(crate) fn flush(&self) -> Result<()> {
        match &self.backing {
            Backing::Mapped {
                path,
                map: Some(map),
                ..
            } => map.flush().map_err(|err| ActivityError::io(path, err)),
            _ => Ok(()),
        }
    }

    fn ensure_slots(&mut self, needed: usize, index: usize) -> Result<()> {
        if needed <= self.len() {
            return Ok(());
        }
        // Mappings and slices cannot exceed `isize::MAX` bytes.
        let bytes = needed
            .div_ceil(self.grow_step)
            .checked_mul(self.grow_step)
            .and_then(|slots| slots.checked_mul(self.width))
            .filter(|bytes| isize::try_from(*bytes).is_ok())
            .ok_or_else(|| self.capacity_error(index))?;
        let slots = bytes / self.width;
        match &mut self.backing {
            Backing::Mapped { path, file, map } => {
                // The old mapping stays in place until the grown one exists, so a
                // failed grow leaves the column exactly as it was.
                if let Some(old) = map.as_ref() {
                    old.flush().map_err(|err| ActivityError::io(&*path, err))?;
                }
                let on_disk = file
                    .metadata()
                    .map_err(|err| ActivityError::io(&*path, err))?
                    .len();
                if (bytes as u64) > on_disk {
                    file.set_len(bytes as u64)
                        .map_err(|err| ActivityError::io(&*path, err))?;
                }
                *map = Some(map_file(file, path)?);
                tracing::debug!(
                    activity.path = %path.display(),
                    activity.slots = slots,
                    "grew mapped column"
                );
            }
            Backing::Heap(buf) => {
                let extra = bytes - buf.len();
                if buf.try_reserve_exact(extra).is_err() {
                    return Err(self.capacity_error(index));
                }
                buf.resize(bytes, 0);
            }
        }
        Ok(())
    }

    fn bytes(&self) -> &[u8] {
        match &self.backing {
            Backing::Mapped { map, .. } => map.as_deref().unwrap_or_default(),
            Backing::Heap(buf) => buf,
        }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        match &mut self.backing {
            Backing::Mapped { map, .. } => map.as_deref_mut().unwrap_or_default(),
            Backing::Heap(buf) => buf,
        }
    }

    fn capacity_error(&self, index: usize) -> ActivityError {
        let target = self
            .path()
            .map_or_else(|| "in-memory column".to_string(), |p| p.display().to_string());
        ActivityError::CapacityExceeded { target, index }
    }
}

fn map_file(file: &fs_err::File, path: &Path) -> Result<MmapMut> {
    // SAFETY: the mapping lives inside the `Column` that owns the file handle,
    // and the file is only ever extended, never truncated, while mapped. Other
    // processes writing the same file concurrently is outside the supported usage.
    unsafe { MmapOptions::new().map_mut(file.file()) }.map_err(|err| ActivityError::io(path, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn fresh_file_is_empty_until_written() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("clicks.data");
        let mut column = Column::open(&path, 4, 8).expect("open");
        assert_eq!(column.len(), 0);
        assert!(column.slot(0).is_none());

        column.write_slot(3, &7i32.to_le_bytes()).expect("write");
        assert_eq!(column.len(), 8);
        assert_eq!(column.slot(3), Some(&7i32.to_le_bytes()[..]));
        assert_eq!(column.slot(2), Some(&[0u8; 4][..]));
        assert_eq!(std::fs::metadata(&path).expect("meta").len(), 32);
    }

    #[test]
    fn contents_survive_reopen() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("clicks.data");
        {
            let mut column = Column::open(&path, 8, 4).expect("open");
            column.write_slot(9, &99u64.to_le_bytes()).expect("write");
            column.flush().expect("flush");
        }
        let column = Column::open(&path, 8, 4).expect("reopen");
        assert_eq!(column.len(), 12);
        assert_eq!(column.slot(9), Some(&99u64.to_le_bytes()[..]));
    }

    #[test]
    fn torn_length_fails_initialisation() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("broken.data");
        std::fs::write(&path, [1u8, 2, 3]).expect("seed");
        let err = Column::open(&path, 4, 8).expect_err("torn file");
        assert!(err.is_initialization());
    }

    #[test]
    fn heap_column_grows_without_touching_disk() {
        let mut column = Column::heap(4, 2);
        assert!(column.path().is_none());
        column.write_slot(4, &(-5i32).to_le_bytes()).expect("write");
        assert_eq!(column.len(), 6);
        assert_eq!(column.slot(4), Some(&(-5i32).to_le_bytes()[..]));
        column.flush().expect("flush is a no-op");
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn oversized_index_reports_capacity_and_keeps_values() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("clicks.data");
        let mut column = Column::open(&path, 4, 16).expect("open");
        column.write_slot(5, &42i32.to_le_bytes()).expect("write");
        column.write_slot(20, &77i32.to_le_bytes()).expect("write");
        column.flush().expect("flush");

        let err = column
            .write_slot(1 << 61, &1i32.to_le_bytes())
            .expect_err("index past addressable size");
        assert!(matches!(err, ActivityError::CapacityExceeded { index, .. } if index == 1 << 61));
        assert_eq!(column.len(), 32);
        assert_eq!(column.slot(5), Some(&42i32.to_le_bytes()[..]));

        column.write_slot(1, &9i32.to_le_bytes()).expect("small write");
        column.flush().expect("flush");
        drop(column);
        assert_eq!(std::fs::metadata(&path).expect("meta").len(), 128);
        let reopened = Column::open(&path, 4, 16).expect("reopen");
        assert_eq!(reopened.slot(20), Some(&77i32.to_le_bytes()[..]));
        assert_eq!(reopened.slot(1), Some(&9i32.to_le_bytes()[..]));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn failed_grow_leaves_the_mapping_in_place() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("clicks.data");
        let mut column = Column::open(&path, 4, 16).expect("open");
        column.write_slot(20, &77i32.to_le_bytes()).expect("write");

        // Within the addressable limit, but no filesystem or address space
        // accepts a mapping this large.
        let huge = (isize::MAX as usize / 4) - 1024;
        assert!(column.write_slot(huge, &1i32.to_le_bytes()).is_err());

        assert_eq!(column.len(), 32);
        assert_eq!(column.slot(20), Some(&77i32.to_le_bytes()[..]));
        column.write_slot(1, &9i32.to_le_bytes()).expect("small write");
        assert_eq!(column.slot(1), Some(&9i32.to_le_bytes()[..]));
        assert_eq!(column.slot(20), Some(&77i32.to_le_bytes()[..]));
    }

    #[test]
    fn absurd_index_reports_capacity() {
        let mut column = Column::heap(8, 1);
        let err = column
            .write_slot(usize::MAX, &0u64.to_le_bytes())
            .expect_err("overflow");
        assert!(matches!(err, ActivityError::CapacityExceeded { .. }));
    }
}
