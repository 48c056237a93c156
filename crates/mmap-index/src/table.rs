//! Memory-mapped view of a built table
//!
//! [`MappedTable`] owns read-only mappings of the index file and the data
//! file and implements the probe walk shared by every lookup. It knows
//! nothing about value types; [`crate::IndexReader`] layers decoding on top.

use crate::error::{IndexError, Result};
use crate::key::IndexKey;
use crate::layout::{SLOT_SIZE, Slot, read_slot};
use crate::probe::ProbeSequence;
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// A whole file mapped read-only.
///
/// Empty files are not mapped; they read back as an empty slice.
#[derive(Debug)]
pub struct MappedFile {
    path: PathBuf,
    mmap: Option<Mmap>,
}

impl MappedFile {
    /// Map `path` read-only for the lifetime of the returned value.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();

        let mmap = if size == 0 {
            None
        } else {
            // SAFETY: index files are never written after a build completes.
            #[allow(unsafe_code)]
            let mmap = unsafe { MmapOptions::new().map(&file)? };
            Some(mmap)
        };

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
        })
    }

    /// Mapped bytes.
    pub fn as_slice(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    /// File size in bytes.
    pub fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }

    /// Returns `true` for an empty file.
    pub fn is_empty(&self) -> bool {
        self.mmap.is_none()
    }

    /// Path the mapping was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tell the OS accesses will be scattered.
    fn advise_random(&self) {
        #[cfg(unix)]
        {
            if let Some(mmap) = &self.mmap
                && let Err(e) = mmap.advise(memmap2::Advice::Random)
            {
                debug!("madvise failed for {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Read-only index and data files of one table.
#[derive(Debug)]
pub struct MappedTable {
    index: MappedFile,
    data: MappedFile,
    modulus: u64,
}

impl MappedTable {
    /// Map a table's two files.
    ///
    /// The slot count is taken from the index file size, which must be a
    /// non-zero multiple of the slot size holding at least two slots.
    pub fn open(index_path: &Path, data_path: &Path) -> Result<Self> {
        let index = MappedFile::open(index_path)?;
        let data = MappedFile::open(data_path)?;

        let index_len = index.len();
        if index_len % SLOT_SIZE as u64 != 0 {
            return Err(IndexError::Corrupt(format!(
                "index file {} is {} bytes, not a multiple of {}",
                index_path.display(),
                index_len,
                SLOT_SIZE
            )));
        }
        let modulus = index_len / SLOT_SIZE as u64;
        if modulus < 2 {
            return Err(IndexError::Corrupt(format!(
                "index file {} holds {} slots, need at least 2",
                index_path.display(),
                modulus
            )));
        }

        index.advise_random();
        data.advise_random();

        debug!(
            "Mapped table: {} slots, index {} bytes, data {} bytes",
            modulus,
            index_len,
            data.len()
        );

        Ok(Self {
            index,
            data,
            modulus,
        })
    }

    /// Number of slots.
    pub const fn modulus(&self) -> u64 {
        self.modulus
    }

    /// Size of the data file in bytes.
    pub fn data_len(&self) -> u64 {
        self.data.len()
    }

    /// The mapped index file.
    pub const fn index_file(&self) -> &MappedFile {
        &self.index
    }

    /// The mapped data file.
    pub const fn data_file(&self) -> &MappedFile {
        &self.data
    }

    /// Read slot `slot`. Out-of-range slots read as empty.
    pub fn slot(&self, slot: u64) -> Slot {
        if slot >= self.modulus {
            return Slot::default();
        }
        read_slot(self.index.as_slice(), slot)
    }

    /// Iterate over `(slot number, slot)` for every non-empty slot.
    pub fn occupied(&self) -> impl Iterator<Item = (u64, Slot)> + '_ {
        (0..self.modulus)
            .map(|i| (i, self.slot(i)))
            .filter(|(_, slot)| !slot.is_empty())
    }

    /// Bytes of the record a slot points at.
    pub fn record(&self, slot: Slot) -> Result<&[u8]> {
        let data = self.data.as_slice();
        if slot.from >= slot.to || slot.to > data.len() as u64 {
            warn!(
                "Slot range {}..{} invalid for data file of {} bytes",
                slot.from,
                slot.to,
                data.len()
            );
            return Err(IndexError::Corrupt(format!(
                "slot range {}..{} outside data file of {} bytes",
                slot.from,
                slot.to,
                data.len()
            )));
        }
        Ok(&data[slot.from as usize..slot.to as usize])
    }

    /// Find the value bytes stored under `key`.
    ///
    /// Stops at the first empty slot, or after every slot has been probed.
    pub fn find<K: IndexKey + ?Sized>(&self, key: &K) -> Result<Option<&[u8]>> {
        for slot_index in ProbeSequence::new(key, self.modulus) {
            let slot = self.slot(slot_index);
            if slot.is_empty() {
                return Ok(None);
            }
            if let Some(value) = key.match_record(self.record(slot)?)? {
                return Ok(Some(value));
            }
            trace!("Collision at slot {}", slot_index);
        }
        Ok(None)
    }
}
