//! Index construction
//!
//! The builder assembles both files in memory: a growing record log for the
//! data file and a zeroed slot array for the index file. Nothing touches the
//! filesystem until [`IndexBuilder::finish`], which writes temporary files
//! and renames them into place. A failed build leaves no output behind.

use crate::capacity::Capacity;
use crate::error::{IndexError, Result};
use crate::item::Item;
use crate::key::IndexKey;
use crate::layout::{SLOT_SIZE, Slot, read_slot, write_slot};
use crate::probe::ProbeSequence;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, trace, warn};

/// Summary of a completed build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    /// Items stored
    pub items: u64,
    /// Number of slots in the index file
    pub modulus: u64,
    /// Size of the data file in bytes
    pub data_bytes: u64,
    /// Items that did not land in their first probe slot
    pub displaced: u64,
    /// Most probes any single insert needed
    pub longest_probe: u64,
}

/// Accumulates items into an in-memory table, then writes it out.
pub struct IndexBuilder<V> {
    capacity: Capacity,
    slots: Vec<u8>,
    data: Vec<u8>,
    stats: BuildStats,
    sync: bool,
    _item: PhantomData<fn(&V)>,
}

impl<V: Item> IndexBuilder<V> {
    /// Create an empty builder for a table planned by `capacity`.
    pub fn new(capacity: Capacity) -> Self {
        let modulus = capacity.modulus();
        Self {
            capacity,
            slots: vec![0u8; modulus as usize * SLOT_SIZE],
            data: Vec::new(),
            stats: BuildStats {
                modulus,
                ..BuildStats::default()
            },
            sync: true,
            _item: PhantomData,
        }
    }

    /// Fsync both files before renaming them into place (default `true`).
    #[must_use]
    pub const fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Table parameters this builder was created with.
    pub const fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Number of items inserted so far.
    pub const fn len(&self) -> u64 {
        self.stats.items
    }

    /// Returns `true` if nothing has been inserted.
    pub const fn is_empty(&self) -> bool {
        self.stats.items == 0
    }

    /// Statistics for the items inserted so far.
    pub const fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Place one item in the table.
    ///
    /// Walks the item's probe sequence until an empty slot is found. Meeting
    /// a slot that already holds the same key fails with
    /// [`IndexError::DuplicateKey`].
    pub fn insert(&mut self, item: &V) -> Result<()> {
        self.capacity.check(self.stats.items + 1)?;

        let key = item.key();
        let modulus = self.capacity.modulus();
        for (i, slot) in ProbeSequence::new(&key, modulus).enumerate() {
            let existing = read_slot(&self.slots, slot);
            if existing.is_empty() {
                let value = item.encode().map_err(IndexError::Codec)?;
                let from = self.data.len() as u64;
                key.encode_prefix(&mut self.data);
                self.data.extend_from_slice(&value);
                let to = self.data.len() as u64;
                write_slot(&mut self.slots, slot, Slot { from, to });

                let used = i as u64 + 1;
                self.stats.items += 1;
                self.stats.data_bytes = to;
                self.stats.longest_probe = self.stats.longest_probe.max(used);
                if used > 1 {
                    self.stats.displaced += 1;
                }
                trace!("Stored {} in slot {} after {} probes", key.describe(), slot, used);
                return Ok(());
            }

            let record = &self.data[existing.from as usize..existing.to as usize];
            if key.match_record(record)?.is_some() {
                return Err(IndexError::DuplicateKey(key.describe()));
            }
        }

        Err(IndexError::ProbeExhausted { modulus })
    }

    /// Insert every item from an iterator.
    pub fn insert_all<I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
    {
        for item in items {
            self.insert(&item)?;
        }
        Ok(())
    }

    /// Pull items from a paged source and insert them.
    ///
    /// `fetch(offset)` is called with offsets `0, page_size, 2 * page_size, ..`
    /// while the offset is below `item_count`. An empty page ends the input
    /// early.
    pub fn insert_paged<F>(&mut self, item_count: u64, page_size: usize, mut fetch: F) -> Result<()>
    where
        F: FnMut(usize) -> Result<Vec<V>>,
    {
        self.capacity.check(item_count)?;
        if page_size == 0 {
            return Err(IndexError::InvalidArgument(
                "page size must be greater than zero".into(),
            ));
        }

        let mut offset = 0usize;
        while (offset as u64) < item_count {
            let page = fetch(offset)?;
            if page.is_empty() {
                debug!("Empty page at offset {}, ending input", offset);
                break;
            }
            trace!("Fetched {} items at offset {}", page.len(), offset);
            for item in &page {
                self.insert(item)?;
            }
            offset += page_size;
        }
        Ok(())
    }

    /// Write the data file and the index file.
    ///
    /// Both files are written next to their targets with a `.tmp` suffix,
    /// then renamed data first. On failure every file this call created is
    /// removed.
    pub fn finish(self, index_path: &Path, data_path: &Path) -> Result<BuildStats> {
        let data_tmp = tmp_path(data_path);
        let index_tmp = tmp_path(index_path);
        if index_path == data_path || index_tmp == data_path || data_tmp == index_path {
            return Err(IndexError::InvalidArgument(format!(
                "index {} and data {} would share a file while writing",
                index_path.display(),
                data_path.display()
            )));
        }

        if let Err(e) = self.write_temporaries(&index_tmp, &data_tmp) {
            remove_quietly(&data_tmp);
            remove_quietly(&index_tmp);
            return Err(e);
        }

        if let Err(e) = fs::rename(&data_tmp, data_path) {
            remove_quietly(&data_tmp);
            remove_quietly(&index_tmp);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&index_tmp, index_path) {
            // The new data file must not sit next to an older index
            warn!("Failed to move index into place, removing {}", data_path.display());
            remove_quietly(data_path);
            remove_quietly(&index_tmp);
            return Err(e.into());
        }

        debug!(
            "Wrote {} ({} bytes) and {} ({} bytes)",
            data_path.display(),
            self.data.len(),
            index_path.display(),
            self.slots.len()
        );
        Ok(self.stats)
    }

    /// Build from a paged source and write both files.
    ///
    /// The one-shot form of [`insert_paged`](Self::insert_paged) followed by
    /// [`finish`](Self::finish).
    pub fn build_paged<F>(
        mut self,
        index_path: &Path,
        data_path: &Path,
        item_count: u64,
        page_size: usize,
        fetch: F,
    ) -> Result<BuildStats>
    where
        F: FnMut(usize) -> Result<Vec<V>>,
    {
        let started = Instant::now();
        info!(
            "Building index: {} items, {} slots",
            item_count,
            self.capacity.modulus()
        );

        self.insert_paged(item_count, page_size, fetch)?;
        let stats = self.finish(index_path, data_path)?;

        info!(
            "Built index in {:?}: {} items, {} data bytes, {} displaced, longest probe {}",
            started.elapsed(),
            stats.items,
            stats.data_bytes,
            stats.displaced,
            stats.longest_probe
        );
        Ok(stats)
    }

    /// Build from an in-memory source and write both files.
    pub fn build_from_iter<I>(
        mut self,
        index_path: &Path,
        data_path: &Path,
        items: I,
    ) -> Result<BuildStats>
    where
        I: IntoIterator<Item = V>,
    {
        self.insert_all(items)?;
        let stats = self.finish(index_path, data_path)?;
        info!(
            "Built index: {} items in {} slots, {} data bytes",
            stats.items, stats.modulus, stats.data_bytes
        );
        Ok(stats)
    }

    fn write_temporaries(&self, index_tmp: &Path, data_tmp: &Path) -> Result<()> {
        write_file(data_tmp, &self.data, self.sync)?;
        write_file(index_tmp, &self.slots, self.sync)?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_file(path: &Path, bytes: &[u8], sync: bool) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    if sync {
        file.sync_all()?;
    }
    Ok(())
}

fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!("Failed to remove {}: {}", path.display(), e);
    }
}
