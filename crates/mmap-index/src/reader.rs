//! Typed lookups over a mapped table

use crate::error::{IndexError, Result};
use crate::item::Item;
use crate::key::IndexKey;
use crate::table::MappedTable;
use std::borrow::Borrow;
use std::marker::PhantomData;
use std::path::Path;
use tracing::info;

/// Serves point lookups from a built index.
///
/// The reader holds both mappings until it is dropped. It has no mutable
/// state, so a shared reference can be used from any number of threads.
#[derive(Debug)]
pub struct IndexReader<V> {
    table: MappedTable,
    _item: PhantomData<fn() -> V>,
}

impl<V: Item> IndexReader<V> {
    /// Map the index and data files written by a build.
    pub fn open(index_path: &Path, data_path: &Path) -> Result<Self> {
        let table = MappedTable::open(index_path, data_path)?;
        info!(
            "Opened index {} ({} slots, {} data bytes)",
            index_path.display(),
            table.modulus(),
            table.data_len()
        );
        Ok(Self::from_table(table))
    }

    /// Wrap an already mapped table.
    pub const fn from_table(table: MappedTable) -> Self {
        Self {
            table,
            _item: PhantomData,
        }
    }

    /// Look up and decode the item stored under `key`.
    ///
    /// Returns [`IndexError::NotFound`] when the key was never stored.
    pub fn get<Q>(&self, key: &Q) -> Result<V>
    where
        V::Key: Borrow<Q>,
        Q: IndexKey + ?Sized,
    {
        let bytes = self.get_raw(key)?;
        V::decode(bytes).map_err(IndexError::Codec)
    }

    /// Encoded value bytes stored under `key`, borrowed from the mapping.
    pub fn get_raw<Q>(&self, key: &Q) -> Result<&[u8]>
    where
        V::Key: Borrow<Q>,
        Q: IndexKey + ?Sized,
    {
        self.table.find(key)?.ok_or(IndexError::NotFound)
    }

    /// Returns `true` if `key` is stored.
    pub fn contains<Q>(&self, key: &Q) -> Result<bool>
    where
        V::Key: Borrow<Q>,
        Q: IndexKey + ?Sized,
    {
        Ok(self.table.find(key)?.is_some())
    }

    /// Number of slots in the table.
    pub const fn modulus(&self) -> u64 {
        self.table.modulus()
    }

    /// The untyped table behind this reader.
    pub const fn table(&self) -> &MappedTable {
        &self.table
    }
}
