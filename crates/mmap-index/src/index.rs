//! Directory-backed index with a save / load / get lifecycle

use crate::builder::{BuildStats, IndexBuilder};
use crate::capacity::Capacity;
use crate::config::IndexConfig;
use crate::error::{IndexError, Result};
use crate::item::Item;
use crate::key::IndexKey;
use crate::reader::IndexReader;
use std::borrow::Borrow;
use std::fs;
use tracing::debug;

/// An index stored as two files inside one directory.
///
/// The table size is planned from [`IndexConfig::max_item_count`] when the
/// index is created. [`save`](Self::save) writes the files once,
/// [`load`](Self::load) maps them, and [`get`](Self::get) serves lookups.
///
/// # Example
///
/// ```no_run
/// # use mmap_index::{BoxError, IndexConfig, Item, MmapIndex};
/// # #[derive(Debug)]
/// # struct User { name: String }
/// # impl Item for User {
/// #     type Key = String;
/// #     fn key(&self) -> String { self.name.clone() }
/// #     fn encode(&self) -> Result<Vec<u8>, BoxError> { Ok(self.name.clone().into_bytes()) }
/// #     fn decode(b: &[u8]) -> Result<Self, BoxError> { Ok(Self { name: String::from_utf8(b.to_vec())? }) }
/// # }
/// # fn main() -> mmap_index::Result<()> {
/// let users: Vec<User> = (0..100).map(|i| User { name: format!("name:{i}") }).collect();
///
/// let mut index = MmapIndex::<User>::new(IndexConfig::new("/tmp/users", 100))?;
/// index.save(100, 10, |offset| {
///     Ok(users[offset..offset + 10]
///         .iter()
///         .map(|u| User { name: u.name.clone() })
///         .collect())
/// })?;
/// index.load()?;
///
/// assert_eq!(index.get("name:42")?.name, "name:42");
/// assert!(index.get("name:100").unwrap_err().is_not_found());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MmapIndex<V> {
    config: IndexConfig,
    capacity: Capacity,
    reader: Option<IndexReader<V>>,
}

impl<V: Item> MmapIndex<V> {
    /// Plan the table and create the index directory.
    pub fn new(config: IndexConfig) -> Result<Self> {
        let capacity = Capacity::for_items(config.max_item_count)?;
        fs::create_dir_all(&config.directory)?;
        debug!(
            "Index at {}: {} slots for up to {} items",
            config.directory.display(),
            capacity.modulus(),
            capacity.max_item_count()
        );
        Ok(Self {
            config,
            capacity,
            reader: None,
        })
    }

    /// Build the index from a paged source.
    ///
    /// `fetch(offset)` returns up to `page_size` items starting at `offset`;
    /// an empty page ends the input. Any loaded reader is released, so
    /// [`load`](Self::load) must be called again before the next lookup.
    pub fn save<F>(&mut self, item_count: u64, page_size: usize, fetch: F) -> Result<BuildStats>
    where
        F: FnMut(usize) -> Result<Vec<V>>,
    {
        self.capacity.check(item_count)?;
        self.reader = None;
        IndexBuilder::new(self.capacity)
            .with_sync(self.config.sync_on_write)
            .build_paged(
                &self.config.index_path(),
                &self.config.data_path(),
                item_count,
                page_size,
                fetch,
            )
    }

    /// Map the index and data files.
    ///
    /// Fails with [`IndexError::Corrupt`] if the index was built for a
    /// different table size.
    pub fn load(&mut self) -> Result<()> {
        let reader = IndexReader::open(&self.config.index_path(), &self.config.data_path())?;
        if reader.modulus() != self.capacity.modulus() {
            return Err(IndexError::Corrupt(format!(
                "index has {} slots, expected {}",
                reader.modulus(),
                self.capacity.modulus()
            )));
        }
        self.reader = Some(reader);
        Ok(())
    }

    /// Look up the item stored under `key`.
    pub fn get<Q>(&self, key: &Q) -> Result<V>
    where
        V::Key: Borrow<Q>,
        Q: IndexKey + ?Sized,
    {
        self.reader()?.get(key)
    }

    /// The loaded reader.
    pub fn reader(&self) -> Result<&IndexReader<V>> {
        self.reader.as_ref().ok_or(IndexError::NotLoaded)
    }

    /// Returns `true` once [`load`](Self::load) has succeeded.
    pub const fn is_loaded(&self) -> bool {
        self.reader.is_some()
    }

    /// Number of slots in the table.
    pub const fn modulus(&self) -> u64 {
        self.capacity.modulus()
    }

    /// Largest number of items a build may store.
    pub const fn max_item_count(&self) -> u64 {
        self.capacity.max_item_count()
    }

    /// The configuration this index was created with.
    pub const fn config(&self) -> &IndexConfig {
        &self.config
    }
}
