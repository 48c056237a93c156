//! Write-once, read-many persistent hash index.
//!
//! An index is bulk-built once into two immutable files and then served
//! through read-only memory mappings:
//!
//! - **Index file**: a prime number of 16-byte slots, each holding the
//!   `[from, to)` span of one record in the data file, or zeros when empty.
//! - **Data file**: records written back to back, each a key prefix followed
//!   by the encoded value.
//!
//! Collisions are resolved with double hashing: a key probes
//! `(h1 + i * h2) mod M` for `i = 0, 1, ..`, where `M` is the prime slot count.
//! Lookups recompute the same sequence and stop at the first matching key
//! or empty slot, so a lookup touches a handful of slots and never loads the
//! dataset into process memory.
//!
//! # Example
//!
//! ```no_run
//! use mmap_index::{IndexConfig, MmapIndex};
//! # use mmap_index::{BoxError, Item};
//! # struct User { name: String }
//! # impl Item for User {
//! #     type Key = String;
//! #     fn key(&self) -> String { self.name.clone() }
//! #     fn encode(&self) -> Result<Vec<u8>, BoxError> { Ok(self.name.clone().into_bytes()) }
//! #     fn decode(b: &[u8]) -> Result<Self, BoxError> { Ok(Self { name: String::from_utf8(b.to_vec())? }) }
//! # }
//! # fn fetch_users(offset: usize, limit: usize) -> mmap_index::Result<Vec<User>> {
//! #     Ok((offset..offset + limit).map(|i| User { name: format!("name:{i}") }).collect())
//! # }
//! # fn main() -> mmap_index::Result<()> {
//! # let count = 1_000_000;
//!
//! let mut index = MmapIndex::<User>::new(IndexConfig::new("./users", 1_000_000))?;
//! index.save(count, 10_000, |offset| fetch_users(offset, 10_000))?;
//! index.load()?;
//! let user = index.get("name:42")?;
//! # let _ = user;
//! # Ok(())
//! # }
//! ```
//!
//! Lower-level building blocks are [`IndexBuilder`] for incremental builds,
//! [`IndexReader`] for typed lookups over explicit paths, and
//! [`MappedTable`] for untyped access to a table's slots and records.

#![warn(missing_docs)]

pub mod builder;
pub mod capacity;
pub mod config;
pub mod error;
pub mod index;
pub mod item;
pub mod key;
pub mod layout;
pub mod probe;
pub mod reader;
pub mod table;
pub mod verify;

pub use builder::{BuildStats, IndexBuilder};
pub use capacity::{Capacity, MAX_ITEM_COUNT, plan};
pub use config::IndexConfig;
pub use error::{BoxError, IndexError, Result};
pub use index::MmapIndex;
pub use item::Item;
pub use key::{IndexKey, KeyKind, StoredKey};
pub use reader::IndexReader;
pub use table::MappedTable;
pub use verify::{TableReport, inspect};
