//! Error types for index build and lookup operations

use std::io;
use thiserror::Error;

/// Boxed error returned by value codecs and page sources.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while building or reading an index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The requested item count does not fit the table.
    #[error("item count limit over: {requested} > {limit}")]
    CapacityExceeded {
        /// Number of items requested or produced
        requested: u64,
        /// Largest item count the table accepts
        limit: u64,
    },

    /// Two items with the same key were supplied during a build.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// Every slot along a key's probe sequence was occupied.
    ///
    /// The capacity checks make this unreachable; seeing it means the table
    /// invariant was broken somewhere.
    #[error("cannot store: all {modulus} slots probed without finding an empty one")]
    ProbeExhausted {
        /// Table size that was exhausted
        modulus: u64,
    },

    /// The key is not present in the index.
    #[error("not found")]
    NotFound,

    /// I/O error while creating, writing, opening or mapping a file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The value codec failed to encode or decode an item.
    #[error("codec error: {0}")]
    Codec(#[source] BoxError),

    /// The caller's page source returned an error.
    #[error("page source error: {0}")]
    Source(#[source] BoxError),

    /// An argument was outside its accepted range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The index or data file does not have the expected layout.
    #[error("corrupt index: {0}")]
    Corrupt(String),

    /// A lookup was attempted before the index files were loaded.
    #[error("index not loaded")]
    NotLoaded,
}

impl IndexError {
    /// Wrap a value codec failure.
    pub fn codec(err: impl Into<BoxError>) -> Self {
        Self::Codec(err.into())
    }

    /// Wrap a page source failure.
    pub fn page_source(err: impl Into<BoxError>) -> Self {
        Self::Source(err.into())
    }

    /// Returns `true` for a lookup miss.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Result type for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
