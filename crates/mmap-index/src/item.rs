//! Value codec contract
//!
//! Values stored in the index serialize themselves and report their own key.
//! The encoded length is not stored; a value's bytes run from the end of its
//! key prefix to the end of its record.

use crate::error::BoxError;
use crate::key::IndexKey;

/// A value that can be stored in and read back from the index.
///
/// # Example
///
/// ```
/// use mmap_index::{BoxError, Item};
///
/// struct Word {
///     text: String,
///     count: u32,
/// }
///
/// impl Item for Word {
///     type Key = String;
///
///     fn key(&self) -> String {
///         self.text.clone()
///     }
///
///     fn encode(&self) -> Result<Vec<u8>, BoxError> {
///         let mut out = self.count.to_be_bytes().to_vec();
///         out.extend_from_slice(self.text.as_bytes());
///         Ok(out)
///     }
///
///     fn decode(bytes: &[u8]) -> Result<Self, BoxError> {
///         let (count, text) = bytes.split_at_checked(4).ok_or("short value")?;
///         Ok(Self {
///             text: String::from_utf8(text.to_vec())?,
///             count: u32::from_be_bytes(count.try_into()?),
///         })
///     }
/// }
/// ```
pub trait Item: Sized {
    /// Key type the item is indexed by.
    type Key: IndexKey;

    /// The item's unique key.
    fn key(&self) -> Self::Key;

    /// Serialize the item.
    fn encode(&self) -> Result<Vec<u8>, BoxError>;

    /// Rebuild an item from exactly the bytes `encode` produced.
    fn decode(bytes: &[u8]) -> Result<Self, BoxError>;
}
