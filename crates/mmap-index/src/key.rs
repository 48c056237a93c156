//! Key types accepted by the index
//!
//! Two key families share the probe scheme and file layout:
//!
//! - **Byte keys** (`str`, `[u8]`, `String`, `Vec<u8>`): hashed as a
//!   big-endian number, stored as `uvarint(len) | bytes`.
//! - **Integer keys** (`i64`, `i32`, `u32`): hashed by their value, stored as
//!   a zigzag varint of the signed value.

use crate::error::{IndexError, Result};
use crate::layout::{put_uvarint, put_varint, read_uvarint, read_varint};
use crate::probe::{byte_home, byte_step, int_home, int_step};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A key that can be placed in and looked up from the table.
pub trait IndexKey {
    /// First slot probed for this key.
    fn home_slot(&self, modulus: u64) -> u64;

    /// Distance between successive probes, in `[1, modulus - 1]`.
    fn step(&self, modulus: u64) -> u64;

    /// Append the key prefix that starts this key's record.
    fn encode_prefix(&self, out: &mut Vec<u8>);

    /// Compare against the key stored at the start of `record`.
    ///
    /// Returns the value bytes following the key when the keys are equal and
    /// `None` on a mismatch.
    fn match_record<'a>(&self, record: &'a [u8]) -> Result<Option<&'a [u8]>>;

    /// Human-readable form used in error messages.
    fn describe(&self) -> String;
}

/// Split a byte-key record into the stored key and its prefix length.
fn split_byte_key(record: &[u8]) -> Result<(&[u8], usize)> {
    let (len, n) = read_uvarint(record)?;
    let end = usize::try_from(len)
        .ok()
        .and_then(|len| n.checked_add(len))
        .filter(|&end| end <= record.len())
        .ok_or_else(|| {
            IndexError::Corrupt(format!(
                "key length {len} exceeds record length {}",
                record.len()
            ))
        })?;
    Ok((&record[n..end], end))
}

fn match_byte_record<'a>(key: &[u8], record: &'a [u8]) -> Result<Option<&'a [u8]>> {
    let (stored, end) = split_byte_key(record)?;
    Ok((stored == key).then(|| &record[end..]))
}

fn match_int_record(key: i64, record: &[u8]) -> Result<Option<&[u8]>> {
    let (stored, n) = read_varint(record)?;
    Ok((stored == key).then(|| &record[n..]))
}

fn describe_bytes(key: &[u8]) -> String {
    match std::str::from_utf8(key) {
        Ok(s) => format!("{s:?}"),
        Err(_) => format!("0x{}", hex::encode(key)),
    }
}

macro_rules! impl_byte_key {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IndexKey for $ty {
                fn home_slot(&self, modulus: u64) -> u64 {
                    byte_home(AsRef::<[u8]>::as_ref(self), modulus)
                }

                fn step(&self, modulus: u64) -> u64 {
                    byte_step(AsRef::<[u8]>::as_ref(self), modulus)
                }

                fn encode_prefix(&self, out: &mut Vec<u8>) {
                    let bytes = AsRef::<[u8]>::as_ref(self);
                    put_uvarint(out, bytes.len() as u64);
                    out.extend_from_slice(bytes);
                }

                fn match_record<'a>(&self, record: &'a [u8]) -> Result<Option<&'a [u8]>> {
                    match_byte_record(AsRef::<[u8]>::as_ref(self), record)
                }

                fn describe(&self) -> String {
                    describe_bytes(AsRef::<[u8]>::as_ref(self))
                }
            }
        )*
    };
}

macro_rules! impl_int_key {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IndexKey for $ty {
                fn home_slot(&self, modulus: u64) -> u64 {
                    int_home(i64::from(*self), modulus)
                }

                fn step(&self, modulus: u64) -> u64 {
                    int_step(i64::from(*self), modulus)
                }

                fn encode_prefix(&self, out: &mut Vec<u8>) {
                    put_varint(out, i64::from(*self));
                }

                fn match_record<'a>(&self, record: &'a [u8]) -> Result<Option<&'a [u8]>> {
                    match_int_record(i64::from(*self), record)
                }

                fn describe(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_byte_key!(str, [u8], String, Vec<u8>);
impl_int_key!(i64, i32, u32);

/// Which key family a table was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    /// Length-prefixed byte sequence keys
    Bytes,
    /// Zigzag varint integer keys
    Int,
}

impl KeyKind {
    /// Decode the key stored at the start of `record`.
    ///
    /// Returns the key and the length of its prefix.
    pub fn parse(self, record: &[u8]) -> Result<(StoredKey<'_>, usize)> {
        match self {
            Self::Bytes => {
                let (key, end) = split_byte_key(record)?;
                Ok((StoredKey::Bytes(key), end))
            }
            Self::Int => {
                let (key, n) = read_varint(record)?;
                Ok((StoredKey::Int(key), n))
            }
        }
    }
}

/// A key decoded from the data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoredKey<'a> {
    /// Byte key borrowed from the record
    Bytes(&'a [u8]),
    /// Integer key
    Int(i64),
}

impl IndexKey for StoredKey<'_> {
    fn home_slot(&self, modulus: u64) -> u64 {
        match *self {
            Self::Bytes(bytes) => byte_home(bytes, modulus),
            Self::Int(key) => int_home(key, modulus),
        }
    }

    fn step(&self, modulus: u64) -> u64 {
        match *self {
            Self::Bytes(bytes) => byte_step(bytes, modulus),
            Self::Int(key) => int_step(key, modulus),
        }
    }

    fn encode_prefix(&self, out: &mut Vec<u8>) {
        match *self {
            Self::Bytes(bytes) => bytes.encode_prefix(out),
            Self::Int(key) => key.encode_prefix(out),
        }
    }

    fn match_record<'a>(&self, record: &'a [u8]) -> Result<Option<&'a [u8]>> {
        match *self {
            Self::Bytes(bytes) => match_byte_record(bytes, record),
            Self::Int(key) => match_int_record(key, record),
        }
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for StoredKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Bytes(bytes) => f.write_str(&describe_bytes(bytes)),
            Self::Int(key) => write!(f, "{key}"),
        }
    }
}
