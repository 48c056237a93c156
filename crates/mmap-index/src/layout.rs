//! On-disk binary layout
//!
//! ```text
//! index file: modulus * 16 bytes
//! ┌──────────────────────┬──────────────────────┐
//! │ from (u64 BE)        │ to (u64 BE)          │  slot 0
//! ├──────────────────────┼──────────────────────┤
//! │ ...                  │ ...                  │  slot 1 .. modulus-1
//! └──────────────────────┴──────────────────────┘
//!
//! data file: records back to back in insertion order
//!   byte key:    uvarint(key_len) | key bytes | value bytes
//!   integer key: zigzag varint(key) | value bytes
//! ```
//!
//! A slot with `to == 0` is empty. Every record starts with at least one
//! prefix byte, so a stored record always ends past offset zero.

use crate::error::{IndexError, Result};
use byteorder::{BigEndian, ByteOrder};

/// Size of one slot in the index file.
pub const SLOT_SIZE: usize = 16;

/// Longest encoding of a 64-bit varint.
pub const MAX_VARINT_LEN: usize = 10;

/// One entry of the index file: the `[from, to)` span of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Slot {
    /// Offset of the first record byte in the data file
    pub from: u64,
    /// Offset one past the last record byte
    pub to: u64,
}

impl Slot {
    /// Returns `true` when the slot holds no record.
    pub const fn is_empty(&self) -> bool {
        self.to == 0
    }

    /// Record length in bytes.
    pub const fn len(&self) -> u64 {
        self.to.saturating_sub(self.from)
    }
}

/// Byte range of slot `slot` inside the index file.
const fn slot_range(slot: u64) -> std::ops::Range<usize> {
    let start = slot as usize * SLOT_SIZE;
    start..start + SLOT_SIZE
}

/// Read slot `slot` from index bytes.
///
/// `index` must hold at least `slot + 1` slots.
pub fn read_slot(index: &[u8], slot: u64) -> Slot {
    let bytes = &index[slot_range(slot)];
    Slot {
        from: BigEndian::read_u64(&bytes[..8]),
        to: BigEndian::read_u64(&bytes[8..]),
    }
}

/// Write `value` into slot `slot` of index bytes.
pub fn write_slot(index: &mut [u8], slot: u64, value: Slot) {
    let bytes = &mut index[slot_range(slot)];
    BigEndian::write_u64(&mut bytes[..8], value.from);
    BigEndian::write_u64(&mut bytes[8..], value.to);
}

/// Append `value` as an unsigned LEB128 varint.
pub fn put_uvarint(out: &mut Vec<u8>, mut value: u64) -> usize {
    let start = out.len();
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
    out.len() - start
}

/// Decode an unsigned varint, returning the value and bytes consumed.
pub fn read_uvarint(data: &[u8]) -> Result<(u64, usize)> {
    let mut value = 0u64;
    let mut shift = 0u32;

    for (i, &byte) in data.iter().enumerate() {
        if i == MAX_VARINT_LEN - 1 && byte > 1 {
            return Err(IndexError::Corrupt("varint overflows 64 bits".into()));
        }
        value |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
        shift += 7;
    }

    Err(IndexError::Corrupt("truncated varint".into()))
}

/// Append `value` as a zigzag-encoded signed varint.
pub fn put_varint(out: &mut Vec<u8>, value: i64) -> usize {
    put_uvarint(out, zigzag(value))
}

/// Decode a zigzag-encoded signed varint.
pub fn read_varint(data: &[u8]) -> Result<(i64, usize)> {
    let (raw, n) = read_uvarint(data)?;
    Ok((unzigzag(raw), n))
}

const fn zigzag(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

const fn unzigzag(raw: u64) -> i64 {
    ((raw >> 1) as i64) ^ -((raw & 1) as i64)
}
