//! Exact 64-bit field encoding for producer-safe integer values.
//!
//! Every size, offset, and count that lands in a ZIP64 structure goes through
//! this module. Values are carried as `u64` but validated against the 2^53−1
//! ceiling the upstream producer contract guarantees; anything larger is a
//! producer bug or an unsupported member size and aborts the archive.
//!
//! Little-endian is the layout for every ZIP64 structure. The big-endian
//! layout exists only for the classic writer's legacy data-descriptor
//! encoding and must never be used on the ZIP64 path.

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use super::error::{Error, Result};

/// Largest value the codec accepts: 2^53 − 1.
pub const MAX_ENCODABLE: u64 = (1 << 53) - 1;

/// Decompose a validated value into `(high32, low32)` with
/// `value = high32 * 2^32 + low32`.
pub fn split(value: u64) -> Result<(u32, u32)> {
    if value > MAX_ENCODABLE {
        return Err(Error::ValueOutOfRange(value));
    }
    Ok(((value >> 32) as u32, (value & 0xFFFF_FFFF) as u32))
}

/// Append `value` to `buf` as 8 little-endian bytes.
pub fn put_u64_le(buf: &mut Vec<u8>, value: u64) -> Result<()> {
    let (high, low) = split(value)?;
    buf.write_u32::<LittleEndian>(low)?;
    buf.write_u32::<LittleEndian>(high)?;
    Ok(())
}

/// Append `value` to `buf` as 8 big-endian bytes.
pub fn put_u64_be(buf: &mut Vec<u8>, value: u64) -> Result<()> {
    let (high, low) = split(value)?;
    buf.write_u32::<BigEndian>(high)?;
    buf.write_u32::<BigEndian>(low)?;
    Ok(())
}
