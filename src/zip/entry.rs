//! Per-entry state and serialization.
//!
//! An entry is created the moment the writer opens a new member and its local
//! header is emitted immediately, before any content exists. Because the
//! stream is written in a single pass, the header cannot carry sizes or a
//! checksum; it declares `0xFFFFFFFF` size sentinels and bit 3 of the flags,
//! and the real numbers follow the payload in a data descriptor. The entry
//! keeps only counters and a running CRC while chunks flow through — content
//! is never buffered.

use byteorder::{LittleEndian, WriteBytesExt};

use super::crc::Crc32;
use super::error::Result;
use super::structures::{
    CENTRAL_HEADER_SIGNATURE, DosDateTime, GP_BIT_FLAGS, LOCAL_HEADER_SIGNATURE, METHOD_STORED,
    VERSION_ZIP64, ZIP64_EXTRA_LEN, ZIP64_EXTRA_TAG,
};
use super::wide;

/// One member of the archive.
///
/// Mutable while it is the writer's open entry; after its descriptor is
/// emitted it survives only as the record behind the central directory.
#[derive(Debug)]
pub struct ZipEntry {
    /// Collision-resolved display name, stored as the UTF-8 bytes that go on
    /// the wire.
    name: String,
    /// Offset of this entry's local header within the whole archive stream.
    start_offset: u64,
    compressed_size: u64,
    uncompressed_size: u64,
    crc: Crc32,
    modified: DosDateTime,
}

impl ZipEntry {
    /// Create an entry whose local header will begin at `start_offset`,
    /// timestamped now.
    pub(crate) fn new(name: String, start_offset: u64) -> Self {
        Self {
            name,
            start_offset,
            compressed_size: 0,
            uncompressed_size: 0,
            crc: Crc32::new(),
            modified: DosDateTime::now(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub(crate) fn name_bytes(&self) -> &[u8] {
        self.name.as_bytes()
    }

    #[inline]
    pub fn start_offset(&self) -> u64 {
        self.start_offset
    }

    /// Both size counters are identical because every entry is stored.
    #[inline]
    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }

    #[inline]
    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    #[inline]
    pub fn crc32(&self) -> u32 {
        self.crc.get()
    }

    #[inline]
    pub(crate) fn modified(&self) -> DosDateTime {
        self.modified
    }

    /// Account for a payload chunk: lengths and CRC only, the bytes
    /// themselves are forwarded by the writer.
    pub(crate) fn record(&mut self, chunk: &[u8]) {
        self.uncompressed_size += chunk.len() as u64;
        self.compressed_size += chunk.len() as u64;
        self.crc.append(chunk);
    }

    /// Serialize the local file header, including the ZIP64 extra field.
    ///
    /// Sizes and CRC are placeholders; only the local header offset is real
    /// at this point.
    pub(crate) fn local_header(&self) -> Result<Vec<u8>> {
        let name = self.name_bytes();
        let mut buf = Vec::with_capacity(30 + name.len() + ZIP64_EXTRA_LEN as usize);

        buf.write_u32::<LittleEndian>(LOCAL_HEADER_SIGNATURE)?;
        buf.write_u16::<LittleEndian>(VERSION_ZIP64)?;
        buf.write_u16::<LittleEndian>(GP_BIT_FLAGS)?;
        buf.write_u16::<LittleEndian>(METHOD_STORED)?;
        buf.write_u16::<LittleEndian>(self.modified.time)?;
        buf.write_u16::<LittleEndian>(self.modified.date)?;
        // CRC-32: unknown until the descriptor
        buf.write_u32::<LittleEndian>(0)?;
        // Size sentinels: see the ZIP64 extra field
        buf.write_u32::<LittleEndian>(0xFFFFFFFF)?;
        buf.write_u32::<LittleEndian>(0xFFFFFFFF)?;
        buf.write_u16::<LittleEndian>(name.len() as u16)?;
        buf.write_u16::<LittleEndian>(ZIP64_EXTRA_LEN)?;
        buf.extend_from_slice(name);

        // ZIP64 extended information: placeholder sizes, real header offset
        buf.write_u16::<LittleEndian>(ZIP64_EXTRA_TAG)?;
        buf.write_u16::<LittleEndian>(ZIP64_EXTRA_LEN - 4)?;
        wide::put_u64_le(&mut buf, 0)?;
        wide::put_u64_le(&mut buf, 0)?;
        wide::put_u64_le(&mut buf, self.start_offset)?;
        // Disk start number
        buf.write_u32::<LittleEndian>(0)?;

        Ok(buf)
    }

    /// Serialize the data descriptor that trails the payload: the final CRC
    /// and both true 8-byte sizes.
    pub(crate) fn data_descriptor(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(20);
        buf.write_u32::<LittleEndian>(self.crc.get())?;
        wide::put_u64_le(&mut buf, self.compressed_size)?;
        wide::put_u64_le(&mut buf, self.uncompressed_size)?;
        Ok(buf)
    }

    /// Serialize this entry's central directory record with its final
    /// totals. The fixed 32-bit slots keep their sentinels; the ZIP64 extra
    /// field carries the authoritative values.
    pub(crate) fn central_record(&self) -> Result<Vec<u8>> {
        let name = self.name_bytes();
        let mut buf = Vec::with_capacity(46 + name.len() + ZIP64_EXTRA_LEN as usize);

        buf.write_u32::<LittleEndian>(CENTRAL_HEADER_SIGNATURE)?;
        buf.write_u16::<LittleEndian>(VERSION_ZIP64)?;
        buf.write_u16::<LittleEndian>(VERSION_ZIP64)?;
        buf.write_u16::<LittleEndian>(GP_BIT_FLAGS)?;
        buf.write_u16::<LittleEndian>(METHOD_STORED)?;
        buf.write_u16::<LittleEndian>(self.modified.time)?;
        buf.write_u16::<LittleEndian>(self.modified.date)?;
        buf.write_u32::<LittleEndian>(self.crc.get())?;
        buf.write_u32::<LittleEndian>(0xFFFFFFFF)?;
        buf.write_u32::<LittleEndian>(0xFFFFFFFF)?;
        buf.write_u16::<LittleEndian>(name.len() as u16)?;
        buf.write_u16::<LittleEndian>(ZIP64_EXTRA_LEN)?;
        // File comment length
        buf.write_u16::<LittleEndian>(0)?;
        // Disk number start: sentinel, see the extra field
        buf.write_u16::<LittleEndian>(0xFFFF)?;
        // Internal / external attributes
        buf.write_u16::<LittleEndian>(0)?;
        buf.write_u32::<LittleEndian>(0)?;
        // Local header offset sentinel
        buf.write_u32::<LittleEndian>(0xFFFFFFFF)?;
        buf.extend_from_slice(name);

        buf.write_u16::<LittleEndian>(ZIP64_EXTRA_TAG)?;
        buf.write_u16::<LittleEndian>(ZIP64_EXTRA_LEN - 4)?;
        wide::put_u64_le(&mut buf, self.uncompressed_size)?;
        wide::put_u64_le(&mut buf, self.compressed_size)?;
        wide::put_u64_le(&mut buf, self.start_offset)?;
        buf.write_u32::<LittleEndian>(0)?;

        Ok(buf)
    }
}
