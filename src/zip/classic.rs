//! Classic 32-bit archive writer, kept for byte-for-byte compatibility with
//! the legacy output path.
//!
//! Differences from [`Zip64Writer`](super::Zip64Writer), and nothing else:
//! no ZIP64 structures anywhere (headers declare version 2.0 and no extra
//! field, the end record carries real 16/32-bit numbers), duplicate names
//! are a fatal error instead of being renamed, the whole central directory
//! is assembled in memory and emitted in one write, and the data descriptor
//! keeps its legacy encoding: a leading signature and big-endian 8-byte
//! length fields. That big-endian path stays confined to this file.
//!
//! Counts or sizes the 16/32-bit fields cannot represent abort the archive;
//! anything that large belongs in the ZIP64 variant.

use std::collections::HashSet;

use async_trait::async_trait;
use byteorder::{LittleEndian, WriteBytesExt};

use crate::io::Sink;

use super::ZipWrite;
use super::entry::ZipEntry;
use super::error::{Error, Result};
use super::structures::{
    CENTRAL_HEADER_SIGNATURE, DESCRIPTOR_SIGNATURE, EOCD_SIGNATURE, GP_BIT_FLAGS,
    LOCAL_HEADER_SIGNATURE, METHOD_STORED, NamingPolicy, VERSION_CLASSIC, normalize_name,
};
use super::wide;

/// Strict-naming, non-ZIP64 archive writer.
pub struct ClassicWriter<S: Sink> {
    sink: S,
    entries: Vec<ZipEntry>,
    used_names: HashSet<String>,
    offset: u64,
    current_name: Option<String>,
    closed: bool,
}

impl<S: Sink> ClassicWriter<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            entries: Vec::new(),
            used_names: HashSet::new(),
            offset: 0,
            current_name: None,
            closed: false,
        }
    }

    /// Append a chunk to `filename`. A name that already names an entry is a
    /// fatal error here; there is no renaming in this variant.
    pub async fn push(&mut self, filename: &str, bytes: &[u8]) -> Result<()> {
        if self.closed {
            return Err(Error::ArchiveClosed);
        }

        let normalized = normalize_name(filename);
        if self.current_name.as_deref() != Some(normalized.as_str()) {
            if self.used_names.contains(&normalized) {
                return Err(Error::DuplicateName(normalized));
            }
            self.open_entry(normalized).await?;
        }

        if let Some(entry) = self.entries.last_mut() {
            entry.record(bytes);
        }
        self.emit(bytes).await
    }

    /// Finalize the open entry, emit the buffered central directory and end
    /// record in a single write, and close the sink.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::ArchiveClosed);
        }
        self.finalize_current().await?;

        let central_offset = self.offset;
        let mut buf = Vec::new();
        for entry in &self.entries {
            central_record(&mut buf, entry)?;
        }
        let central_size = buf.len() as u64;

        buf.write_u32::<LittleEndian>(EOCD_SIGNATURE)?;
        // This disk / disk with the central directory
        buf.write_u16::<LittleEndian>(0)?;
        buf.write_u16::<LittleEndian>(0)?;
        let count = u16_field(self.entries.len() as u64, "entry count")?;
        buf.write_u16::<LittleEndian>(count)?;
        buf.write_u16::<LittleEndian>(count)?;
        buf.write_u32::<LittleEndian>(u32_field(central_size, "central directory size")?)?;
        buf.write_u32::<LittleEndian>(u32_field(central_offset, "central directory offset")?)?;
        // Comment length
        buf.write_u16::<LittleEndian>(0)?;

        self.emit(&buf).await?;
        self.closed = true;
        self.sink.close().await?;
        Ok(())
    }

    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    async fn emit(&mut self, bytes: &[u8]) -> Result<()> {
        self.sink.write(bytes).await?;
        self.offset += bytes.len() as u64;
        Ok(())
    }

    async fn finalize_current(&mut self) -> Result<()> {
        if self.current_name.take().is_some()
            && let Some(entry) = self.entries.last()
        {
            let descriptor = descriptor(entry)?;
            self.emit(&descriptor).await?;
        }
        Ok(())
    }

    async fn open_entry(&mut self, name: String) -> Result<()> {
        self.finalize_current().await?;

        let entry = ZipEntry::new(name.clone(), self.offset);
        let header = local_header(&entry)?;

        self.used_names.insert(name.clone());
        self.entries.push(entry);
        self.current_name = Some(name);
        self.emit(&header).await
    }
}

/// 30-byte local header: version 2.0, no extra field, zeroed CRC and sizes
/// (the descriptor carries the real ones).
fn local_header(entry: &ZipEntry) -> Result<Vec<u8>> {
    let name = entry.name_bytes();
    let mut buf = Vec::with_capacity(30 + name.len());

    buf.write_u32::<LittleEndian>(LOCAL_HEADER_SIGNATURE)?;
    buf.write_u16::<LittleEndian>(VERSION_CLASSIC)?;
    buf.write_u16::<LittleEndian>(GP_BIT_FLAGS)?;
    buf.write_u16::<LittleEndian>(METHOD_STORED)?;
    buf.write_u16::<LittleEndian>(entry.modified().time)?;
    buf.write_u16::<LittleEndian>(entry.modified().date)?;
    buf.write_u32::<LittleEndian>(0)?;
    buf.write_u32::<LittleEndian>(0)?;
    buf.write_u32::<LittleEndian>(0)?;
    buf.write_u16::<LittleEndian>(name.len() as u16)?;
    buf.write_u16::<LittleEndian>(0)?;
    buf.extend_from_slice(name);
    Ok(buf)
}

/// Signed data descriptor with the legacy big-endian 8-byte length fields.
fn descriptor(entry: &ZipEntry) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(24);
    buf.write_u32::<LittleEndian>(DESCRIPTOR_SIGNATURE)?;
    buf.write_u32::<LittleEndian>(entry.crc32())?;
    wide::put_u64_be(&mut buf, entry.compressed_size())?;
    wide::put_u64_be(&mut buf, entry.uncompressed_size())?;
    Ok(buf)
}

/// 46-byte central directory record with real 32-bit sizes and offset.
fn central_record(buf: &mut Vec<u8>, entry: &ZipEntry) -> Result<()> {
    let name = entry.name_bytes();

    buf.write_u32::<LittleEndian>(CENTRAL_HEADER_SIGNATURE)?;
    buf.write_u16::<LittleEndian>(VERSION_CLASSIC)?;
    buf.write_u16::<LittleEndian>(VERSION_CLASSIC)?;
    buf.write_u16::<LittleEndian>(GP_BIT_FLAGS)?;
    buf.write_u16::<LittleEndian>(METHOD_STORED)?;
    buf.write_u16::<LittleEndian>(entry.modified().time)?;
    buf.write_u16::<LittleEndian>(entry.modified().date)?;
    buf.write_u32::<LittleEndian>(entry.crc32())?;
    buf.write_u32::<LittleEndian>(u32_field(entry.compressed_size(), "compressed size")?)?;
    buf.write_u32::<LittleEndian>(u32_field(entry.uncompressed_size(), "uncompressed size")?)?;
    buf.write_u16::<LittleEndian>(name.len() as u16)?;
    // Extra field / comment lengths
    buf.write_u16::<LittleEndian>(0)?;
    buf.write_u16::<LittleEndian>(0)?;
    // Disk number, internal / external attributes
    buf.write_u16::<LittleEndian>(0)?;
    buf.write_u16::<LittleEndian>(0)?;
    buf.write_u32::<LittleEndian>(0)?;
    buf.write_u32::<LittleEndian>(u32_field(entry.start_offset(), "local header offset")?)?;
    buf.extend_from_slice(name);
    Ok(())
}

fn u16_field(value: u64, field: &'static str) -> Result<u16> {
    u16::try_from(value).map_err(|_| Error::FieldOverflow { field, value })
}

fn u32_field(value: u64, field: &'static str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::FieldOverflow { field, value })
}

#[async_trait]
impl<S: Sink> ZipWrite for ClassicWriter<S> {
    fn naming(&self) -> NamingPolicy {
        NamingPolicy::Reject
    }

    async fn push(&mut self, filename: &str, bytes: &[u8]) -> Result<()> {
        ClassicWriter::push(self, filename, bytes).await
    }

    async fn close(&mut self) -> Result<()> {
        ClassicWriter::close(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::BufferSink;

    #[tokio::test]
    async fn test_duplicate_name_is_fatal() {
        let mut writer = ClassicWriter::new(BufferSink::new());
        writer.push("a.csv", b"1").await.unwrap();
        writer.push("b.csv", b"2").await.unwrap();

        match writer.push("a.csv", b"3").await {
            Err(Error::DuplicateName(name)) => assert_eq!(name, "a.csv"),
            other => panic!("expected DuplicateName, got {other:?}"),
        }
    }

    #[test]
    fn test_descriptor_is_signed_and_big_endian() {
        let mut entry = ZipEntry::new("a.txt".to_string(), 0);
        entry.record(b"hello");

        let desc = descriptor(&entry).unwrap();
        assert_eq!(desc.len(), 24);
        assert_eq!(&desc[0..4], b"PK\x07\x08");
        assert_eq!(u32::from_le_bytes(desc[4..8].try_into().unwrap()), 0x3610A686);
        assert_eq!(u64::from_be_bytes(desc[8..16].try_into().unwrap()), 5);
        assert_eq!(u64::from_be_bytes(desc[16..24].try_into().unwrap()), 5);
    }

    #[test]
    fn test_field_guards() {
        assert_eq!(u16_field(0xFFFF, "n").unwrap(), 0xFFFF);
        assert!(matches!(
            u16_field(0x1_0000, "n"),
            Err(Error::FieldOverflow { .. })
        ));
        assert_eq!(u32_field(0xFFFF_FFFF, "n").unwrap(), 0xFFFF_FFFF);
        assert!(matches!(
            u32_field(0x1_0000_0000, "n"),
            Err(Error::FieldOverflow { .. })
        ));
    }
}
