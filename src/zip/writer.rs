//! Streaming ZIP64 archive writer.
//!
//! This is the single-pass core: bytes leave for the sink the moment they
//! exist and are never revisited. Member sizes are unknown when each local
//! header goes out, so headers carry size sentinels, real totals trail each
//! payload in a data descriptor, and the central directory written at the
//! very end carries the authoritative numbers. Every entry uses the ZIP64
//! layout, large or not, which keeps the wire format uniform.
//!
//! ## Emission order
//!
//! ```text
//! [local header][payload][descriptor]  ... per entry, in first-push order
//! [central directory records]
//! [ZIP64 end of central directory][ZIP64 locator][EOCD sentinels]
//! ```
//!
//! Offsets recorded in headers and the central directory depend on this
//! exact order; the writer is strictly sequential and owns the only path to
//! the sink, so its running `offset` is authoritative.

use std::collections::HashSet;

use async_trait::async_trait;
use byteorder::{LittleEndian, WriteBytesExt};

use crate::io::Sink;

use super::ZipWrite;
use super::entry::ZipEntry;
use super::error::{Error, Result};
use super::structures::{
    EOCD_SIGNATURE, NamingPolicy, VERSION_ZIP64, ZIP64_EOCD_SIGNATURE, ZIP64_LOCATOR_SIGNATURE,
    normalize_name,
};
use super::wide;

/// Streaming ZIP64 writer with collision-tolerant naming.
///
/// `push` chunks under a filename; a change of filename finalizes the open
/// entry and starts the next one. Producers may legitimately reuse a name
/// after moving past it (paginated output does), so a reused name is renamed
/// with a `_partN` suffix rather than rejected.
pub struct Zip64Writer<S: Sink> {
    sink: S,
    /// Finalized-name entries in first-push order, which is also emission
    /// order and central directory order.
    entries: Vec<ZipEntry>,
    used_names: HashSet<String>,
    /// Bytes emitted so far; the source of truth for every offset field.
    offset: u64,
    /// Logical (normalized, pre-collision) name of the open entry.
    current_name: Option<String>,
    closed: bool,
}

impl<S: Sink> Zip64Writer<S> {
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

    /// Append a chunk to `filename`, opening a new entry if the name differs
    /// from the currently open one.
    pub async fn push(&mut self, filename: &str, bytes: &[u8]) -> Result<()> {
        if self.closed {
            return Err(Error::ArchiveClosed);
        }

        let normalized = normalize_name(filename);
        if self.current_name.as_deref() != Some(normalized.as_str()) {
            self.open_entry(normalized).await?;
        }

        if let Some(entry) = self.entries.last_mut() {
            entry.record(bytes);
        }
        self.emit(bytes).await
    }

    /// Finalize the open entry, write the central directory and end records,
    /// and close the sink. The writer rejects everything afterwards,
    /// including a second `close`.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::ArchiveClosed);
        }
        self.finalize_current().await?;

        let central_offset = self.offset;
        for i in 0..self.entries.len() {
            let record = self.entries[i].central_record()?;
            self.emit(&record).await?;
        }
        let central_size = self.offset - central_offset;

        let zip64_eocd_offset = self.offset;
        let record = self.zip64_eocd_record(central_offset, central_size)?;
        self.emit(&record).await?;
        let locator = self.zip64_locator(zip64_eocd_offset)?;
        self.emit(&locator).await?;
        let eocd = self.eocd_sentinels()?;
        self.emit(&eocd).await?;

        self.closed = true;
        self.sink.close().await?;
        Ok(())
    }

    /// Entries recorded so far, in central directory order.
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    /// Consume the writer and hand back its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// The one place bytes reach the sink, keeping `offset` exact.
    async fn emit(&mut self, bytes: &[u8]) -> Result<()> {
        self.sink.write(bytes).await?;
        self.offset += bytes.len() as u64;
        Ok(())
    }

    /// Emit the open entry's data descriptor, if any, and mark it final.
    async fn finalize_current(&mut self) -> Result<()> {
        if self.current_name.take().is_some()
            && let Some(entry) = self.entries.last()
        {
            let descriptor = entry.data_descriptor()?;
            self.emit(&descriptor).await?;
        }
        Ok(())
    }

    /// Finalize the previous entry and open a new one under a
    /// collision-resolved name, emitting its local header immediately.
    async fn open_entry(&mut self, normalized: String) -> Result<()> {
        self.finalize_current().await?;

        let resolved = self.resolve_name(&normalized);
        let entry = ZipEntry::new(resolved.clone(), self.offset);
        let header = entry.local_header()?;

        self.used_names.insert(resolved);
        self.entries.push(entry);
        self.current_name = Some(normalized);
        self.emit(&header).await
    }

    /// Probe `_partN` suffixes (N from 2) until the name is unused. The
    /// suffix goes before the extension when there is one.
    fn resolve_name(&self, normalized: &str) -> String {
        if !self.used_names.contains(normalized) {
            return normalized.to_string();
        }
        let (stem, ext) = match normalized.rfind('.') {
            Some(dot) => (&normalized[..dot], &normalized[dot..]),
            None => (normalized, ""),
        };
        let mut part = 2;
        loop {
            let candidate = format!("{stem}_part{part}{ext}");
            if !self.used_names.contains(&candidate) {
                return candidate;
            }
            part += 1;
        }
    }

    fn zip64_eocd_record(&self, central_offset: u64, central_size: u64) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(56);
        buf.write_u32::<LittleEndian>(ZIP64_EOCD_SIGNATURE)?;
        // Size of the record below this field
        wide::put_u64_le(&mut buf, 44)?;
        buf.write_u16::<LittleEndian>(VERSION_ZIP64)?;
        buf.write_u16::<LittleEndian>(VERSION_ZIP64)?;
        // This disk / disk with the central directory
        buf.write_u32::<LittleEndian>(0)?;
        buf.write_u32::<LittleEndian>(0)?;
        // Entry count on this disk, then in total
        wide::put_u64_le(&mut buf, self.entries.len() as u64)?;
        wide::put_u64_le(&mut buf, self.entries.len() as u64)?;
        wide::put_u64_le(&mut buf, central_size)?;
        wide::put_u64_le(&mut buf, central_offset)?;
        Ok(buf)
    }

    fn zip64_locator(&self, record_offset: u64) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(20);
        buf.write_u32::<LittleEndian>(ZIP64_LOCATOR_SIGNATURE)?;
        // Disk with the ZIP64 end of central directory record
        buf.write_u32::<LittleEndian>(0)?;
        wide::put_u64_le(&mut buf, record_offset)?;
        // Total number of disks
        buf.write_u32::<LittleEndian>(1)?;
        Ok(buf)
    }

    /// The classic end record, every count/size/offset field a sentinel
    /// deferring to the ZIP64 records.
    fn eocd_sentinels(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(22);
        buf.write_u32::<LittleEndian>(EOCD_SIGNATURE)?;
        for _ in 0..4 {
            buf.write_u16::<LittleEndian>(0xFFFF)?;
        }
        buf.write_u32::<LittleEndian>(0xFFFFFFFF)?;
        buf.write_u32::<LittleEndian>(0xFFFFFFFF)?;
        // Comment length
        buf.write_u16::<LittleEndian>(0)?;
        Ok(buf)
    }
}

#[async_trait]
impl<S: Sink> ZipWrite for Zip64Writer<S> {
    fn naming(&self) -> NamingPolicy {
        NamingPolicy::RenameParts
    }

    async fn push(&mut self, filename: &str, bytes: &[u8]) -> Result<()> {
        Zip64Writer::push(self, filename, bytes).await
    }

    async fn close(&mut self) -> Result<()> {
        Zip64Writer::close(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::BufferSink;

    #[test]
    fn test_resolve_name_probes_upward() {
        let mut writer = Zip64Writer::new(BufferSink::new());
        for name in ["SA17A.csv", "SA17A_part2.csv", "README"] {
            writer.used_names.insert(name.to_string());
        }

        assert_eq!(writer.resolve_name("SB23.csv"), "SB23.csv");
        // _part2 is taken, so the probe lands on _part3
        assert_eq!(writer.resolve_name("SA17A.csv"), "SA17A_part3.csv");
        // No extension: the suffix goes at the end
        assert_eq!(writer.resolve_name("README"), "README_part2");
    }

    #[tokio::test]
    async fn test_same_name_continues_entry() {
        let mut writer = Zip64Writer::new(BufferSink::new());
        writer.push("a.csv", b"one").await.unwrap();
        writer.push("a.csv", b"two").await.unwrap();
        assert_eq!(writer.entries().len(), 1);
        assert_eq!(writer.entries()[0].uncompressed_size(), 6);
    }

    #[tokio::test]
    async fn test_normalized_name_continues_entry() {
        // Normalization happens before the open-entry comparison, so a
        // slash-bearing name repeated back to back stays one entry.
        let mut writer = Zip64Writer::new(BufferSink::new());
        writer.push("forms/a.csv", b"one").await.unwrap();
        writer.push("forms/a.csv", b"two").await.unwrap();
        assert_eq!(writer.entries().len(), 1);
        assert_eq!(writer.entries()[0].name(), "forms-a.csv");
    }

    #[tokio::test]
    async fn test_rejects_after_close() {
        let mut writer = Zip64Writer::new(BufferSink::new());
        writer.push("a.csv", b"x").await.unwrap();
        writer.close().await.unwrap();

        assert!(matches!(
            writer.push("b.csv", b"y").await,
            Err(Error::ArchiveClosed)
        ));
        assert!(matches!(writer.close().await, Err(Error::ArchiveClosed)));
    }
}
