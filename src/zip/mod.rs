//! Streaming ZIP archive writing.
//!
//! This module serializes an arbitrary number of independently-sized files
//! into a single ZIP container while their data is still arriving, in one
//! pass, without seeking and without buffering payload bytes.
//!
//! ## Architecture
//!
//! - [`structures`]: format constants, flag/version values, DOS timestamps
//! - [`crc`]: incremental CRC-32 over entry payloads
//! - [`wide`]: validated 64-bit field encoding
//! - [`entry`]: per-file state, header and trailer serialization
//! - [`writer`]: the streaming ZIP64 writer (the default)
//! - [`classic`]: the legacy 32-bit writer
//!
//! ## Why headers cannot carry sizes
//!
//! A ZIP local file header normally states the entry's sizes and CRC up
//! front, but in a single-pass stream those are unknown until the entry's
//! last chunk has passed through. Both writers therefore set bit 3 of the
//! general purpose flags, emit placeholder headers, report real totals in a
//! data descriptor after each payload, and let the central directory written
//! at the end carry the authoritative values.
//!
//! ## Two variants, one interface
//!
//! [`Zip64Writer`] is the core: ZIP64 structures for every entry and
//! collision-tolerant `_partN` naming. [`ClassicWriter`] reproduces the
//! legacy 32-bit layout with strict naming. Both implement [`ZipWrite`];
//! which naming policy is live is observable through
//! [`ZipWrite::naming`], because the two are not interchangeable.
//!
//! ## Limitations
//!
//! - Stored entries only, no compression
//! - Single-disk archives
//! - Values above 2^53 − 1 are rejected (see [`wide`])

pub mod classic;
pub mod crc;
pub mod entry;
pub mod error;
pub mod structures;
pub mod wide;
pub mod writer;

pub use classic::ClassicWriter;
pub use crc::Crc32;
pub use entry::ZipEntry;
pub use error::{Error, Result};
pub use structures::{DosDateTime, NamingPolicy};
pub use writer::Zip64Writer;

use async_trait::async_trait;

/// Capability interface shared by both archive writer variants.
#[async_trait]
pub trait ZipWrite: Send {
    /// The duplicate-filename policy in effect.
    fn naming(&self) -> NamingPolicy;

    /// Append a chunk of `filename`'s content, opening a new entry when the
    /// name differs from the currently open one.
    async fn push(&mut self, filename: &str, bytes: &[u8]) -> Result<()>;

    /// Finalize the archive and close the underlying sink. Everything after
    /// a successful close is rejected, including a second close.
    async fn close(&mut self) -> Result<()>;
}
