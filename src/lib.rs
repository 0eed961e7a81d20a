//! # fecpack
//!
//! Packs many derived output files into a single ZIP archive while their
//! data is still being produced. The writer works in one pass over a
//! non-seekable sink: sizes are unknown when each entry's header goes out,
//! so real totals trail each payload in a data descriptor and the central
//! directory at the end carries the authoritative values. Every entry is
//! stored uncompressed — the trade is deliberate, one pass at full speed.
//!
//! ## Features
//!
//! - ZIP64 layout for every entry, so member and archive sizes past 4 GiB
//!   need no special casing
//! - Chunked writing with a filename-change entry boundary, matching
//!   producers that emit paginated output
//! - Collision-tolerant `_partN` renaming (or a strict variant that rejects
//!   duplicates)
//! - Sinks for files, stdout, and in-memory buffers
//!
//! ## Example
//!
//! ```no_run
//! use fecpack::{BufferSink, Zip64Writer};
//!
//! #[tokio::main]
//! async fn main() -> fecpack::zip::Result<()> {
//!     let mut writer = Zip64Writer::new(BufferSink::new());
//!     writer.push("SA17A.csv", b"form_type,amount\n").await?;
//!     writer.push("SA17A.csv", b"SA17A,25.00\n").await?;
//!     writer.push("SB23.csv", b"form_type\n").await?;
//!     writer.close().await?;
//!
//!     let archive = writer.into_sink().into_inner();
//!     assert_eq!(&archive[0..4], b"PK\x03\x04");
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod csv;
pub mod feed;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use csv::{CsvError, CsvReader};
pub use feed::{FeedReader, FileChunk};
pub use io::{BufferSink, FileSink, Sink, StdoutSink};
pub use zip::{ClassicWriter, Error, NamingPolicy, Zip64Writer, ZipWrite};
