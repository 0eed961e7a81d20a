//! Error types for the archive writers.

use thiserror::Error;

/// Errors surfaced while writing an archive.
///
/// None of these are transient: every operation is a deterministic
/// transformation of bytes already in hand, so a failure is a precondition
/// violation (or a sink I/O failure) and the archive is invalid.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the output sink or a serialization buffer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A size, offset, or count exceeds the encodable ceiling (2^53 − 1).
    #[error("value {0} exceeds the encodable ceiling of 2^53 - 1")]
    ValueOutOfRange(u64),

    /// A field does not fit the classic 16/32-bit container layout.
    #[error("{field} {value} does not fit the classic archive layout")]
    FieldOverflow { field: &'static str, value: u64 },

    /// An operation arrived after `close()`.
    #[error("archive is already closed")]
    ArchiveClosed,

    /// A pushed filename already names an entry (strict naming only).
    #[error("duplicate entry name: {0}")]
    DuplicateName(String),
}

/// Result type for archive writing.
pub type Result<T> = std::result::Result<T, Error>;
