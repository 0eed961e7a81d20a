//! Framed event stream from the conversion pipeline.
//!
//! The converter that actually decodes the source format runs elsewhere and
//! is opaque to this crate; all that crosses the boundary is an ordered
//! sequence of `(filename, bytes)` events followed by an explicit
//! end-of-stream signal. On the wire that is a little-endian frame protocol:
//!
//! ```text
//! chunk frame:  0x01  name_len:u16  name (UTF-8)  data_len:u32  data
//! end frame:    0x00
//! ```
//!
//! Malformed input — a truncated frame, an unknown tag, a name that is not
//! UTF-8, or the stream ending without the end frame — is surfaced
//! immediately; there is no recovery.

use anyhow::{Context, Result, bail};
use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncReadExt};

const TAG_END: u8 = 0x00;
const TAG_CHUNK: u8 = 0x01;

/// One `(filename, bytes)` event from the producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChunk {
    pub name: String,
    pub data: Vec<u8>,
}

/// Decodes producer frames from any byte stream (in practice: stdin).
pub struct FeedReader<R> {
    inner: R,
    done: bool,
}

impl<R: AsyncRead + Unpin> FeedReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, done: false }
    }

    /// The next chunk event, or `None` once the end frame has been read.
    pub async fn next(&mut self) -> Result<Option<FileChunk>> {
        if self.done {
            return Ok(None);
        }

        let tag = match self.inner.read_u8().await {
            Ok(tag) => tag,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                bail!("event stream ended without an end-of-stream frame")
            }
            Err(e) => return Err(e.into()),
        };

        match tag {
            TAG_END => {
                self.done = true;
                Ok(None)
            }
            TAG_CHUNK => {
                let name_len = self
                    .inner
                    .read_u16_le()
                    .await
                    .context("truncated chunk frame")? as usize;
                let mut name = vec![0u8; name_len];
                self.inner
                    .read_exact(&mut name)
                    .await
                    .context("truncated chunk frame")?;
                let name = String::from_utf8(name).context("chunk frame name is not UTF-8")?;

                let data_len = self
                    .inner
                    .read_u32_le()
                    .await
                    .context("truncated chunk frame")? as usize;
                let mut data = vec![0u8; data_len];
                self.inner
                    .read_exact(&mut data)
                    .await
                    .context("truncated chunk frame")?;

                Ok(Some(FileChunk { name, data }))
            }
            other => bail!("unknown frame tag: {other:#04x}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_frame(name: &str, data: &[u8]) -> Vec<u8> {
        let mut frame = vec![TAG_CHUNK];
        frame.extend_from_slice(&(name.len() as u16).to_le_bytes());
        frame.extend_from_slice(name.as_bytes());
        frame.extend_from_slice(&(data.len() as u32).to_le_bytes());
        frame.extend_from_slice(data);
        frame
    }

    #[tokio::test]
    async fn test_decodes_events_in_order() {
        let mut stream = Vec::new();
        stream.extend(chunk_frame("SA17A.csv", b"form_type,amount\n"));
        stream.extend(chunk_frame("SA17A.csv", b"SA17A,25.00\n"));
        stream.extend(chunk_frame("SB23.csv", b"form_type\n"));
        stream.push(TAG_END);

        let mut reader = FeedReader::new(stream.as_slice());
        let first = reader.next().await.unwrap().unwrap();
        assert_eq!(first.name, "SA17A.csv");
        assert_eq!(first.data, b"form_type,amount\n");

        let second = reader.next().await.unwrap().unwrap();
        assert_eq!(second.name, "SA17A.csv");

        let third = reader.next().await.unwrap().unwrap();
        assert_eq!(third.name, "SB23.csv");

        assert!(reader.next().await.unwrap().is_none());
        // And stays finished
        assert!(reader.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_stream_is_just_the_end_frame() {
        let mut reader = FeedReader::new([TAG_END].as_slice());
        assert!(reader.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_tag_errors() {
        let mut reader = FeedReader::new([0x7Fu8].as_slice());
        let err = reader.next().await.unwrap_err();
        assert!(err.to_string().contains("unknown frame tag"));
    }

    #[tokio::test]
    async fn test_truncated_frame_errors() {
        let mut frame = chunk_frame("a.csv", b"data");
        frame.truncate(frame.len() - 2);
        let mut reader = FeedReader::new(frame.as_slice());
        assert!(reader.next().await.is_err());
    }

    #[tokio::test]
    async fn test_missing_end_frame_errors() {
        let frame = chunk_frame("a.csv", b"data");
        let mut reader = FeedReader::new(frame.as_slice());
        reader.next().await.unwrap().unwrap();

        let err = reader.next().await.unwrap_err();
        assert!(err.to_string().contains("without an end-of-stream frame"));
    }
}
