mod buffer;
mod file;
mod stdout;

pub use buffer::BufferSink;
pub use file::FileSink;
pub use stdout::StdoutSink;

use async_trait::async_trait;

/// Trait for the ordered byte consumer behind an archive writer
#[async_trait]
pub trait Sink: Send {
    /// Accept the next run of bytes; calls arrive in emission order
    async fn write(&mut self, buf: &[u8]) -> std::io::Result<()>;

    /// Flush buffered bytes and release the underlying resource
    async fn close(&mut self) -> std::io::Result<()>;
}

#[async_trait]
impl<S: Sink + ?Sized> Sink for Box<S> {
    async fn write(&mut self, buf: &[u8]) -> std::io::Result<()> {
        (**self).write(buf).await
    }

    async fn close(&mut self) -> std::io::Result<()> {
        (**self).close().await
    }
}
