use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, Stdout};

use super::Sink;

/// Sink that streams the archive to standard output, for piping into a
/// downstream consumer
pub struct StdoutSink {
    inner: Stdout,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self {
            inner: tokio::io::stdout(),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sink for StdoutSink {
    async fn write(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.inner.write_all(buf).await
    }

    async fn close(&mut self) -> std::io::Result<()> {
        self.inner.flush().await
    }
}
