use std::path::Path;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

use super::Sink;

/// Sink that writes the archive to a local file
pub struct FileSink {
    inner: BufWriter<File>,
}

impl FileSink {
    pub async fn create(path: &Path) -> std::io::Result<Self> {
        let file = File::create(path).await?;
        Ok(Self {
            inner: BufWriter::new(file),
        })
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn write(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.inner.write_all(buf).await
    }

    async fn close(&mut self) -> std::io::Result<()> {
        self.inner.shutdown().await
    }
}
