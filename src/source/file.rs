use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::{ByteSource, ReadState};
use crate::error::SourceError;

/// Local file read in ranges.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    file: Option<File>,
    size: u64,
    state: ReadState,
}

impl FileSource {
    /// Open `path`; its size is taken from the file metadata.
    pub async fn open(path: impl AsRef<Path>, chunk_size: u64) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).await?;
        let size = file.metadata().await?.len();

        Ok(Self {
            path,
            file: Some(file),
            size,
            state: ReadState::new(chunk_size),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ByteSource for FileSource {
    fn offset(&self) -> u64 {
        self.state.offset()
    }

    fn chunk_size(&self) -> u64 {
        self.state.chunk_size()
    }

    fn bytes_read(&self) -> u64 {
        self.state.bytes_read()
    }

    fn total_size(&self) -> Option<u64> {
        Some(self.size)
    }

    fn pause(&mut self) {
        self.state.set_paused(true);
    }

    fn resume(&mut self) {
        self.state.set_paused(false);
    }

    fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    fn set_next_range(&mut self, offset: u64, length: Option<u64>) {
        self.state.set_next_range(offset, length);
    }

    async fn next_chunk(&mut self) -> Result<Option<Bytes>, SourceError> {
        self.state.check_readable()?;
        let Some((offset, length)) = self.state.next_range(Some(self.size)) else {
            return Ok(None);
        };
        let file = self.file.as_mut().ok_or(SourceError::Destroyed)?;

        file.seek(SeekFrom::Start(offset)).await?;
        let mut buf = Vec::with_capacity(length as usize);
        file.take(length).read_to_end(&mut buf).await?;

        if buf.is_empty() {
            return Ok(None);
        }

        tracing::trace!(path = ?self.path, offset, length = buf.len(), "read file chunk");
        self.state.advance(buf.len() as u64);
        Ok(Some(Bytes::from(buf)))
    }

    fn destroy(&mut self) {
        self.file = None;
        self.state.destroy();
    }

    fn is_destroyed(&self) -> bool {
        self.state.is_destroyed()
    }
}
