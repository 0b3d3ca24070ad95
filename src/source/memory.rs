use async_trait::async_trait;
use bytes::Bytes;

use super::{ByteSource, ReadState};
use crate::error::SourceError;

/// In-memory buffer served with the same range semantics as a file.
///
/// Every served range is recorded, which makes it easy to check which parts
/// of a resource an extraction touched.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Bytes,
    state: ReadState,
    requests: Vec<(u64, u64)>,
}

impl MemorySource {
    pub fn new(data: impl Into<Bytes>, chunk_size: u64) -> Self {
        Self {
            data: data.into(),
            state: ReadState::new(chunk_size),
            requests: Vec::new(),
        }
    }

    /// `(offset, length)` of every read, in order.
    pub fn requests(&self) -> &[(u64, u64)] {
        &self.requests
    }
}

#[async_trait]
impl ByteSource for MemorySource {
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
        Some(self.data.len() as u64)
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
        let Some((offset, length)) = self.state.next_range(self.total_size()) else {
            return Ok(None);
        };

        self.requests.push((offset, length));
        let start = offset as usize;
        let chunk = self.data.slice(start..start + length as usize);
        self.state.advance(length);
        Ok(Some(chunk))
    }

    fn destroy(&mut self) {
        self.state.destroy();
    }

    fn is_destroyed(&self) -> bool {
        self.state.is_destroyed()
    }
}
