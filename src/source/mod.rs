//! Byte sources feeding an extraction.
//!
//! A source delivers one chunk per [`ByteSource::next_chunk`] call, starting
//! at its current offset. The session moves the offset with
//! [`ByteSource::set_next_range`] between reads, bracketed by
//! [`ByteSource::pause`] and [`ByteSource::resume`].

mod file;
mod http;
mod memory;

pub use file::FileSource;
pub use http::HttpSource;
pub use memory::MemorySource;

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;

use crate::config::Config;
use crate::error::{Error, Result, SourceError};

/// A resource that can be read in ranges.
#[async_trait]
pub trait ByteSource: Send {
    /// Offset of the next read.
    fn offset(&self) -> u64;

    /// Length of the next read.
    fn chunk_size(&self) -> u64;

    /// Bytes delivered so far.
    fn bytes_read(&self) -> u64;

    /// Size of the resource, once known.
    fn total_size(&self) -> Option<u64>;

    fn pause(&mut self);

    fn resume(&mut self);

    fn is_paused(&self) -> bool;

    /// Move the next read to `offset`. With `length`, only the next read
    /// uses that length; later reads fall back to the default chunk size.
    fn set_next_range(&mut self, offset: u64, length: Option<u64>);

    /// Read the next chunk. `Ok(None)` means no more data.
    async fn next_chunk(&mut self) -> std::result::Result<Option<Bytes>, SourceError>;

    /// Stop reading and release every handle. Later reads fail with
    /// [`SourceError::Destroyed`].
    fn destroy(&mut self);

    fn is_destroyed(&self) -> bool;
}

/// Read position and lifecycle flags shared by the source implementations.
#[derive(Debug, Clone)]
pub(crate) struct ReadState {
    offset: u64,
    default_chunk_size: u64,
    next_length: Option<u64>,
    bytes_read: u64,
    paused: bool,
    destroyed: bool,
}

impl ReadState {
    pub(crate) fn new(chunk_size: u64) -> Self {
        Self {
            offset: 0,
            default_chunk_size: chunk_size.max(1),
            next_length: None,
            bytes_read: 0,
            paused: false,
            destroyed: false,
        }
    }

    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }

    pub(crate) fn chunk_size(&self) -> u64 {
        self.next_length.unwrap_or(self.default_chunk_size)
    }

    pub(crate) fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub(crate) fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused
    }

    pub(crate) fn set_next_range(&mut self, offset: u64, length: Option<u64>) {
        self.offset = offset;
        self.next_length = length.filter(|&l| l > 0);
    }

    pub(crate) fn destroy(&mut self) {
        self.destroyed = true;
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Fail unless a read may start now.
    pub(crate) fn check_readable(&self) -> std::result::Result<(), SourceError> {
        if self.destroyed {
            return Err(SourceError::Destroyed);
        }
        if self.paused {
            return Err(SourceError::Paused);
        }
        Ok(())
    }

    /// Range `(offset, length)` of the next read, clamped to `total`.
    /// `None` once the offset is at or past the end.
    pub(crate) fn next_range(&self, total: Option<u64>) -> Option<(u64, u64)> {
        let mut length = self.chunk_size();
        if let Some(total) = total {
            if self.offset >= total {
                return None;
            }
            length = length.min(total - self.offset);
        }
        Some((self.offset, length))
    }

    /// Record a delivered chunk of `len` bytes.
    pub(crate) fn advance(&mut self, len: u64) {
        self.offset += len;
        self.bytes_read += len;
        self.next_length = None;
    }
}

/// What an input string refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Remote(Url),
    Local(PathBuf),
}

impl Input {
    /// Classify `input`: `http`/`https` URLs are remote, `file://` URLs and
    /// everything else are local paths.
    pub fn parse(input: &str) -> Result<Self> {
        match Url::parse(input) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Input::Remote(url)),
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(Input::Local)
                .map_err(|_| Error::invalid_input(format!("Not a local file URL: {input}"))),
            _ => Ok(Input::Local(PathBuf::from(input))),
        }
    }
}

/// Open a source for a local path or URL.
pub async fn open_source(
    input: &str,
    config: &Config,
    chunk_size: u64,
) -> Result<Box<dyn ByteSource>> {
    match Input::parse(input)? {
        Input::Remote(url) => {
            tracing::debug!(url = %url, "opening HTTP source");
            Ok(Box::new(HttpSource::new(url, &config.http, chunk_size)?))
        }
        Input::Local(path) => {
            tracing::debug!(path = ?path, "opening file source");
            match FileSource::open(&path, chunk_size).await {
                Ok(source) => Ok(Box::new(source)),
                Err(SourceError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Err(
                    Error::invalid_input(format!("File does not exist: {}", path.display())),
                ),
                Err(e) => Err(e.into()),
            }
        }
    }
}
