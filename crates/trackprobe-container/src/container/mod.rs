//! Container format detection and incremental track extraction.
//!
//! An extraction is driven by a caller that owns the byte source. Each
//! delivered chunk goes through [`Extractor::decode`], whose
//! [`DecodeOutcome`] tells the caller where the next chunk must come from.
//! Once the governing structure is buffered, [`Extractor::format`] turns it
//! into [`Track`] records.

pub mod mkv;
pub mod mp4;

use std::fmt;

use bytes::Bytes;

use crate::error::{ContainerError, Result};
use crate::types::Track;

pub use mkv::MatroskaExtractor;
pub use mp4::Mp4Extractor;

/// Supported container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    /// Matroska (.mkv, .webm)
    Matroska,
    /// MPEG-4 Part 14 (.mp4, .m4v, .mov)
    Mp4,
}

impl Container {
    /// Formats in the order they are tried during detection.
    pub const ALL: [Container; 2] = [Container::Matroska, Container::Mp4];

    /// Magic bytes identifying the format.
    pub fn signature(&self) -> &'static [u8] {
        match self {
            Container::Matroska => &mkv::SIGNATURE,
            Container::Mp4 => &mp4::SIGNATURE,
        }
    }

    /// Offset of the signature from the start of the file.
    pub fn signature_offset(&self) -> usize {
        match self {
            Container::Matroska => mkv::SIGNATURE_OFFSET,
            Container::Mp4 => mp4::SIGNATURE_OFFSET,
        }
    }

    /// Whether the head of a file carries this format's signature.
    pub fn matches(&self, head: &[u8]) -> bool {
        let start = self.signature_offset();
        let signature = self.signature();
        head.get(start..start + signature.len()) == Some(signature)
    }

    /// Smallest file head that can be told apart by [`Container::detect`].
    pub fn detection_len() -> usize {
        Self::ALL
            .iter()
            .map(|c| c.signature_offset() + c.signature().len())
            .max()
            .unwrap_or(0)
    }

    /// Detect the container format from the first bytes of a file.
    pub fn detect(head: &[u8]) -> Option<Container> {
        Self::ALL.into_iter().find(|c| c.matches(head))
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Container::Matroska => write!(f, "Matroska"),
            Container::Mp4 => write!(f, "MP4"),
        }
    }
}

/// The fully buffered structure holding every track description: the
/// Matroska `Tracks` element or the MP4 `moov` box, header included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootStructure {
    pub container: Container,
    /// File offset of the structure's first byte.
    pub offset: u64,
    pub bytes: Bytes,
}

/// What the caller has to do after a chunk was decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Deliver the next sequential chunk.
    NeedMore,
    /// Continue reading at `offset`. With `length`, the next chunk must be
    /// exactly that many bytes so it holds a self-contained structure.
    SkipTo { offset: u64, length: Option<u64> },
    /// The root structure is complete; stop reading.
    Ready(RootStructure),
}

/// Per-format track extractor, chosen once from the first chunk.
#[derive(Debug)]
pub enum Extractor {
    Matroska(MatroskaExtractor),
    Mp4(Mp4Extractor),
}

impl Extractor {
    /// Create a fresh extractor for `container`.
    pub fn new(container: Container) -> Self {
        match container {
            Container::Matroska => Extractor::Matroska(MatroskaExtractor::new()),
            Container::Mp4 => Extractor::Mp4(Mp4Extractor::new()),
        }
    }

    /// Pick the extractor whose signature matches the first chunk.
    pub fn detect(first_chunk: &[u8]) -> Result<Self> {
        Container::detect(first_chunk)
            .map(Self::new)
            .ok_or(ContainerError::UnsupportedFormat)
    }

    pub fn container(&self) -> Container {
        match self {
            Extractor::Matroska(_) => Container::Matroska,
            Extractor::Mp4(_) => Container::Mp4,
        }
    }

    /// Consume one delivered chunk.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<DecodeOutcome> {
        match self {
            Extractor::Matroska(ex) => ex.decode(chunk),
            Extractor::Mp4(ex) => ex.decode(chunk),
        }
    }

    /// Turn a root structure into tracks, in container order.
    pub fn format(&self, root: &RootStructure) -> Result<Vec<Track>> {
        if root.container != self.container() {
            return Err(ContainerError::invalid(format!(
                "{} extractor given a {} structure",
                self.container(),
                root.container
            )));
        }
        match self {
            Extractor::Matroska(_) => mkv::format_tracks(&root.bytes),
            Extractor::Mp4(_) => mp4::format_tracks(&root.bytes),
        }
    }
}
