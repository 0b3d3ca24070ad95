//! EBML element walker for Matroska/WebM.
//!
//! The walker decodes one level of the element tree at a time. Descending
//! into a master element means walking its payload again with
//! [`parse_elements`].

use std::fmt;

use crate::codec::{is_unknown_size, read_ebml_id, read_ebml_varint};
use crate::error::{ContainerError, Result};

/// Symbolic names for the element ids this crate cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementName {
    Ebml,
    Segment,
    SeekHead,
    Info,
    Tracks,
    TrackEntry,
    TrackNumber,
    TrackType,
    Language,
    LanguageBcp47,
    Name,
    CodecId,
    Cluster,
    Void,
    Unknown(u32),
}

impl ElementName {
    pub const EBML_ID: u32 = 0x1A45_DFA3;
    pub const SEGMENT_ID: u32 = 0x1853_8067;
    pub const SEEK_HEAD_ID: u32 = 0x114D_9B74;
    pub const INFO_ID: u32 = 0x1549_A966;
    pub const TRACKS_ID: u32 = 0x1654_AE6B;
    pub const TRACK_ENTRY_ID: u32 = 0xAE;
    pub const TRACK_NUMBER_ID: u32 = 0xD7;
    pub const TRACK_TYPE_ID: u32 = 0x83;
    pub const LANGUAGE_ID: u32 = 0x22_B59C;
    pub const LANGUAGE_BCP47_ID: u32 = 0x22_B59D;
    pub const NAME_ID: u32 = 0x536E;
    pub const CODEC_ID_ID: u32 = 0x86;
    pub const CLUSTER_ID: u32 = 0x1F43_B675;
    pub const VOID_ID: u32 = 0xEC;

    pub fn from_id(id: u32) -> Self {
        match id {
            Self::EBML_ID => Self::Ebml,
            Self::SEGMENT_ID => Self::Segment,
            Self::SEEK_HEAD_ID => Self::SeekHead,
            Self::INFO_ID => Self::Info,
            Self::TRACKS_ID => Self::Tracks,
            Self::TRACK_ENTRY_ID => Self::TrackEntry,
            Self::TRACK_NUMBER_ID => Self::TrackNumber,
            Self::TRACK_TYPE_ID => Self::TrackType,
            Self::LANGUAGE_ID => Self::Language,
            Self::LANGUAGE_BCP47_ID => Self::LanguageBcp47,
            Self::NAME_ID => Self::Name,
            Self::CODEC_ID_ID => Self::CodecId,
            Self::CLUSTER_ID => Self::Cluster,
            Self::VOID_ID => Self::Void,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for ElementName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ebml => write!(f, "EBML"),
            Self::Segment => write!(f, "Segment"),
            Self::SeekHead => write!(f, "SeekHead"),
            Self::Info => write!(f, "Info"),
            Self::Tracks => write!(f, "Tracks"),
            Self::TrackEntry => write!(f, "TrackEntry"),
            Self::TrackNumber => write!(f, "TrackNumber"),
            Self::TrackType => write!(f, "TrackType"),
            Self::Language => write!(f, "Language"),
            Self::LanguageBcp47 => write!(f, "LanguageBCP47"),
            Self::Name => write!(f, "Name"),
            Self::CodecId => write!(f, "CodecID"),
            Self::Cluster => write!(f, "Cluster"),
            Self::Void => write!(f, "Void"),
            Self::Unknown(id) => write!(f, "{}", id_to_hex(*id)),
        }
    }
}

/// Upper-case hex rendering of an element id (`0xAE` => `"AE"`).
pub fn id_to_hex(id: u32) -> String {
    let bytes = id.to_be_bytes();
    let first = bytes.iter().position(|&b| b != 0).unwrap_or(3);
    bytes[first..].iter().map(|b| format!("{b:02X}")).collect()
}

/// Decoded element header: id and declared payload size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementHeader {
    pub id: u32,
    /// Offset of the id within the walked buffer.
    pub offset: usize,
    /// Bytes taken by id + size varints.
    pub header_size: usize,
    /// Declared payload size; `None` for the reserved unknown size.
    pub payload_size: Option<u64>,
}

impl ElementHeader {
    pub fn name(&self) -> ElementName {
        ElementName::from_id(self.id)
    }

    /// Offset just past the element, when its size is known.
    pub fn end(&self) -> Option<u64> {
        self.payload_size
            .map(|size| self.offset as u64 + self.header_size as u64 + size)
    }

    pub fn payload_offset(&self) -> usize {
        self.offset + self.header_size
    }
}

/// One element of a walked buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element<'a> {
    pub id: u32,
    pub name: ElementName,
    /// Header plus payload length.
    pub size: u64,
    pub payload: &'a [u8],
    pub payload_size: u64,
    pub offset: usize,
    /// The element declared the reserved unknown size and runs to the end
    /// of the walked buffer.
    pub unknown_size: bool,
}

impl Element<'_> {
    pub fn id_hex(&self) -> String {
        id_to_hex(self.id)
    }
}

/// Position where a walk ran out of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Incomplete {
    /// Offset of the partial element within the walked buffer.
    pub offset: usize,
    /// Bytes still missing, when known. Zero means the header itself is cut.
    pub needed: u64,
}

impl From<Incomplete> for ContainerError {
    fn from(inc: Incomplete) -> Self {
        ContainerError::Incomplete {
            offset: inc.offset as u64,
            needed: inc.needed,
        }
    }
}

/// Result of walking one level of a buffer.
#[derive(Debug, Clone, Default)]
pub struct Walk<'a> {
    /// Every element fully contained in the buffer, in order.
    pub elements: Vec<Element<'a>>,
    /// Set when the buffer ends inside an element.
    pub incomplete: Option<Incomplete>,
}

impl<'a> Walk<'a> {
    pub fn find(&self, name: ElementName) -> Option<&Element<'a>> {
        self.elements.iter().find(|e| e.name == name)
    }

    pub fn filter(&self, name: ElementName) -> impl Iterator<Item = &Element<'a>> {
        self.elements.iter().filter(move |e| e.name == name)
    }
}

/// Decode the id and size varints at `offset`.
///
/// A header cut by the end of the buffer is reported as
/// [`ContainerError::Incomplete`].
pub fn parse_header(buffer: &[u8], offset: usize) -> Result<ElementHeader> {
    let cut = |e: ContainerError| match e {
        ContainerError::TruncatedField { .. } => ContainerError::Incomplete {
            offset: offset as u64,
            needed: 0,
        },
        other => other,
    };

    if offset >= buffer.len() {
        return Err(ContainerError::Incomplete {
            offset: offset as u64,
            needed: 0,
        });
    }
    let (id, id_len) = read_ebml_id(buffer, offset).map_err(cut)?;
    if offset + id_len >= buffer.len() {
        return Err(ContainerError::Incomplete {
            offset: offset as u64,
            needed: 0,
        });
    }
    let (size, size_len) = read_ebml_varint(buffer, offset + id_len).map_err(cut)?;

    Ok(ElementHeader {
        id,
        offset,
        header_size: id_len + size_len,
        payload_size: (!is_unknown_size(size, size_len)).then_some(size),
    })
}

/// Decode the element starting at `offset`.
///
/// Unknown-size elements take the rest of the buffer as their payload. A
/// payload running past the buffer end yields [`ContainerError::Incomplete`].
pub fn parse_element(buffer: &[u8], offset: usize) -> Result<Element<'_>> {
    let header = parse_header(buffer, offset)?;
    let start = header.payload_offset();
    let available = (buffer.len() - start) as u64;

    let (payload_size, unknown_size) = match header.payload_size {
        Some(size) if size > available => {
            return Err(ContainerError::Incomplete {
                offset: offset as u64,
                needed: size - available,
            });
        }
        Some(size) => (size, false),
        None => (available, true),
    };

    let end = start + payload_size as usize;
    Ok(Element {
        id: header.id,
        name: header.name(),
        size: header.header_size as u64 + payload_size,
        payload: &buffer[start..end],
        payload_size,
        offset,
        unknown_size,
    })
}

/// Walk every fully contained element of `buffer`.
///
/// Stops at the first partial element and records where it starts; a
/// malformed varint is an error.
pub fn parse_elements(buffer: &[u8]) -> Result<Walk<'_>> {
    let mut walk = Walk::default();
    let mut offset = 0;

    while offset < buffer.len() {
        match parse_element(buffer, offset) {
            Ok(element) => {
                offset += element.size as usize;
                walk.elements.push(element);
            }
            Err(ContainerError::Incomplete { needed, .. }) => {
                walk.incomplete = Some(Incomplete { offset, needed });
                break;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(walk)
}
