//! ISO base media file format (MP4) box walker.
//!
//! A box is a 4-byte big-endian size, a 4-byte type code and a payload. The
//! size covers the header; `1` announces a 64-bit size after the type code
//! and `0` means the box runs to the end of the file.

mod boxes;

pub use boxes::{
    parse_hdlr, parse_mdhd, parse_stsd, parse_tkhd, HdlrBox, MdhdBox, SampleEntry, StsdBox,
    TkhdBox,
};

use std::fmt;

use crate::codec::{read_fourcc, read_u32_be, read_u64_be};
use crate::error::{ContainerError, Result};

/// Header length of a box with a 32-bit size.
pub const BOX_HEADER_SIZE: usize = 8;

/// Header length of a box with a 64-bit size.
pub const LARGE_BOX_HEADER_SIZE: usize = 16;

/// Four-character box type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoxType(pub [u8; 4]);

impl BoxType {
    pub const FTYP: Self = Self(*b"ftyp");
    pub const MOOV: Self = Self(*b"moov");
    pub const MDAT: Self = Self(*b"mdat");
    pub const FREE: Self = Self(*b"free");
    pub const SKIP: Self = Self(*b"skip");
    pub const TRAK: Self = Self(*b"trak");
    pub const TKHD: Self = Self(*b"tkhd");
    pub const MDIA: Self = Self(*b"mdia");
    pub const MDHD: Self = Self(*b"mdhd");
    pub const HDLR: Self = Self(*b"hdlr");
    pub const MINF: Self = Self(*b"minf");
    pub const STBL: Self = Self(*b"stbl");
    pub const STSD: Self = Self(*b"stsd");

    /// Get the 4-char code as a string.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl fmt::Display for BoxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One box of a walked buffer.
///
/// When the buffer ends inside the box, `payload` holds only the bytes that
/// are present and is shorter than `payload_size`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxContainer<'a> {
    pub name: BoxType,
    /// Declared size including the header.
    pub size: u64,
    pub header_size: usize,
    pub payload: &'a [u8],
    pub payload_size: u64,
    /// Offset of the box header within the walked buffer.
    pub offset: usize,
    /// Declared with size `0`: runs to the end of the file.
    pub open_ended: bool,
}

impl BoxContainer<'_> {
    /// Whether the whole payload is present.
    pub fn is_complete(&self) -> bool {
        self.payload.len() as u64 == self.payload_size
    }

    /// Offset just past the box, relative to the walked buffer.
    pub fn end(&self) -> u64 {
        (self.offset as u64).saturating_add(self.size)
    }
}

/// Decode the box starting at `offset`.
///
/// Returns `Ok(None)` when fewer bytes than a header remain.
pub fn parse_box(buffer: &[u8], offset: usize) -> Result<Option<BoxContainer<'_>>> {
    if buffer.len().saturating_sub(offset) < BOX_HEADER_SIZE {
        return Ok(None);
    }

    let size32 = read_u32_be(buffer, offset)?;
    let name = BoxType(read_fourcc(buffer, offset + 4)?);

    let (size, header_size, open_ended) = match size32 {
        0 => {
            let rest = (buffer.len() - offset) as u64;
            (rest, BOX_HEADER_SIZE, true)
        }
        1 => {
            if buffer.len() - offset < LARGE_BOX_HEADER_SIZE {
                return Ok(None);
            }
            let large = read_u64_be(buffer, offset + BOX_HEADER_SIZE)?;
            if large < LARGE_BOX_HEADER_SIZE as u64 {
                return Err(ContainerError::invalid(format!(
                    "box `{name}` at offset {offset} declares 64-bit size {large}"
                )));
            }
            (large, LARGE_BOX_HEADER_SIZE, false)
        }
        n if (n as usize) < BOX_HEADER_SIZE => {
            return Err(ContainerError::invalid(format!(
                "box `{name}` at offset {offset} declares size {n}"
            )));
        }
        n => (n as u64, BOX_HEADER_SIZE, false),
    };

    if (offset as u64).checked_add(size).is_none() {
        return Err(ContainerError::invalid(format!(
            "box `{name}` at offset {offset} declares size {size} past the addressable range"
        )));
    }

    let start = offset + header_size;
    let payload_size = size - header_size as u64;
    let available = (buffer.len() - start) as u64;
    let end = start + payload_size.min(available) as usize;

    Ok(Some(BoxContainer {
        name,
        size,
        header_size,
        payload: &buffer[start..end],
        payload_size,
        offset,
        open_ended,
    }))
}

/// Walk the boxes of `buffer` in order.
///
/// The last box may be partial (see [`BoxContainer::is_complete`]). Trailing
/// bytes too short for a header are left unwalked.
pub fn parse_boxes(buffer: &[u8]) -> Result<Vec<BoxContainer<'_>>> {
    let mut boxes = Vec::new();
    let mut offset = 0usize;

    while offset < buffer.len() {
        let Some(parsed) = parse_box(buffer, offset)? else {
            break;
        };
        let end = parsed.end();
        boxes.push(parsed);
        if end >= buffer.len() as u64 {
            break;
        }
        offset = end as usize;
    }

    Ok(boxes)
}

/// Walk `buffer` and return the first complete child of type `name`.
pub fn find_box<'a>(buffer: &'a [u8], name: BoxType) -> Result<Option<BoxContainer<'a>>> {
    Ok(parse_boxes(buffer)?
        .into_iter()
        .find(|b| b.name == name && b.is_complete()))
}
