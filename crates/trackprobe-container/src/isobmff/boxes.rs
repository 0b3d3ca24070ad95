//! Field parsers for the boxes that carry track metadata.
//!
//! Each parser takes the box payload (everything after the box header).

use crate::codec::{read_fourcc, read_packed_language, read_u16_be, read_u32_be, read_u64_be};
use crate::error::Result;

/// Track header (`tkhd`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TkhdBox {
    pub version: u8,
    pub flags: u32,
    pub creation_time: u64,
    pub modification_time: u64,
    pub track_id: u32,
}

/// Media header (`mdhd`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdhdBox {
    pub version: u8,
    pub flags: u32,
    pub creation_time: u64,
    pub modification_time: u64,
    pub timescale: u32,
    pub duration: u64,
    /// Decoded ISO 639-2 code, possibly the null or undetermined sentinel.
    pub language: String,
}

/// Handler reference (`hdlr`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HdlrBox {
    pub version: u8,
    pub flags: u32,
    pub handler_type: [u8; 4],
    pub name: String,
}

/// One sample description of an `stsd` box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleEntry<'a> {
    pub size: u32,
    pub format: [u8; 4],
    pub data: &'a [u8],
}

impl SampleEntry<'_> {
    /// Codec name with dashes removed, upper-cased (`ac-3` => `AC3`).
    pub fn codec_name(&self) -> String {
        String::from_utf8_lossy(&self.format)
            .replace('-', "")
            .to_uppercase()
    }
}

/// Sample description (`stsd`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StsdBox<'a> {
    pub version: u8,
    pub flags: u32,
    pub entry_count: u32,
    pub entries: Vec<SampleEntry<'a>>,
}

fn version_flags(payload: &[u8]) -> Result<(u8, u32)> {
    let vf = read_u32_be(payload, 0)?;
    Ok(((vf >> 24) as u8, vf & 0x00FF_FFFF))
}

/// Parse a `tkhd` payload.
pub fn parse_tkhd(payload: &[u8]) -> Result<TkhdBox> {
    let (version, flags) = version_flags(payload)?;

    let (creation_time, modification_time, track_id) = if version == 1 {
        (
            read_u64_be(payload, 4)?,
            read_u64_be(payload, 12)?,
            read_u32_be(payload, 20)?,
        )
    } else {
        (
            read_u32_be(payload, 4)? as u64,
            read_u32_be(payload, 8)? as u64,
            read_u32_be(payload, 12)?,
        )
    };

    Ok(TkhdBox {
        version,
        flags,
        creation_time,
        modification_time,
        track_id,
    })
}

/// Parse an `mdhd` payload.
pub fn parse_mdhd(payload: &[u8]) -> Result<MdhdBox> {
    let (version, flags) = version_flags(payload)?;

    let (creation_time, modification_time, timescale, duration, lang_offset) = if version == 1 {
        (
            read_u64_be(payload, 4)?,
            read_u64_be(payload, 12)?,
            read_u32_be(payload, 20)?,
            read_u64_be(payload, 24)?,
            32,
        )
    } else {
        (
            read_u32_be(payload, 4)? as u64,
            read_u32_be(payload, 8)? as u64,
            read_u32_be(payload, 12)?,
            read_u32_be(payload, 16)? as u64,
            20,
        )
    };

    let language = read_packed_language(read_u16_be(payload, lang_offset)?);

    Ok(MdhdBox {
        version,
        flags,
        creation_time,
        modification_time,
        timescale,
        duration,
        language,
    })
}

/// Parse an `hdlr` payload.
///
/// The name is a NUL-terminated string in ISO files and a length-prefixed
/// one in QuickTime files.
pub fn parse_hdlr(payload: &[u8]) -> Result<HdlrBox> {
    let (version, flags) = version_flags(payload)?;
    let handler_type = read_fourcc(payload, 8)?;
    let raw = payload.get(24..).unwrap_or_default();

    Ok(HdlrBox {
        version,
        flags,
        handler_type,
        name: handler_name(raw),
    })
}

fn handler_name(raw: &[u8]) -> String {
    let bytes = match raw.split_first() {
        Some((&len, rest)) if len != 0 && len as usize == rest.len() => rest,
        _ => raw,
    };
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim().to_string()
}

/// Parse an `stsd` payload.
///
/// Entries are read until the declared count or the end of the payload.
pub fn parse_stsd(payload: &[u8]) -> Result<StsdBox<'_>> {
    let (version, flags) = version_flags(payload)?;
    let entry_count = read_u32_be(payload, 4)?;

    let mut entries = Vec::new();
    let mut pos = 8usize;
    for _ in 0..entry_count {
        if pos + 8 > payload.len() {
            break;
        }
        let size = read_u32_be(payload, pos)?;
        let format = read_fourcc(payload, pos + 4)?;
        let end = (pos + size as usize).min(payload.len());
        entries.push(SampleEntry {
            size,
            format,
            data: payload.get(pos + 8..end).unwrap_or_default(),
        });
        if (size as usize) < 8 {
            break;
        }
        pos += size as usize;
    }

    Ok(StsdBox {
        version,
        flags,
        entry_count,
        entries,
    })
}
