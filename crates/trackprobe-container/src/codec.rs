//! Primitive binary decoding shared by both container walkers.
//!
//! EBML stores integers with a leading-1 length marker:
//! - 1 byte:  `1xxx xxxx`
//! - 2 bytes: `01xx xxxx xxxx xxxx`
//! - ...
//! - 8 bytes: `0000 0001 xxxx xxxx ...`
//!
//! ISO-BMFF fields are fixed-width big-endian integers, except for the
//! `mdhd` language which packs three 5-bit characters into a `u16`.

use crate::error::{ContainerError, Result};

/// Packed language value that decodes from `0x0000`.
pub const NULL_LANGUAGE: &str = "```";

/// ISO 639-2 code for an undetermined language.
pub const UNDETERMINED_LANGUAGE: &str = "und";

/// Longest EBML element id, in bytes.
pub const MAX_ID_LENGTH: usize = 4;

/// Longest EBML varint, in bytes.
pub const MAX_VARINT_LENGTH: usize = 8;

/// Read an EBML variable-length integer with its marker bit removed.
///
/// Returns the value and the number of bytes it occupies.
pub fn read_ebml_varint(buffer: &[u8], offset: usize) -> Result<(u64, usize)> {
    let first = *buffer
        .get(offset)
        .ok_or(ContainerError::MalformedVarint { offset })?;
    let length = varint_length(first, offset)?;
    let bytes = slice(buffer, offset, length)?;

    let mask = (0xFFu32 >> length) as u8;
    let value = bytes[1..]
        .iter()
        .fold((first & mask) as u64, |acc, &b| (acc << 8) | b as u64);

    Ok((value, length))
}

/// Read an EBML element id, keeping the marker bit.
///
/// Matroska ids are written with their marker (e.g. `0x1A45DFA3`), so the
/// raw bytes form the id directly.
pub fn read_ebml_id(buffer: &[u8], offset: usize) -> Result<(u32, usize)> {
    let first = *buffer
        .get(offset)
        .ok_or(ContainerError::MalformedVarint { offset })?;
    let length = varint_length(first, offset)?;
    if length > MAX_ID_LENGTH {
        return Err(ContainerError::MalformedVarint { offset });
    }
    let bytes = slice(buffer, offset, length)?;
    let id = bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
    Ok((id, length))
}

/// Whether a decoded size varint is the reserved "unknown size" value.
pub fn is_unknown_size(value: u64, length: usize) -> bool {
    value == (1u64 << (7 * length)) - 1
}

fn varint_length(first: u8, offset: usize) -> Result<usize> {
    if first == 0 {
        return Err(ContainerError::MalformedVarint { offset });
    }
    Ok(first.leading_zeros() as usize + 1)
}

/// Decode an ISO-639-2/T packed language code.
///
/// Bits 14-10, 9-5 and 4-0 each hold one character minus `0x60`. A zero
/// value decodes to [`NULL_LANGUAGE`].
pub fn read_packed_language(packed: u16) -> String {
    [10u16, 5, 0]
        .iter()
        .map(|shift| (((packed >> shift) & 0x1F) as u8 + 0x60) as char)
        .collect()
}

/// Whether a language code means "no language".
pub fn is_absent_language(lang: &str) -> bool {
    lang.is_empty() || lang == UNDETERMINED_LANGUAGE || lang == NULL_LANGUAGE
}

/// Read a big-endian `u16`.
pub fn read_u16_be(buffer: &[u8], offset: usize) -> Result<u16> {
    let bytes = slice(buffer, offset, 2)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// Read a big-endian `u32`.
pub fn read_u32_be(buffer: &[u8], offset: usize) -> Result<u32> {
    let bytes = slice(buffer, offset, 4)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Read a big-endian `u64`.
pub fn read_u64_be(buffer: &[u8], offset: usize) -> Result<u64> {
    let bytes = slice(buffer, offset, 8)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    Ok(u64::from_be_bytes(raw))
}

/// Read a four-character code.
pub fn read_fourcc(buffer: &[u8], offset: usize) -> Result<[u8; 4]> {
    let bytes = slice(buffer, offset, 4)?;
    Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Decode an EBML unsigned integer payload (0 to 8 bytes, big-endian).
pub fn read_uint(payload: &[u8]) -> Result<u64> {
    if payload.len() > 8 {
        return Err(ContainerError::invalid(format!(
            "unsigned integer element of {} bytes",
            payload.len()
        )));
    }
    Ok(payload.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
}

/// Decode an EBML string payload, dropping trailing NUL padding.
pub fn read_string(payload: &[u8]) -> String {
    let end = payload
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |pos| pos + 1);
    String::from_utf8_lossy(&payload[..end]).into_owned()
}

fn slice(buffer: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| buffer.get(offset..end))
        .ok_or(ContainerError::TruncatedField {
            offset,
            need: len,
            have: buffer.len().saturating_sub(offset),
        })
}
