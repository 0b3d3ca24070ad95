//! MP4 (ISO-BMFF) track extraction

use bytes::{Buf, BytesMut};

use super::{Container, DecodeOutcome, RootStructure};
use crate::codec::is_absent_language;
use crate::error::{ContainerError, Result};
use crate::isobmff::{
    find_box, parse_box, parse_boxes, parse_hdlr, parse_mdhd, parse_stsd, parse_tkhd, BoxType,
};
use crate::types::{non_empty, Track, TrackType};

/// `ftyp` type code of the first box.
pub const SIGNATURE: [u8; 4] = *b"ftyp";
pub const SIGNATURE_OFFSET: usize = 4;

/// Handler names muxers write when the user gave none.
const PLACEHOLDER_HANDLER_NAMES: [&str; 3] = ["VideoHandler", "SoundHandler", "SubtitleHandler"];

/// Incremental MP4 extractor.
///
/// Scans top-level boxes until `moov` is complete. Boxes before it are
/// skipped without being buffered. A `moov` cut by the chunk boundary is
/// re-requested whole, once.
#[derive(Debug, Default)]
pub struct Mp4Extractor {
    buffer: BytesMut,
    /// File offset of `buffer[0]`.
    buffer_start: u64,
    /// File offset of a `moov` that was already re-requested.
    refetched_moov: Option<u64>,
}

enum Step {
    Ready { offset: usize, size: usize },
    Refetch { offset: u64, size: u64 },
    Skip { offset: u64 },
    Keep { consumed: usize },
}

impl Mp4Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one chunk.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<DecodeOutcome> {
        self.buffer.extend_from_slice(chunk);

        match self.plan()? {
            Step::Ready { offset, size } => {
                let file_offset = self.buffer_start + offset as u64;
                self.buffer.advance(offset);
                let bytes = self.buffer.split_to(size).freeze();
                tracing::debug!(offset = file_offset, size, "moov buffered");
                Ok(DecodeOutcome::Ready(RootStructure {
                    container: Container::Mp4,
                    offset: file_offset,
                    bytes,
                }))
            }
            Step::Refetch { offset, size } => {
                tracing::debug!(offset, size, "moov truncated, requesting it whole");
                self.refetched_moov = Some(offset);
                self.jump(offset);
                Ok(DecodeOutcome::SkipTo {
                    offset,
                    length: Some(size),
                })
            }
            Step::Skip { offset } => {
                tracing::trace!(from = self.buffer_start, to = offset, "skipping boxes");
                self.jump(offset);
                Ok(DecodeOutcome::SkipTo {
                    offset,
                    length: None,
                })
            }
            Step::Keep { consumed } => {
                self.buffer.advance(consumed);
                self.buffer_start += consumed as u64;
                Ok(DecodeOutcome::NeedMore)
            }
        }
    }

    fn jump(&mut self, offset: u64) {
        self.buffer.clear();
        self.buffer_start = offset;
    }

    fn plan(&self) -> Result<Step> {
        let boxes = parse_boxes(&self.buffer)?;

        if let Some(moov) = boxes.iter().find(|b| b.name == BoxType::MOOV) {
            if moov.open_ended {
                return Err(ContainerError::invalid("moov box without a declared size"));
            }
            if moov.is_complete() {
                return Ok(Step::Ready {
                    offset: moov.offset,
                    size: moov.size as usize,
                });
            }

            let offset = self.buffer_start + moov.offset as u64;
            if self.refetched_moov == Some(offset) {
                // The re-request came back short; keep reading sequentially.
                return Ok(Step::Keep {
                    consumed: moov.offset,
                });
            }
            return Ok(Step::Refetch {
                offset,
                size: moov.size,
            });
        }

        let Some(last) = boxes.last() else {
            return Ok(Step::Keep { consumed: 0 });
        };
        if last.open_ended {
            return Err(ContainerError::invalid(format!(
                "`{}` box runs to end of file before moov",
                last.name
            )));
        }

        let end = last.end();
        if end < self.buffer.len() as u64 {
            // Complete boxes followed by a header fragment.
            return Ok(Step::Keep {
                consumed: end as usize,
            });
        }
        let offset = self.buffer_start.checked_add(end).ok_or_else(|| {
            ContainerError::invalid(format!(
                "`{}` box ends past the addressable range",
                last.name
            ))
        })?;
        Ok(Step::Skip { offset })
    }
}

fn track_type(handler: &[u8; 4]) -> Option<TrackType> {
    match handler {
        b"vide" => Some(TrackType::Video),
        b"soun" => Some(TrackType::Audio),
        b"text" | b"sbtl" | b"subt" => Some(TrackType::Text),
        _ => None,
    }
}

fn label(name: String) -> Option<String> {
    if PLACEHOLDER_HANDLER_NAMES.contains(&name.as_str()) {
        return None;
    }
    non_empty(name)
}

/// Read one `trak`.
///
/// Returns `None` unless every box on the path to the sample description
/// is present: `tkhd`, `mdia`, `mdhd`, `hdlr`, `minf`, `stbl` and `stsd`.
fn parse_trak(payload: &[u8]) -> Result<Option<Track>> {
    let (Some(tkhd), Some(mdia)) = (
        find_box(payload, BoxType::TKHD)?,
        find_box(payload, BoxType::MDIA)?,
    ) else {
        tracing::debug!("dropping trak without tkhd or mdia");
        return Ok(None);
    };

    let (Some(mdhd), Some(hdlr), Some(minf)) = (
        find_box(mdia.payload, BoxType::MDHD)?,
        find_box(mdia.payload, BoxType::HDLR)?,
        find_box(mdia.payload, BoxType::MINF)?,
    ) else {
        tracing::debug!("dropping trak with incomplete mdia");
        return Ok(None);
    };

    let Some(stsd) = find_box(minf.payload, BoxType::STBL)?
        .map(|stbl| find_box(stbl.payload, BoxType::STSD))
        .transpose()?
        .flatten()
    else {
        tracing::debug!("dropping trak without sample description");
        return Ok(None);
    };

    let tkhd = parse_tkhd(tkhd.payload)?;
    let mdhd = parse_mdhd(mdhd.payload)?;
    let hdlr = parse_hdlr(hdlr.payload)?;
    let stsd = parse_stsd(stsd.payload)?;

    Ok(Some(Track {
        id: Some(tkhd.track_id as u64),
        track_type: track_type(&hdlr.handler_type),
        lang: (!is_absent_language(&mdhd.language)).then_some(mdhd.language),
        label: label(hdlr.name),
        codec: stsd
            .entries
            .first()
            .map(|entry| entry.codec_name())
            .and_then(non_empty),
    }))
}

/// Read every `trak` of a buffered `moov` box.
pub fn format_tracks(root: &[u8]) -> Result<Vec<Track>> {
    let moov = match parse_box(root, 0)? {
        Some(b) if b.name == BoxType::MOOV && b.is_complete() => b,
        Some(b) => {
            return Err(ContainerError::invalid(format!(
                "expected complete moov box, found `{}`",
                b.name
            )))
        }
        None => return Err(ContainerError::invalid("empty moov buffer")),
    };

    let mut tracks = Vec::new();
    for trak in parse_boxes(moov.payload)? {
        if trak.name != BoxType::TRAK || !trak.is_complete() {
            continue;
        }
        if let Some(track) = parse_trak(trak.payload)? {
            tracks.push(track);
        }
    }

    Ok(tracks)
}
