//! Matroska (MKV/WebM) track extraction

use bytes::{Buf, BytesMut};

use super::{Container, DecodeOutcome, RootStructure};
use crate::codec::{is_absent_language, read_string, read_uint};
use crate::ebml::{parse_element, parse_elements, parse_header, ElementHeader, ElementName};
use crate::error::{ContainerError, Result};
use crate::types::{non_empty, Track, TrackType};

/// EBML header id.
pub const SIGNATURE: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];
pub const SIGNATURE_OFFSET: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    /// Reading top-level elements (EBML header, Segment).
    TopLevel,
    /// Reading Segment children; `end` is unset for unknown-size segments.
    Segment { end: Option<u64> },
}

/// Incremental Matroska extractor.
///
/// Walks the EBML header and the Segment's children until it reaches
/// `Tracks`. Children before it are dropped once passed, or skipped over
/// with a [`DecodeOutcome::SkipTo`] when they extend past the buffered
/// bytes. `Tracks` itself is buffered until complete.
#[derive(Debug)]
pub struct MatroskaExtractor {
    buffer: BytesMut,
    /// File offset of `buffer[0]`.
    buffer_start: u64,
    /// File offset of the next element header.
    cursor: u64,
    level: Level,
}

impl Default for MatroskaExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MatroskaExtractor {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
            buffer_start: 0,
            cursor: 0,
            level: Level::TopLevel,
        }
    }

    fn buffer_end(&self) -> u64 {
        self.buffer_start + self.buffer.len() as u64
    }

    /// Consume one chunk, contiguous with the previous one unless a skip was
    /// requested.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<DecodeOutcome> {
        self.buffer.extend_from_slice(chunk);

        loop {
            if let Level::Segment { end: Some(end) } = self.level {
                if self.cursor >= end {
                    return Err(ContainerError::invalid("Segment has no Tracks element"));
                }
            }

            if self.cursor > self.buffer_end() {
                return Ok(self.skip_to_cursor());
            }

            let rel = (self.cursor - self.buffer_start) as usize;
            let header = match parse_header(&self.buffer, rel) {
                Ok(header) => header,
                Err(ContainerError::Incomplete { .. }) => {
                    self.discard_before_cursor();
                    return Ok(DecodeOutcome::NeedMore);
                }
                Err(e) => return Err(e),
            };

            match (self.level, header.name()) {
                (Level::TopLevel, ElementName::Segment) => {
                    let end = header.payload_size.map(|size| {
                        self.cursor + header.header_size as u64 + size
                    });
                    tracing::trace!(offset = self.cursor, ?end, "entering Segment");
                    self.level = Level::Segment { end };
                    self.cursor += header.header_size as u64;
                }
                (Level::Segment { .. }, ElementName::Tracks) => {
                    return self.take_tracks(&header, rel);
                }
                (_, name) => {
                    let Some(size) = header.payload_size else {
                        return Err(ContainerError::invalid(format!(
                            "unknown-size {name} element before Tracks"
                        )));
                    };
                    tracing::trace!(offset = self.cursor, element = %name, size, "passing element");
                    self.cursor += header.header_size as u64 + size;
                }
            }
        }
    }

    fn take_tracks(&mut self, header: &ElementHeader, rel: usize) -> Result<DecodeOutcome> {
        let Some(size) = header.payload_size else {
            return Err(ContainerError::invalid("Tracks element with unknown size"));
        };
        let total = header.header_size as u64 + size;

        if (self.buffer.len() - rel) as u64 >= total {
            self.buffer.advance(rel);
            let bytes = self.buffer.split_to(total as usize).freeze();
            tracing::debug!(offset = self.cursor, size = total, "Tracks element buffered");
            return Ok(DecodeOutcome::Ready(RootStructure {
                container: Container::Matroska,
                offset: self.cursor,
                bytes,
            }));
        }

        self.discard_before_cursor();
        tracing::trace!(
            offset = self.cursor,
            have = self.buffer.len(),
            need = total,
            "Tracks element incomplete"
        );
        Ok(DecodeOutcome::NeedMore)
    }

    fn discard_before_cursor(&mut self) {
        let rel = (self.cursor - self.buffer_start) as usize;
        self.buffer.advance(rel);
        self.buffer_start = self.cursor;
    }

    fn skip_to_cursor(&mut self) -> DecodeOutcome {
        tracing::debug!(from = self.buffer_end(), to = self.cursor, "skipping element payload");
        self.buffer.clear();
        self.buffer_start = self.cursor;
        DecodeOutcome::SkipTo {
            offset: self.cursor,
            length: None,
        }
    }
}

/// Map a Matroska TrackType value.
fn track_type(value: u64) -> Option<TrackType> {
    match value {
        1 => Some(TrackType::Video),
        2 => Some(TrackType::Audio),
        17 => Some(TrackType::Text),
        _ => None,
    }
}

/// Strip the `V_`/`A_`/`S_` kind prefix from a CodecID.
fn codec_name(codec_id: &str) -> String {
    codec_id
        .strip_prefix("V_")
        .or_else(|| codec_id.strip_prefix("A_"))
        .or_else(|| codec_id.strip_prefix("S_"))
        .unwrap_or(codec_id)
        .to_string()
}

fn language(value: String) -> Option<String> {
    (!is_absent_language(&value)).then_some(value)
}

/// Read one TrackEntry payload. Returns `None` when the entry does not
/// close cleanly.
fn parse_track_entry(payload: &[u8]) -> Result<Option<Track>> {
    let fields = parse_elements(payload)?;
    if let Some(incomplete) = fields.incomplete {
        tracing::debug!(offset = incomplete.offset, "dropping unterminated TrackEntry");
        return Ok(None);
    }

    let mut track = Track::default();
    let mut bcp47 = None;

    for field in &fields.elements {
        match field.name {
            ElementName::TrackNumber => track.id = Some(read_uint(field.payload)?),
            ElementName::TrackType => track.track_type = track_type(read_uint(field.payload)?),
            ElementName::Language => track.lang = language(read_string(field.payload)),
            ElementName::LanguageBcp47 => bcp47 = language(read_string(field.payload)),
            ElementName::Name => track.label = non_empty(read_string(field.payload)),
            ElementName::CodecId => {
                track.codec = non_empty(codec_name(&read_string(field.payload)))
            }
            _ => {}
        }
    }

    if track.lang.is_none() {
        track.lang = bcp47;
    }

    Ok(Some(track))
}

/// Read every TrackEntry of a buffered `Tracks` element.
pub fn format_tracks(root: &[u8]) -> Result<Vec<Track>> {
    let tracks = parse_element(root, 0)?;
    if tracks.name != ElementName::Tracks {
        return Err(ContainerError::invalid(format!(
            "expected Tracks element, found {}",
            tracks.name
        )));
    }

    let entries = parse_elements(tracks.payload)?;
    let mut result = Vec::new();
    for entry in entries.filter(ElementName::TrackEntry) {
        if let Some(track) = parse_track_entry(entry.payload)? {
            result.push(track);
        }
    }

    Ok(result)
}
