//! Shared builders for integration tests.
//!
//! Produces small but structurally complete Matroska and MP4 files, and a
//! [`RangeResponder`] that serves them from a wiremock server.

#![allow(dead_code)]

use wiremock::{Request, Respond, ResponseTemplate};

pub fn ebml(id: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut out = id.to_vec();
    // 8-byte size varint: handles any payload length.
    out.push(0x01);
    out.extend(&(payload.len() as u64).to_be_bytes()[1..]);
    out.extend(payload);
    out
}

pub fn mp4_box(name: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend(name);
    out.extend(payload);
    out
}

/// One Matroska TrackEntry.
pub fn track_entry(number: u8, kind: u8, lang: &str, name: &str, codec: &str) -> Vec<u8> {
    let mut fields = [
        ebml(&[0xD7], &[number]),
        ebml(&[0x83], &[kind]),
        ebml(&[0x86], codec.as_bytes()),
    ]
    .concat();
    if !lang.is_empty() {
        fields.extend(ebml(&[0x22, 0xB5, 0x9C], lang.as_bytes()));
    }
    if !name.is_empty() {
        fields.extend(ebml(&[0x53, 0x6E], name.as_bytes()));
    }
    ebml(&[0xAE], &fields)
}

/// A Matroska file: EBML header, then a Segment holding `padding` bytes of
/// Void, the Tracks element and a Cluster of `cluster` bytes.
pub fn mkv_file(entries: &[Vec<u8>], padding: usize, cluster: usize) -> Vec<u8> {
    let header = ebml(&[0x1A, 0x45, 0xDF, 0xA3], &ebml(&[0x42, 0x82], b"matroska"));
    let void = ebml(&[0xEC], &vec![0u8; padding]);
    let tracks = ebml(&[0x16, 0x54, 0xAE, 0x6B], &entries.concat());
    let cluster = ebml(&[0x1F, 0x43, 0xB6, 0x75], &vec![0xC3u8; cluster]);
    let segment = ebml(&[0x18, 0x53, 0x80, 0x67], &[void, tracks, cluster].concat());
    [header, segment].concat()
}

/// The default Matroska fixture: video, audio and subtitles.
pub fn sample_mkv(padding: usize) -> Vec<u8> {
    mkv_file(
        &[
            track_entry(1, 1, "und", "", "V_MPEG4/ISO/AVC"),
            track_entry(2, 2, "jpn", "Original", "A_AAC"),
            track_entry(3, 17, "eng", "Signs", "S_TEXT/ASS"),
        ],
        padding,
        4096,
    )
}

/// One MP4 `trak` with every box on the path to `stsd`.
pub fn trak(id: u32, handler: &[u8; 4], lang: &str, name: &str, codec: &[u8; 4]) -> Vec<u8> {
    let mut tkhd = vec![0, 0, 0, 3];
    tkhd.extend([0u8; 8]);
    tkhd.extend(id.to_be_bytes());
    tkhd.extend([0u8; 68]);

    let packed = lang
        .bytes()
        .fold(0u16, |acc, c| (acc << 5) | (c.wrapping_sub(0x60) as u16 & 0x1F));
    let mut mdhd = vec![0u8; 12];
    mdhd.extend(90000u32.to_be_bytes());
    mdhd.extend(0u32.to_be_bytes());
    mdhd.extend(packed.to_be_bytes());
    mdhd.extend([0, 0]);

    let mut hdlr = vec![0u8; 8];
    hdlr.extend(handler);
    hdlr.extend([0u8; 12]);
    hdlr.extend(name.as_bytes());
    hdlr.push(0);

    let mut stsd = vec![0, 0, 0, 0, 0, 0, 0, 1];
    stsd.extend(mp4_box(codec, &[0u8; 24]));

    let minf = mp4_box(b"minf", &mp4_box(b"stbl", &mp4_box(b"stsd", &stsd)));
    let mdia = [mp4_box(b"mdhd", &mdhd), mp4_box(b"hdlr", &hdlr), minf].concat();
    mp4_box(
        b"trak",
        &[mp4_box(b"tkhd", &tkhd), mp4_box(b"mdia", &mdia)].concat(),
    )
}

/// An MP4 file with `free` and `mdat` boxes ahead of `moov`.
pub fn mp4_file(traks: &[Vec<u8>], mdat: usize) -> Vec<u8> {
    let ftyp = mp4_box(b"ftyp", b"mp42\0\0\0\0mp42isom");
    let free = mp4_box(b"free", &[0u8; 64]);
    let mdat = mp4_box(b"mdat", &vec![0x5Au8; mdat]);
    let mut moov = mp4_box(b"mvhd", &[0u8; 100]);
    moov.extend(traks.concat());
    [ftyp, free, mdat, mp4_box(b"moov", &moov)].concat()
}

/// The default MP4 fixture: video, audio and subtitles.
pub fn sample_mp4(mdat: usize) -> Vec<u8> {
    mp4_file(
        &[
            trak(1, b"vide", "und", "VideoHandler", b"avc1"),
            trak(2, b"soun", "ger", "Stereo", b"mp4a"),
            trak(3, b"sbtl", "```", "", b"tx3g"),
        ],
        mdat,
    )
}

/// Serves a byte buffer with `206 Partial Content` responses.
#[derive(Clone)]
pub struct RangeResponder {
    pub data: Vec<u8>,
}

impl RangeResponder {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

fn parse_range(header: &str) -> Option<(usize, usize)> {
    let window = header.strip_prefix("bytes=")?;
    let (start, end) = window.split_once('-')?;
    Some((start.parse().ok()?, end.parse().ok()?))
}

impl Respond for RangeResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let total = self.data.len();
        let range = request
            .headers
            .get("range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_range);

        let Some((start, end)) = range else {
            return ResponseTemplate::new(200).set_body_bytes(self.data.clone());
        };
        if start >= total {
            return ResponseTemplate::new(416)
                .insert_header("content-range", format!("bytes */{}", total).as_str());
        }

        let end = end.min(total - 1);
        ResponseTemplate::new(206)
            .insert_header(
                "content-range",
                format!("bytes {}-{}/{}", start, end, total).as_str(),
            )
            .set_body_bytes(self.data[start..=end].to_vec())
    }
}
