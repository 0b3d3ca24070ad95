//! Builders for synthetic Matroska and MP4 buffers.

pub mod ebml {
    use crate::ebml::ElementName;

    /// Minimal-length EBML size varint.
    pub fn size_varint(len: usize) -> Vec<u8> {
        if len < 0x7F {
            vec![0x80 | len as u8]
        } else if len < 0x3FFF {
            vec![0x40 | (len >> 8) as u8, len as u8]
        } else {
            let mut out = vec![0x10];
            out.extend(&(len as u32).to_be_bytes()[1..]);
            out
        }
    }

    pub fn element(id: u32, payload: &[u8]) -> Vec<u8> {
        let id_bytes = id.to_be_bytes();
        let first = id_bytes.iter().position(|&b| b != 0).unwrap_or(3);
        let mut out = id_bytes[first..].to_vec();
        out.extend(size_varint(payload.len()));
        out.extend(payload);
        out
    }

    pub fn uint_element(id: u32, value: u64) -> Vec<u8> {
        let bytes = value.to_be_bytes();
        let first = bytes.iter().position(|&b| b != 0).unwrap_or(7);
        element(id, &bytes[first..])
    }

    /// A TrackEntry with the usual fields.
    pub fn track_entry(number: u64, kind: u64, lang: Option<&str>, codec: &str) -> Vec<u8> {
        let mut fields = uint_element(ElementName::TRACK_NUMBER_ID, number);
        fields.extend(uint_element(ElementName::TRACK_TYPE_ID, kind));
        if let Some(lang) = lang {
            fields.extend(element(ElementName::LANGUAGE_ID, lang.as_bytes()));
        }
        fields.extend(element(ElementName::CODEC_ID_ID, codec.as_bytes()));
        element(ElementName::TRACK_ENTRY_ID, &fields)
    }

    pub fn ebml_header() -> Vec<u8> {
        element(ElementName::EBML_ID, &element(0x4282, b"webm"))
    }

    /// EBML header plus a Segment holding `children`.
    pub fn mkv_file(children: &[Vec<u8>]) -> Vec<u8> {
        let mut out = ebml_header();
        out.extend(element(ElementName::SEGMENT_ID, &children.concat()));
        out
    }

    /// EBML header plus an unknown-size Segment, as written by live muxers.
    pub fn live_mkv_file(children: &[Vec<u8>]) -> Vec<u8> {
        let mut out = ebml_header();
        out.extend(ElementName::SEGMENT_ID.to_be_bytes());
        out.push(0xFF);
        out.extend(children.concat());
        out
    }

    pub fn tracks(entries: &[Vec<u8>]) -> Vec<u8> {
        element(ElementName::TRACKS_ID, &entries.concat())
    }
}

pub mod isobmff {
    pub fn mp4_box(name: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
        out.extend(name);
        out.extend(payload);
        out
    }

    pub fn tkhd_payload(track_id: u32) -> Vec<u8> {
        let mut out = vec![0, 0, 0, 7];
        out.extend(0u32.to_be_bytes());
        out.extend(0u32.to_be_bytes());
        out.extend(track_id.to_be_bytes());
        out.extend([0u8; 68]);
        out
    }

    pub fn packed_language(lang: &str) -> u16 {
        lang.bytes()
            .fold(0u16, |acc, c| (acc << 5) | (c.wrapping_sub(0x60) as u16 & 0x1F))
    }

    pub fn mdhd_payload(lang: &str) -> Vec<u8> {
        let mut out = vec![0u8; 4];
        out.extend(0u32.to_be_bytes());
        out.extend(0u32.to_be_bytes());
        out.extend(1000u32.to_be_bytes());
        out.extend(5000u32.to_be_bytes());
        out.extend(packed_language(lang).to_be_bytes());
        out.extend([0, 0]);
        out
    }

    pub fn hdlr_payload(handler: &[u8; 4], name: &str) -> Vec<u8> {
        let mut out = vec![0u8; 8];
        out.extend(handler);
        out.extend([0u8; 12]);
        out.extend(name.as_bytes());
        out
    }

    pub fn stsd_payload(formats: &[&[u8; 4]]) -> Vec<u8> {
        let mut out = vec![0u8; 4];
        out.extend((formats.len() as u32).to_be_bytes());
        for format in formats {
            out.extend(mp4_box(format, &[0u8; 8]));
        }
        out
    }

    /// A complete `trak` with every box the extractor needs.
    pub fn trak(track_id: u32, handler: &[u8; 4], lang: &str, name: &str, codec: &[u8; 4]) -> Vec<u8> {
        let stbl = mp4_box(b"stbl", &mp4_box(b"stsd", &stsd_payload(&[codec])));
        let minf = mp4_box(b"minf", &stbl);
        let mut mdia = mp4_box(b"mdhd", &mdhd_payload(lang));
        mdia.extend(mp4_box(b"hdlr", &hdlr_payload(handler, name)));
        mdia.extend(minf);
        let mut trak = mp4_box(b"tkhd", &tkhd_payload(track_id));
        trak.extend(mp4_box(b"mdia", &mdia));
        mp4_box(b"trak", &trak)
    }

    pub fn ftyp() -> Vec<u8> {
        mp4_box(b"ftyp", b"isom\0\0\x02\0isomiso2")
    }

    pub fn moov(traks: &[Vec<u8>]) -> Vec<u8> {
        let mut payload = mp4_box(b"mvhd", &[0u8; 100]);
        payload.extend(traks.concat());
        mp4_box(b"moov", &payload)
    }
}
