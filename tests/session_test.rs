//! Extraction session tests over in-memory and file sources

mod common;

use assert_matches::assert_matches;
use std::io::Write;

use common::{ebml, sample_mkv, sample_mp4, track_entry};
use trackprobe::config::ExtractOptions;
use trackprobe::source::{ByteSource, FileSource, MemorySource};
use trackprobe::{extract, extract_from, Error, Track, TrackType};

fn options(chunk_size: u64) -> ExtractOptions {
    ExtractOptions {
        max_bytes: None,
        chunk_size,
    }
}

fn expected_mkv_tracks() -> Vec<Track> {
    vec![
        Track {
            id: Some(1),
            track_type: Some(TrackType::Video),
            lang: None,
            label: None,
            codec: Some("MPEG4/ISO/AVC".to_string()),
        },
        Track {
            id: Some(2),
            track_type: Some(TrackType::Audio),
            lang: Some("jpn".to_string()),
            label: Some("Original".to_string()),
            codec: Some("AAC".to_string()),
        },
        Track {
            id: Some(3),
            track_type: Some(TrackType::Text),
            lang: Some("eng".to_string()),
            label: Some("Signs".to_string()),
            codec: Some("TEXT/ASS".to_string()),
        },
    ]
}

fn expected_mp4_tracks() -> Vec<Track> {
    vec![
        Track {
            id: Some(1),
            track_type: Some(TrackType::Video),
            lang: None,
            label: None,
            codec: Some("AVC1".to_string()),
        },
        Track {
            id: Some(2),
            track_type: Some(TrackType::Audio),
            lang: Some("ger".to_string()),
            label: Some("Stereo".to_string()),
            codec: Some("MP4A".to_string()),
        },
        Track {
            id: Some(3),
            track_type: Some(TrackType::Text),
            lang: None,
            label: None,
            codec: Some("TX3G".to_string()),
        },
    ]
}

/// Test Matroska extraction with the Tracks element in the first chunk
#[tokio::test]
async fn test_mkv_single_chunk() {
    let mut source = MemorySource::new(sample_mkv(16), 64 * 1024);
    let tracks = extract_from(&mut source, &options(64 * 1024)).await.unwrap();

    assert_eq!(tracks, expected_mkv_tracks());
    assert_eq!(source.requests().len(), 1);
    assert!(source.is_destroyed());
}

/// Test that Void padding before Tracks is skipped, not read
#[tokio::test]
async fn test_mkv_skips_padding() {
    let file = sample_mkv(500_000);
    let mut source = MemorySource::new(file, 4096);
    let tracks = extract_from(&mut source, &options(4096)).await.unwrap();

    assert_eq!(tracks, expected_mkv_tracks());
    assert!(source.bytes_read() < 3 * 4096);
    assert_eq!(source.requests()[0], (0, 4096));
    assert!(source.requests()[1].0 > 500_000);
}

/// Test Matroska extraction when every chunk is smaller than an element
#[tokio::test]
async fn test_mkv_tiny_chunks() {
    let mut source = MemorySource::new(sample_mkv(100), 8);
    let tracks = extract_from(&mut source, &options(8)).await.unwrap();
    assert_eq!(tracks, expected_mkv_tracks());
}

/// Test a live WebM stream whose Segment has no declared size
#[tokio::test]
async fn test_mkv_unknown_size_segment() {
    let mut file = ebml(&[0x1A, 0x45, 0xDF, 0xA3], &ebml(&[0x42, 0x82], b"webm"));
    file.extend([0x18, 0x53, 0x80, 0x67, 0xFF]);
    file.extend(ebml(&[0x15, 0x49, 0xA9, 0x66], &[0u8; 2000]));
    file.extend(ebml(
        &[0x16, 0x54, 0xAE, 0x6B],
        &track_entry(1, 1, "eng", "", "V_VP9"),
    ));
    file.extend(ebml(&[0x1F, 0x43, 0xB6, 0x75], &[0xC3u8; 512]));

    for chunk_size in [16, 4096] {
        let mut source = MemorySource::new(file.clone(), chunk_size);
        let tracks = extract_from(&mut source, &options(chunk_size)).await.unwrap();
        assert_eq!(
            tracks,
            vec![Track {
                id: Some(1),
                track_type: Some(TrackType::Video),
                lang: Some("eng".to_string()),
                label: None,
                codec: Some("VP9".to_string()),
            }],
            "chunk size {chunk_size}"
        );
    }
}

/// Test that MP4 extraction skips mdat and refetches a cut moov whole
#[tokio::test]
async fn test_mp4_skip_and_refetch() {
    let file = sample_mp4(100_000);
    let moov_offset = 24 + 72 + 100_008;
    let moov_len = file.len() as u64 - moov_offset;

    let mut source = MemorySource::new(file, 256);
    let tracks = extract_from(&mut source, &options(256)).await.unwrap();

    assert_eq!(tracks, expected_mp4_tracks());
    assert_eq!(
        source.requests(),
        &[(0, 256), (moov_offset, 256), (moov_offset, moov_len)]
    );
}

/// Test that extraction results do not depend on the chunk size
#[tokio::test]
async fn test_chunk_size_independence() {
    for chunk_size in [16, 100, 1000, 1 << 20] {
        let mut source = MemorySource::new(sample_mp4(5_000), chunk_size);
        let tracks = extract_from(&mut source, &options(chunk_size)).await.unwrap();
        assert_eq!(tracks, expected_mp4_tracks(), "chunk size {chunk_size}");

        let mut source = MemorySource::new(sample_mkv(5_000), chunk_size);
        let tracks = extract_from(&mut source, &options(chunk_size)).await.unwrap();
        assert_eq!(tracks, expected_mkv_tracks(), "chunk size {chunk_size}");
    }
}

/// Test that chunks smaller than the MP4 signature window still detect MP4
#[tokio::test]
async fn test_mp4_chunk_smaller_than_signature() {
    let mut source = MemorySource::new(sample_mp4(1_000), 4);
    let tracks = extract_from(&mut source, &options(4)).await.unwrap();
    assert_eq!(tracks, expected_mp4_tracks());
    assert_eq!(source.requests()[0], (0, 8));
}

/// Test that a file cut inside moov fails as truncated
#[tokio::test]
async fn test_truncated_file() {
    let mut file = sample_mp4(1_000);
    file.truncate(file.len() - 50);

    let mut source = MemorySource::new(file, 512);
    let err = extract_from(&mut source, &options(512)).await.unwrap_err();
    assert_matches!(err, Error::Truncated { .. });
    assert!(source.is_destroyed());
}

/// Test that a corrupt element id fails with an opaque decode error
#[tokio::test]
async fn test_corrupt_mkv() {
    let mut file = sample_mkv(16);
    // Void id, right after the EBML header (30 bytes) and Segment header (12 bytes)
    file[42] = 0x00;

    let mut source = MemorySource::new(file, 1024);
    let err = extract_from(&mut source, &options(1024)).await.unwrap_err();
    assert_matches!(err, Error::DecodeFailed);
    assert!(source.is_destroyed());
}

/// Test that the byte budget stops extraction before moov is reached
#[tokio::test]
async fn test_budget_exceeded() {
    let mut source = MemorySource::new(sample_mkv(50_000), 1024);
    let opts = ExtractOptions {
        max_bytes: Some(1500),
        chunk_size: 1024,
    };
    let err = extract_from(&mut source, &opts).await.unwrap_err();
    assert_matches!(err, Error::BudgetExceeded { limit: 1500, .. });
    assert_eq!(source.requests().len(), 2);
    assert!(source.is_destroyed());
}

/// Test that a generous budget does not interfere
#[tokio::test]
async fn test_budget_not_reached() {
    let mut source = MemorySource::new(sample_mkv(16), 1024);
    let opts = ExtractOptions {
        max_bytes: Some(1 << 20),
        chunk_size: 1024,
    };
    assert!(extract_from(&mut source, &opts).await.is_ok());
}

/// Test extraction from a file on disk through the public entry point
#[tokio::test]
async fn test_extract_local_file() {
    let mut tmp = tempfile::Builder::new().suffix(".mp4").tempfile().unwrap();
    tmp.write_all(&sample_mp4(200_000)).unwrap();
    let path = tmp.path().to_str().unwrap().to_string();

    let first = extract(&path, &options(4096)).await.unwrap();
    let second = extract(&path, &options(4096)).await.unwrap();
    assert_eq!(first, expected_mp4_tracks());
    assert_eq!(first, second);
}

/// Test that file:// URLs are read from disk
#[cfg(unix)]
#[tokio::test]
async fn test_extract_file_url() {
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(&sample_mkv(16)).unwrap();
    let url = format!("file://{}", tmp.path().display());

    let tracks = extract(&url, &options(4096)).await.unwrap();
    assert_eq!(tracks, expected_mkv_tracks());
}

/// Test that FileSource reads only what the session asks for
#[tokio::test]
async fn test_file_source_bytes_read() {
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(&sample_mp4(1_000_000)).unwrap();

    let mut source = FileSource::open(tmp.path(), 4096).await.unwrap();
    let tracks = extract_from(&mut source, &options(4096)).await.unwrap();
    assert_eq!(tracks.len(), 3);
    assert!(source.bytes_read() < 3 * 4096);
    assert!(source.is_destroyed());
}

/// Test that a missing file is reported as invalid input
#[tokio::test]
async fn test_missing_file() {
    let err = extract("/nonexistent/dir/movie.mkv", &options(4096))
        .await
        .unwrap_err();
    assert_matches!(err, Error::InvalidInput(_));
}

/// Test that unsupported content is rejected after one read
#[tokio::test]
async fn test_unsupported_file() {
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(b"OggS\0\x02\0\0\0\0\0\0\0\0").unwrap();
    let path = tmp.path().to_str().unwrap().to_string();

    let err = extract(&path, &options(4096)).await.unwrap_err();
    assert_matches!(err, Error::UnsupportedFormat);
}
