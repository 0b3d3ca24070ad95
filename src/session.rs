//! Incremental decode session.
//!
//! Drives one byte source and one extractor: reads a chunk, hands it to the
//! extractor and follows its answer until the track structure is complete.
//! Exactly one read is in flight at a time.

use trackprobe_container::{Container, DecodeOutcome, Extractor, Track};

use crate::config::{Config, ExtractOptions};
use crate::error::{Error, Result};
use crate::source::{open_source, ByteSource};

/// Extract the tracks of a local file or URL with the default configuration.
pub async fn extract(input: &str, options: &ExtractOptions) -> Result<Vec<Track>> {
    extract_with_config(input, &Config::default(), options).await
}

/// Extract the tracks of a local file or URL.
pub async fn extract_with_config(
    input: &str,
    config: &Config,
    options: &ExtractOptions,
) -> Result<Vec<Track>> {
    let mut source = open_source(input, config, options.chunk_size).await?;
    extract_from(source.as_mut(), options).await
}

/// Extract tracks from an already opened source.
///
/// The source is destroyed when this returns, on success and on error.
pub async fn extract_from(
    source: &mut dyn ByteSource,
    options: &ExtractOptions,
) -> Result<Vec<Track>> {
    let result = run(source, options).await;
    if !source.is_destroyed() {
        source.destroy();
    }

    match &result {
        Ok(tracks) => tracing::debug!(
            tracks = tracks.len(),
            bytes_read = source.bytes_read(),
            "extraction finished"
        ),
        Err(e) => tracing::debug!(
            error = %e,
            bytes_read = source.bytes_read(),
            "extraction failed"
        ),
    }
    result
}

async fn run(source: &mut dyn ByteSource, options: &ExtractOptions) -> Result<Vec<Track>> {
    // The first read must cover every signature, whatever the chunk size.
    let head_len = options.chunk_size.max(Container::detection_len() as u64);
    source.set_next_range(0, Some(head_len));

    let Some(mut chunk) = read_chunk(source, options).await? else {
        return Err(Error::UnsupportedFormat);
    };

    let mut extractor = Extractor::detect(&chunk).map_err(|_| Error::UnsupportedFormat)?;
    tracing::debug!(format = %extractor.container(), "detected container");

    loop {
        let outcome = extractor.decode(&chunk).map_err(|e| {
            tracing::warn!(error = %e, format = %extractor.container(), "decode failed");
            Error::DecodeFailed
        })?;

        match outcome {
            DecodeOutcome::NeedMore => {}
            DecodeOutcome::SkipTo { offset, length } => {
                tracing::debug!(offset, length = ?length, "skipping");
                source.pause();
                source.set_next_range(offset, length);
                source.resume();
            }
            DecodeOutcome::Ready(root) => {
                source.destroy();
                tracing::debug!(
                    offset = root.offset,
                    length = root.bytes.len(),
                    "track structure ready, source released"
                );
                return extractor.format(&root).map_err(|e| {
                    tracing::warn!(error = %e, format = %extractor.container(), "format failed");
                    Error::FormatFailed
                });
            }
        }

        chunk = match read_chunk(source, options).await? {
            Some(chunk) => chunk,
            None => {
                return Err(Error::Truncated {
                    read: source.bytes_read(),
                })
            }
        };
    }
}

/// Read the next chunk and enforce the byte budget.
async fn read_chunk(
    source: &mut dyn ByteSource,
    options: &ExtractOptions,
) -> Result<Option<bytes::Bytes>> {
    let offset = source.offset();
    let Some(chunk) = source.next_chunk().await? else {
        tracing::debug!(offset, "source ended");
        return Ok(None);
    };

    let read = source.bytes_read();
    tracing::trace!(offset, length = chunk.len(), read, "chunk");

    if let Some(limit) = options.max_bytes {
        if read > limit {
            return Err(Error::BudgetExceeded { limit, read });
        }
    }
    Ok(Some(chunk))
}
