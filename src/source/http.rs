use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use regex::Regex;
use reqwest::header::{CONTENT_RANGE, RANGE};
use reqwest::{redirect, Client, StatusCode, Url};

use super::{ByteSource, ReadState};
use crate::config::HttpConfig;
use crate::error::SourceError;

/// Parsed `Content-Range: bytes start-end/total` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    pub start: u64,
    pub end: u64,
    /// `None` when the server sent `*`.
    pub total: Option<u64>,
}

fn content_range_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^bytes\s+(\d+)-(\d+)/(\d+|\*)$").expect("Content-Range pattern is valid")
    })
}

impl ContentRange {
    pub fn parse(header: &str) -> Result<Self, SourceError> {
        let malformed = || SourceError::MalformedContentRange(header.to_string());
        let caps = content_range_regex()
            .captures(header.trim())
            .ok_or_else(malformed)?;

        let number = |i: usize| -> Result<u64, SourceError> {
            caps[i].parse().map_err(|_| malformed())
        };
        let start = number(1)?;
        let end = number(2)?;
        let total = match &caps[3] {
            "*" => None,
            _ => Some(number(3)?),
        };

        if end < start || total.is_some_and(|t| end >= t) {
            return Err(malformed());
        }
        Ok(Self { start, end, total })
    }
}

/// Remote resource read with HTTP range requests.
///
/// Every request goes to the original URL, so redirects are resolved again
/// on each read.
#[derive(Debug)]
pub struct HttpSource {
    client: Option<Client>,
    url: Url,
    total: Option<u64>,
    state: ReadState,
}

impl HttpSource {
    pub fn new(url: Url, config: &HttpConfig, chunk_size: u64) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .redirect(redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self {
            client: Some(client),
            url,
            total: None,
            state: ReadState::new(chunk_size),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl ByteSource for HttpSource {
    fn offset(&self) -> u64 {
        self.state.offset()
    }

    fn chunk_size(&self) -> u64 {
        self.state.chunk_size()
    }

    fn bytes_read(&self) -> u64 {
        self.state.bytes_read()
    }

    fn total_size(&self) -> Option<u64> {
        self.total
    }

    fn pause(&mut self) {
        self.state.set_paused(true);
    }

    fn resume(&mut self) {
        self.state.set_paused(false);
    }

    fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    fn set_next_range(&mut self, offset: u64, length: Option<u64>) {
        self.state.set_next_range(offset, length);
    }

    async fn next_chunk(&mut self) -> Result<Option<Bytes>, SourceError> {
        self.state.check_readable()?;
        let Some((start, length)) = self.state.next_range(self.total) else {
            return Ok(None);
        };
        let client = self.client.as_ref().ok_or(SourceError::Destroyed)?;
        let end = start + length - 1;

        let response = client
            .get(self.url.clone())
            .header(RANGE, format!("bytes={start}-{end}"))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::RANGE_NOT_SATISFIABLE {
            tracing::debug!(url = %self.url, start, "range starts past the end of the resource");
            return Ok(None);
        }
        if status != StatusCode::PARTIAL_CONTENT && status != StatusCode::OK {
            return Err(SourceError::Status(status.as_u16()));
        }

        let header = response
            .headers()
            .get(CONTENT_RANGE)
            .ok_or(SourceError::MissingContentRange)?
            .to_str()
            .map_err(|_| SourceError::MalformedContentRange("<non-ascii>".to_string()))?;
        let range = ContentRange::parse(header)?;
        if range.start != start {
            return Err(SourceError::MalformedContentRange(header.to_string()));
        }
        if range.total.is_some() {
            self.total = range.total;
        }

        let mut body = response.bytes().await?;
        body.truncate(length as usize);
        if body.is_empty() {
            return Ok(None);
        }

        tracing::trace!(
            url = %self.url,
            start,
            length = body.len(),
            total = ?self.total,
            "received range"
        );
        self.state.advance(body.len() as u64);
        Ok(Some(body))
    }

    fn destroy(&mut self) {
        self.client = None;
        self.state.destroy();
    }

    fn is_destroyed(&self) -> bool {
        self.state.is_destroyed()
    }
}
