use serde::{Deserialize, Serialize};

/// Default chunk length: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Bytes requested per read, and per skip without an exact length
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,

    /// Give up once this many bytes were read (unset = no limit)
    #[serde(default)]
    pub max_bytes: Option<u64>,
}

fn default_chunk_size() -> u64 {
    DEFAULT_CHUNK_SIZE
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_bytes: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    10
}

fn default_user_agent() -> String {
    format!("trackprobe/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
        }
    }
}

/// Per-extraction limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Byte budget; the extraction fails once more than this was read.
    pub max_bytes: Option<u64>,
    /// Length of the first read, of sequential reads and of open-ended skips.
    pub chunk_size: u64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_bytes: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl From<&Config> for ExtractOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_bytes: config.source.max_bytes,
            chunk_size: config.source.chunk_size,
        }
    }
}
