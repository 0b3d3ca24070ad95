//! Trackprobe - read track metadata from Matroska and MP4 files
//!
//! Reads only the byte ranges that hold the track descriptions, from a
//! local file or over HTTP range requests. Parsing lives in
//! `trackprobe-container`; this crate adds byte sources, the decode session
//! and configuration.

pub mod config;
pub mod error;
pub mod session;
pub mod source;

pub use error::{Error, Result, SourceError};
pub use session::{extract, extract_from, extract_with_config};
pub use trackprobe_container::{Container, Track, TrackType};
