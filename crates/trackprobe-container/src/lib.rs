//! # trackprobe-container
//!
//! Incremental track metadata parsing for Matroska/WebM and MP4 files.
//!
//! The crate does no I/O. A caller feeds chunks of a file into an
//! [`Extractor`], which tells it after every chunk whether to keep reading
//! sequentially, to jump to another offset, or that the structure holding
//! the track descriptions is complete. Media payload is never buffered.
//!
//! ## Features
//!
//! - Container detection from the first chunk (EBML header, `ftyp` box)
//! - EBML element walker with unknown-size support
//! - ISO-BMFF box walker with 64-bit and open-ended boxes
//! - `serde` feature: `Serialize` for [`Track`] and [`TrackType`]
//!
//! ## Example
//!
//! ```no_run
//! use trackprobe_container::{DecodeOutcome, Extractor};
//!
//! let data = std::fs::read("movie.mkv").unwrap();
//! let mut extractor = Extractor::detect(&data).unwrap();
//!
//! if let DecodeOutcome::Ready(root) = extractor.decode(&data).unwrap() {
//!     for track in extractor.format(&root).unwrap() {
//!         println!("{:?} {:?} {:?}", track.id, track.track_type, track.codec);
//!     }
//! }
//! ```

pub mod codec;
pub mod container;
pub mod ebml;
pub mod error;
pub mod isobmff;
pub mod types;

#[cfg(test)]
mod test_fixtures;

pub use container::{Container, DecodeOutcome, Extractor, RootStructure};
pub use error::{ContainerError, Result};
pub use types::{Track, TrackType};
