//! Normalized track metadata shared by both container formats.

use std::fmt;

/// Kind of media a track carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TrackType {
    Video,
    Audio,
    Text,
}

impl fmt::Display for TrackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackType::Video => write!(f, "video"),
            TrackType::Audio => write!(f, "audio"),
            TrackType::Text => write!(f, "text"),
        }
    }
}

/// Track metadata read from a container.
///
/// Every field is optional: containers omit fields freely and values that
/// only mean "unset" (`und`, empty names, placeholder handler names) are
/// reported as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Track {
    /// Container-assigned track number.
    pub id: Option<u64>,
    /// Media kind, `None` when the container value is not recognized.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub track_type: Option<TrackType>,
    /// Language code (ISO 639-2 or BCP 47).
    pub lang: Option<String>,
    /// Human-readable track name.
    pub label: Option<String>,
    /// Codec identifier with format-specific prefixes removed.
    pub codec: Option<String>,
}

/// Keep a string only if it is non-empty.
pub(crate) fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_type_display() {
        assert_eq!(TrackType::Video.to_string(), "video");
        assert_eq!(TrackType::Audio.to_string(), "audio");
        assert_eq!(TrackType::Text.to_string(), "text");
    }

    #[test]
    fn test_default_track_is_empty() {
        let track = Track::default();
        assert!(track.id.is_none());
        assert!(track.track_type.is_none());
        assert!(track.lang.is_none());
        assert!(track.label.is_none());
        assert!(track.codec.is_none());
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(String::new()), None);
        assert_eq!(non_empty("x".to_string()), Some("x".to_string()));
    }
}
