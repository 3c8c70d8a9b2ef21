//! Types produced by the classifier.

use serde::{Deserialize, Serialize};

use crate::probe::MediaStreamRecord;

/// Dynamic-range classification of the single video stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoClassification {
    /// PQ or HLG transfer without a Dolby Vision configuration record.
    pub is_hdr: bool,
    pub is_dolby_vision: bool,
    pub source_stream_index: u32,
    /// Profile from the DOVI configuration record, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dv_profile: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Video codec as reported by the probe.
    pub codec: String,
}

/// Role of a selected audio or subtitle track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackRole {
    /// Default track of its kind.
    Primary,
    Alternate,
    /// Forced-narrative subtitle.
    Forced,
    /// Subtitles for the deaf and hard of hearing.
    Sdh,
}

impl TrackRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackRole::Primary => "primary",
            TrackRole::Alternate => "alternate",
            TrackRole::Forced => "forced",
            TrackRole::Sdh => "sdh",
        }
    }
}

/// A stream picked for the output, with its role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSelection {
    pub stream_index: u32,
    /// Lowercased ISO 639-2 code, `und` when the stream has none.
    pub language: String,
    pub role: TrackRole,
    pub codec: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl TrackSelection {
    pub(crate) fn from_stream(stream: &MediaStreamRecord, role: TrackRole) -> Self {
        Self {
            stream_index: stream.index,
            language: stream.language_code(),
            role,
            codec: stream.codec.clone(),
            title: stream.title.clone(),
        }
    }
}
