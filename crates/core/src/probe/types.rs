//! Types for probed media streams.

use serde::{Deserialize, Serialize};

/// Language code used when a stream carries no language tag.
pub const UNDETERMINED_LANGUAGE: &str = "und";

/// Kind of a media stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
}

impl StreamKind {
    /// Parses an ffprobe `codec_type`. Other kinds (data, attachment) are
    /// not modelled.
    pub fn from_codec_type(codec_type: &str) -> Option<Self> {
        match codec_type {
            "video" => Some(StreamKind::Video),
            "audio" => Some(StreamKind::Audio),
            "subtitle" => Some(StreamKind::Subtitle),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Video => "video",
            StreamKind::Audio => "audio",
            StreamKind::Subtitle => "subtitle",
        }
    }
}

/// One entry of a stream's side data list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideData {
    pub side_data_type: String,
    /// Dolby Vision profile, present on DOVI configuration records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dv_profile: Option<u8>,
}

impl SideData {
    pub fn new(side_data_type: impl Into<String>) -> Self {
        Self {
            side_data_type: side_data_type.into(),
            dv_profile: None,
        }
    }
}

/// A single probed stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaStreamRecord {
    /// Stream index within the container (unique per probe).
    pub index: u32,
    pub kind: StreamKind,
    pub codec: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_transfer: Option<String>,
    #[serde(default)]
    pub side_data: Vec<SideData>,
    /// ISO 639-2 language tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// `disposition.forced`
    #[serde(default)]
    pub forced: bool,
    /// `disposition.hearing_impaired`
    #[serde(default)]
    pub hearing_impaired: bool,
}

impl MediaStreamRecord {
    /// Creates a record with only the required fields set.
    pub fn new(index: u32, kind: StreamKind, codec: impl Into<String>) -> Self {
        Self {
            index,
            kind,
            codec: codec.into(),
            color_transfer: None,
            side_data: Vec::new(),
            language: None,
            title: None,
            width: None,
            height: None,
            forced: false,
            hearing_impaired: false,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_color_transfer(mut self, transfer: impl Into<String>) -> Self {
        self.color_transfer = Some(transfer.into());
        self
    }

    pub fn with_side_data(mut self, side_data: SideData) -> Self {
        self.side_data.push(side_data);
        self
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_forced(mut self, forced: bool) -> Self {
        self.forced = forced;
        self
    }

    /// Lowercased language tag, `und` when missing or empty.
    pub fn language_code(&self) -> String {
        match self.language.as_deref().map(str::trim) {
            Some(lang) if !lang.is_empty() => lang.to_lowercase(),
            _ => UNDETERMINED_LANGUAGE.to_string(),
        }
    }

    /// Case-insensitive substring match on the title.
    pub fn title_contains(&self, needle: &str) -> bool {
        self.title
            .as_deref()
            .map(|t| t.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false)
    }
}
