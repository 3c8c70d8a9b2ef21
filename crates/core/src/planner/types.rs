//! Types for the planner module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::classifier::{TrackRole, TrackSelection};
use crate::config::ContainerFormat;

/// What happens to the video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoAction {
    Copy,
    Transcode,
}

/// What happens to an audio or subtitle stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum StreamAction {
    Copy,
    Transcode {
        /// Encoder name passed to ffmpeg.
        codec: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bitrate_kbps: Option<u32>,
    },
}

/// A selected track together with its action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedStream {
    pub selection: TrackSelection,
    pub action: StreamAction,
}

impl PlannedStream {
    pub fn is_default(&self) -> bool {
        self.selection.role == TrackRole::Primary
    }

    pub fn is_forced(&self) -> bool {
        self.selection.role == TrackRole::Forced
    }
}

/// Full description of one remux.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionPlan {
    pub input_path: PathBuf,
    /// Final destination of the converted file.
    pub output_path: PathBuf,
    /// Where ffmpeg writes before the output is moved into place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_path: Option<PathBuf>,
    pub video_stream_index: u32,
    /// Lowercased codec of the copied video stream.
    pub video_codec: String,
    pub video_action: VideoAction,
    pub selected_audio: Vec<PlannedStream>,
    pub selected_subtitles: Vec<PlannedStream>,
    pub container: ContainerFormat,
    pub dolby_vision: bool,
}

impl ConversionPlan {
    /// Path ffmpeg writes to.
    pub fn write_path(&self) -> &PathBuf {
        self.staging_path.as_ref().unwrap_or(&self.output_path)
    }
}
