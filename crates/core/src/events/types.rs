use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity of a pipeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Pipeline event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    // Job lifecycle
    JobStarted {
        job_name: String,
        category: String,
        file_count: usize,
    },
    JobFiltered {
        job_name: String,
        reason: String,
    },
    JobFinished {
        job_name: String,
        status: String,
        succeeded: usize,
        failed: usize,
    },

    // Per-file pipeline
    FileProbed {
        file: PathBuf,
        stream_count: usize,
    },
    FileClassified {
        file: PathBuf,
        dolby_vision: bool,
        hdr: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dv_profile: Option<u8>,
    },
    FilePlanned {
        file: PathBuf,
        output: PathBuf,
        audio_tracks: usize,
        subtitle_tracks: usize,
    },
    FileConverted {
        file: PathBuf,
        output: PathBuf,
        duration_secs: f64,
    },
    FileFailed {
        file: PathBuf,
        stage: String,
        detail: String,
    },
    SourceDeleted {
        file: PathBuf,
    },

    // Download client
    TorrentTagged {
        hash: String,
        tag: String,
    },
}

impl PipelineEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::JobStarted { .. } => "job_started",
            Self::JobFiltered { .. } => "job_filtered",
            Self::JobFinished { .. } => "job_finished",
            Self::FileProbed { .. } => "file_probed",
            Self::FileClassified { .. } => "file_classified",
            Self::FilePlanned { .. } => "file_planned",
            Self::FileConverted { .. } => "file_converted",
            Self::FileFailed { .. } => "file_failed",
            Self::SourceDeleted { .. } => "source_deleted",
            Self::TorrentTagged { .. } => "torrent_tagged",
        }
    }

    /// Default severity for this event.
    pub fn level(&self) -> EventLevel {
        match self {
            Self::FileProbed { .. } | Self::FilePlanned { .. } => EventLevel::Debug,
            Self::FileFailed { .. } => EventLevel::Warn,
            Self::JobFinished { status, .. } if status == "failed" => EventLevel::Error,
            Self::JobFinished { status, .. } if status == "partial" => EventLevel::Warn,
            _ => EventLevel::Info,
        }
    }
}

/// An event with its emission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub timestamp: DateTime<Utc>,
    pub level: EventLevel,
    #[serde(flatten)]
    pub event: PipelineEvent,
}

impl EventRecord {
    pub fn now(event: PipelineEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            level: event.level(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_flat() {
        let record = EventRecord::now(PipelineEvent::SourceDeleted {
            file: PathBuf::from("/dl/a.mkv"),
        });
        let json: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "source_deleted");
        assert_eq!(json["level"], "info");
        assert_eq!(json["file"], "/dl/a.mkv");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_record_round_trips() {
        let record = EventRecord::now(PipelineEvent::FileFailed {
            file: PathBuf::from("/dl/b.mkv"),
            stage: "probe".to_string(),
            detail: "Malformed probe output".to_string(),
        });
        let line = serde_json::to_string(&record).unwrap();
        let parsed: EventRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, record);
        assert_eq!(parsed.level, EventLevel::Warn);
    }

    #[test]
    fn test_levels() {
        let finished = |status: &str| PipelineEvent::JobFinished {
            job_name: "job".to_string(),
            status: status.to_string(),
            succeeded: 0,
            failed: 0,
        };
        assert_eq!(finished("success").level(), EventLevel::Info);
        assert_eq!(finished("partial").level(), EventLevel::Warn);
        assert_eq!(finished("failed").level(), EventLevel::Error);
        assert_eq!(
            PipelineEvent::FileProbed {
                file: PathBuf::from("a"),
                stream_count: 3
            }
            .level(),
            EventLevel::Debug
        );
    }
}
