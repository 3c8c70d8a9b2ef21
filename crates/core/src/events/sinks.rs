//! Event sinks.

use chrono::NaiveDate;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{EventLevel, EventRecord, PipelineEvent};

/// Destination for pipeline events.
///
/// Sinks are only ever called from the writer task, one record at a time.
pub trait EventSink: Send + Sync {
    fn record(&self, record: &EventRecord);

    fn flush(&self) {}
}

/// Re-emits events as `tracing` events.
#[derive(Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, record: &EventRecord) {
        let event_type = record.event.event_type();
        let data = serde_json::to_string(&record.event).unwrap_or_default();
        match record.level {
            EventLevel::Debug => tracing::debug!(event = event_type, %data, "pipeline event"),
            EventLevel::Info => tracing::info!(event = event_type, %data, "pipeline event"),
            EventLevel::Warn => tracing::warn!(event = event_type, %data, "pipeline event"),
            EventLevel::Error => tracing::error!(event = event_type, %data, "pipeline event"),
        }
    }
}

/// Appends one JSON object per line to a daily file in `log_dir`.
#[derive(Debug)]
pub struct JsonLinesSink {
    log_dir: PathBuf,
}

impl JsonLinesSink {
    /// Creates the sink, creating `log_dir` if needed.
    pub fn new(log_dir: &Path) -> std::io::Result<Self> {
        fs::create_dir_all(log_dir)?;
        Ok(Self {
            log_dir: log_dir.to_path_buf(),
        })
    }

    /// Log file for a given day.
    pub fn file_for(&self, date: NaiveDate) -> PathBuf {
        self.log_dir
            .join(format!("playdv-{}.jsonl", date.format("%Y-%m-%d")))
    }

    fn append(&self, record: &EventRecord) -> std::io::Result<()> {
        let path = self.file_for(record.timestamp.date_naive());
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(&line)
    }
}

impl EventSink for JsonLinesSink {
    fn record(&self, record: &EventRecord) {
        if let Err(e) = self.append(record) {
            tracing::error!(log_dir = %self.log_dir.display(), "Failed to write event log: {}", e);
        }
    }
}

/// Keeps records in memory. Used by tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<EventRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.records().into_iter().map(|r| r.event).collect()
    }
}

impl EventSink for MemorySink {
    fn record(&self, record: &EventRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_json_lines_sink_appends() {
        let dir = TempDir::new().unwrap();
        let log_dir = dir.path().join("logs");
        let sink = JsonLinesSink::new(&log_dir).unwrap();

        let first = EventRecord::now(PipelineEvent::SourceDeleted {
            file: PathBuf::from("/dl/a.mkv"),
        });
        let second = EventRecord::now(PipelineEvent::TorrentTagged {
            hash: "abc".to_string(),
            tag: "playdv-converted".to_string(),
        });
        sink.record(&first);
        sink.record(&second);

        let path = sink.file_for(first.timestamp.date_naive());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("playdv-"));
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: EventRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.event, first.event);
        let value: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(value["type"], "torrent_tagged");
    }

    #[test]
    fn test_file_for_date() {
        let dir = TempDir::new().unwrap();
        let sink = JsonLinesSink::new(dir.path()).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(sink.file_for(date), dir.path().join("playdv-2024-03-09.jsonl"));
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::new();
        sink.record(&EventRecord::now(PipelineEvent::SourceDeleted {
            file: PathBuf::from("a"),
        }));
        assert_eq!(sink.records().len(), 1);
    }

    #[test]
    fn test_tracing_sink_does_not_panic() {
        let sink = TracingSink;
        for level in [
            EventLevel::Debug,
            EventLevel::Info,
            EventLevel::Warn,
            EventLevel::Error,
        ] {
            let mut record = EventRecord::now(PipelineEvent::SourceDeleted {
                file: PathBuf::from("a"),
            });
            record.level = level;
            sink.record(&record);
        }
    }
}
