use std::sync::Arc;

use tokio::sync::mpsc;

use super::{EventHandle, EventRecord, EventSink};

/// Background task that receives pipeline events and hands them to sinks
pub struct EventWriter {
    rx: mpsc::Receiver<EventRecord>,
    sinks: Vec<Arc<dyn EventSink>>,
}

impl EventWriter {
    pub fn new(rx: mpsc::Receiver<EventRecord>, sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { rx, sinks }
    }

    /// Run the writer, consuming events until every handle is dropped.
    pub async fn run(mut self) {
        tracing::debug!(sinks = self.sinks.len(), "Event writer started");

        while let Some(record) = self.rx.recv().await {
            for sink in &self.sinks {
                sink.record(&record);
            }
        }

        for sink in &self.sinks {
            sink.flush();
        }
        tracing::debug!("Event writer shutting down");
    }
}

/// Create a handle/writer pair.
///
/// Spawn the writer with `tokio::spawn(writer.run())` and clone the handle
/// into every task that emits events.
pub fn create_event_system(
    sinks: Vec<Arc<dyn EventSink>>,
    buffer_size: usize,
) -> (EventHandle, EventWriter) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (EventHandle::new(tx), EventWriter::new(rx, sinks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{MemorySink, PipelineEvent};
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_writer_fans_out_in_order() {
        let first = Arc::new(MemorySink::new());
        let second = Arc::new(MemorySink::new());
        let sinks: Vec<Arc<dyn EventSink>> = vec![first.clone(), second.clone()];
        let (handle, writer) = create_event_system(sinks, 16);
        let task = tokio::spawn(writer.run());

        for i in 0..5 {
            handle
                .emit(PipelineEvent::SourceDeleted {
                    file: PathBuf::from(format!("{}.mkv", i)),
                })
                .await;
        }
        drop(handle);
        task.await.unwrap();

        assert_eq!(first.events().len(), 5);
        assert_eq!(first.events(), second.events());
        assert_eq!(
            first.events()[4],
            PipelineEvent::SourceDeleted {
                file: PathBuf::from("4.mkv")
            }
        );
    }
}
