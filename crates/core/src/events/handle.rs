use tokio::sync::mpsc;

use super::{EventRecord, PipelineEvent};

/// Handle for emitting pipeline events
///
/// This is cheaply cloneable and can be shared across tasks.
/// Events are sent through an async channel to be written by the EventWriter.
#[derive(Clone)]
pub struct EventHandle {
    tx: mpsc::Sender<EventRecord>,
}

impl EventHandle {
    pub fn new(tx: mpsc::Sender<EventRecord>) -> Self {
        Self { tx }
    }

    /// Emit an event. A closed channel is logged, never surfaced.
    pub async fn emit(&self, event: PipelineEvent) {
        if let Err(e) = self.tx.send(EventRecord::now(event)).await {
            tracing::error!("Failed to emit pipeline event: {}", e);
        }
    }
}
