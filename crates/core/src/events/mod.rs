//! Structured pipeline events.
//!
//! Pipelines emit [`PipelineEvent`]s through a cloneable [`EventHandle`].
//! A single [`EventWriter`] task drains the channel and fans each record out
//! to the configured [`EventSink`]s, so sink output is never interleaved.
//!
//! ```ignore
//! let sink = Arc::new(JsonLinesSink::new(&config.paths.log_dir)?);
//! let (handle, writer) = create_event_system(vec![sink], 256);
//! let writer_task = tokio::spawn(writer.run());
//!
//! handle.emit(PipelineEvent::SourceDeleted { file: path }).await;
//!
//! drop(handle);
//! writer_task.await?;
//! ```

mod handle;
mod retention;
mod sinks;
mod types;
mod writer;

pub use handle::EventHandle;
pub use retention::{prune_old_logs, prune_old_logs_at};
pub use sinks::{EventSink, JsonLinesSink, MemorySink, TracingSink};
pub use types::{EventLevel, EventRecord, PipelineEvent};
pub use writer::{create_event_system, EventWriter};
