//! Batch orchestration.
//!
//! Runs one probe → classify → select → plan → execute → place pipeline per
//! media file of a torrent, with at most `processing.parallel_episodes`
//! pipelines in flight. A failing file never stops the others; every file
//! gets a [`ConversionResult`](crate::executor::ConversionResult) and the
//! batch is summarised in a [`BatchReport`].

mod runner;
mod types;

pub use runner::BatchOrchestrator;
pub use types::{BatchReport, JobStatus, OrchestratorError, PipelineError};
