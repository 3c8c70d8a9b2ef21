//! Conversion planning.
//!
//! Turns a classification and track selections into a [`ConversionPlan`]:
//! which streams are mapped, which are copied and which are transcoded, and
//! where the output is written. Plans are deterministic so rerunning a job
//! on unchanged input yields byte-identical JSON.

mod error;
mod plan;
mod types;

pub use error::PlanningError;
pub use plan::{job_key, output_targets, plan};
pub use types::{ConversionPlan, PlannedStream, StreamAction, VideoAction};
