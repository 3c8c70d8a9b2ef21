//! Types for the batch orchestrator.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::classifier::ClassificationError;
use crate::executor::{ConversionResult, FailureStage};
use crate::placer::PlacerError;
use crate::planner::PlanningError;
use crate::probe::ProbeError;
use crate::torrent_client::{TAG_CONVERTED, TAG_FAILED, TAG_PARTIAL};

/// Errors that stop a batch before any file is processed.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The job has no file with an allowed extension.
    #[error("job {job_name:?} has no media files")]
    NoMediaFiles { job_name: String },
}

/// Per-file pipeline failure, folded into a failed result.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error(transparent)]
    Planning(#[from] PlanningError),

    #[error(transparent)]
    Placement(#[from] PlacerError),

    #[error("cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Stage the error belongs to.
    pub fn stage(&self) -> FailureStage {
        match self {
            Self::Probe(_) => FailureStage::Probe,
            Self::Classification(_) => FailureStage::Classification,
            Self::Planning(_) => FailureStage::Planning,
            Self::Placement(_) => FailureStage::Placement,
            Self::Cancelled => FailureStage::Conversion,
        }
    }
}

/// Overall outcome of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Every file succeeded.
    Success,
    /// At least one file succeeded and at least one failed.
    Partial,
    /// No file succeeded.
    Failed,
}

impl JobStatus {
    pub fn from_results(results: &[ConversionResult]) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        if succeeded == results.len() && succeeded > 0 {
            JobStatus::Success
        } else if succeeded > 0 {
            JobStatus::Partial
        } else {
            JobStatus::Failed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Success => "success",
            JobStatus::Partial => "partial",
            JobStatus::Failed => "failed",
        }
    }

    /// Download-client tag recording this outcome.
    pub fn tag(&self) -> &'static str {
        match self {
            JobStatus::Success => TAG_CONVERTED,
            JobStatus::Partial => TAG_PARTIAL,
            JobStatus::Failed => TAG_FAILED,
        }
    }
}

/// Aggregate result of one torrent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub job_name: String,
    pub status: JobStatus,
    /// One entry per media file, in file-list order.
    pub results: Vec<ConversionResult>,
    /// Sources removed after a successful conversion.
    pub deleted_sources: Vec<PathBuf>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ConversionResult> {
        self.results.iter().filter(|r| !r.success)
    }
}
