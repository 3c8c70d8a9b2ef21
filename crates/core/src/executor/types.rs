//! Types for the executor module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::planner::ConversionPlan;

/// Error detail recorded for a cancelled conversion.
pub const CANCELLED_DETAIL: &str = "cancelled";

/// Pipeline stage at which a file failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Probe,
    Classification,
    Planning,
    Conversion,
    Placement,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::Probe => "probe",
            FailureStage::Classification => "classification",
            FailureStage::Planning => "planning",
            FailureStage::Conversion => "conversion",
            FailureStage::Placement => "placement",
        }
    }
}

/// Outcome of one file's pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub source_path: PathBuf,
    /// Absent when the file failed before a plan was built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<ConversionPlan>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub duration_secs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<FailureStage>,
}

impl ConversionResult {
    /// A successful conversion.
    pub fn succeeded(plan: &ConversionPlan, exit_code: Option<i32>, duration_secs: f64) -> Self {
        Self {
            source_path: plan.input_path.clone(),
            plan: Some(plan.clone()),
            success: true,
            exit_code,
            duration_secs,
            error_detail: None,
            failed_stage: None,
        }
    }

    /// A failed conversion of an existing plan.
    pub fn conversion_failed(
        plan: &ConversionPlan,
        exit_code: Option<i32>,
        duration_secs: f64,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            source_path: plan.input_path.clone(),
            plan: Some(plan.clone()),
            success: false,
            exit_code,
            duration_secs,
            error_detail: Some(detail.into()),
            failed_stage: Some(FailureStage::Conversion),
        }
    }

    /// A failure at an arbitrary stage.
    pub fn failure(source: &Path, stage: FailureStage, detail: impl Into<String>) -> Self {
        Self {
            source_path: source.to_path_buf(),
            plan: None,
            success: false,
            exit_code: None,
            duration_secs: 0.0,
            error_detail: Some(detail.into()),
            failed_stage: Some(stage),
        }
    }

    pub fn with_plan(mut self, plan: ConversionPlan) -> Self {
        self.plan = Some(plan);
        self
    }

    pub fn with_duration(mut self, duration_secs: f64) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.error_detail.as_deref() == Some(CANCELLED_DETAIL)
    }
}
