//! Error types for the planner module.

use thiserror::Error;

/// Errors raised while building a conversion plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanningError {
    /// The file violates a configured policy and will not be converted.
    #[error("Plan rejected: {reason}")]
    Rejected { reason: String },
}

impl PlanningError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}
