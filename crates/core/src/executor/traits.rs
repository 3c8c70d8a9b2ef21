//! Executor trait definition.

use async_trait::async_trait;

use crate::planner::ConversionPlan;

use super::cancel::CancelSignal;
use super::types::ConversionResult;

/// Runs the external conversion for a plan.
///
/// Implementations must never panic or return early without a result:
/// every failure mode is folded into the returned [`ConversionResult`].
#[async_trait]
pub trait ConversionExecutor: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self, plan: &ConversionPlan, cancel: CancelSignal) -> ConversionResult;
}
