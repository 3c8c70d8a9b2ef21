//! Mock conversion executor for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::executor::{CancelSignal, ConversionExecutor, ConversionResult, CANCELLED_DETAIL};
use crate::planner::ConversionPlan;

/// Mock implementation of the ConversionExecutor trait.
///
/// A successful run writes a small file to the plan's write path, so
/// placement and deletion behave as they would after a real conversion.
/// Configured paths fail with a given exit code and detail.
#[derive(Debug)]
pub struct MockExecutor {
    executed: Arc<RwLock<Vec<ConversionPlan>>>,
    failures: Arc<RwLock<HashMap<PathBuf, (i32, String)>>>,
    delay_ms: Arc<RwLock<u64>>,
    running: AtomicUsize,
    max_running: AtomicUsize,
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            executed: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            delay_ms: Arc::new(RwLock::new(0)),
            running: AtomicUsize::new(0),
            max_running: AtomicUsize::new(0),
        }
    }

    /// Make the conversion of `input` fail.
    pub async fn fail_for(
        &self,
        input: impl AsRef<Path>,
        exit_code: i32,
        detail: impl Into<String>,
    ) {
        self.failures
            .write()
            .await
            .insert(input.as_ref().to_path_buf(), (exit_code, detail.into()));
    }

    /// Simulated conversion time.
    pub async fn set_delay_ms(&self, delay_ms: u64) {
        *self.delay_ms.write().await = delay_ms;
    }

    /// Plans executed so far, in call order.
    pub async fn executed_plans(&self) -> Vec<ConversionPlan> {
        self.executed.read().await.clone()
    }

    /// Highest number of conversions that ran at the same time.
    pub fn max_concurrent(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    async fn convert(&self, plan: &ConversionPlan, mut cancel: CancelSignal) -> ConversionResult {
        let delay = *self.delay_ms.read().await;
        if delay > 0 {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(delay)) => {}
                _ = cancel.cancelled() => {
                    return ConversionResult::conversion_failed(plan, None, 0.0, CANCELLED_DETAIL);
                }
            }
        }

        if let Some((code, detail)) = self.failures.read().await.get(&plan.input_path) {
            return ConversionResult::conversion_failed(plan, Some(*code), 0.0, detail.clone());
        }

        let output = plan.write_path();
        if let Some(parent) = output.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return ConversionResult::conversion_failed(plan, None, 0.0, e.to_string());
            }
        }
        if let Err(e) = tokio::fs::write(output, b"mp4").await {
            return ConversionResult::conversion_failed(plan, None, 0.0, e.to_string());
        }

        ConversionResult::succeeded(plan, Some(0), delay as f64 / 1000.0)
    }
}

#[async_trait]
impl ConversionExecutor for MockExecutor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn execute(&self, plan: &ConversionPlan, cancel: CancelSignal) -> ConversionResult {
        self.executed.write().await.push(plan.clone());

        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);

        let result = self.convert(plan, cancel).await;

        self.running.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
