//! Conversion execution.
//!
//! Runs ffmpeg for a [`ConversionPlan`](crate::planner::ConversionPlan) and
//! reports the outcome as a [`ConversionResult`]. Execution never returns an
//! error: spawn failures, non-zero exits, timeouts and cancellation all end
//! up in a failed result with a diagnostic.
//!
//! # Example
//!
//! ```ignore
//! use playdv_core::executor::{CancelHandle, ConversionExecutor, FfmpegExecutor};
//!
//! let executor = FfmpegExecutor::from_config(&config.processing);
//! let cancel = CancelHandle::new();
//! let result = executor.execute(&plan, cancel.signal()).await;
//! if !result.success {
//!     eprintln!("{}", result.error_detail.unwrap_or_default());
//! }
//! ```

mod cancel;
mod ffmpeg;
mod traits;
mod types;

pub use cancel::{CancelHandle, CancelSignal};
pub use ffmpeg::{build_args, FfmpegExecutor};
pub use traits::ConversionExecutor;
pub use types::{ConversionResult, FailureStage, CANCELLED_DETAIL};
