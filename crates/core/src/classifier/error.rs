//! Error types for the classifier module.

use thiserror::Error;

/// Errors that prevent a file from being classified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationError {
    /// The file has no video stream.
    #[error("No video stream found")]
    NoVideo,

    /// The file has more than one video stream and none can be chosen.
    #[error("Ambiguous video: {count} video streams found")]
    AmbiguousVideo { count: usize },
}
