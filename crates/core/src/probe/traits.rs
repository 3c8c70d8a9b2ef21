//! Trait definitions for the probe module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ProbeError;
use super::types::MediaStreamRecord;

/// Something that can list the streams of a media file.
#[async_trait]
pub trait StreamProbe: Send + Sync {
    /// Returns the name of this probe implementation.
    fn name(&self) -> &str;

    /// Probes a media file and returns its streams ordered by index.
    async fn probe(&self, path: &Path) -> Result<Vec<MediaStreamRecord>, ProbeError>;
}
