//! Mock stream probe for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::probe::{MediaStreamRecord, ProbeError, StreamProbe};

use super::fixtures::sample_streams;

/// Mock implementation of the StreamProbe trait.
///
/// Unknown paths get [`sample_streams`]. Per-path stream lists and
/// failures can be configured, and every probed path is recorded.
#[derive(Debug)]
pub struct MockProbe {
    default_streams: Arc<RwLock<Vec<MediaStreamRecord>>>,
    streams: Arc<RwLock<HashMap<PathBuf, Vec<MediaStreamRecord>>>>,
    failures: Arc<RwLock<HashMap<PathBuf, String>>>,
    probed: Arc<RwLock<Vec<PathBuf>>>,
}

impl Default for MockProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProbe {
    pub fn new() -> Self {
        Self {
            default_streams: Arc::new(RwLock::new(sample_streams())),
            streams: Arc::new(RwLock::new(HashMap::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            probed: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Streams returned for paths without a specific entry.
    pub async fn set_default_streams(&self, streams: Vec<MediaStreamRecord>) {
        *self.default_streams.write().await = streams;
    }

    /// Streams returned for `path`.
    pub async fn set_streams(&self, path: impl AsRef<Path>, streams: Vec<MediaStreamRecord>) {
        self.streams
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), streams);
    }

    /// Make probing `path` fail with a malformed-output error.
    pub async fn fail_for(&self, path: impl AsRef<Path>, reason: impl Into<String>) {
        self.failures
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), reason.into());
    }

    /// Paths probed so far, in call order.
    pub async fn probed_paths(&self) -> Vec<PathBuf> {
        self.probed.read().await.clone()
    }
}

#[async_trait]
impl StreamProbe for MockProbe {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<Vec<MediaStreamRecord>, ProbeError> {
        self.probed.write().await.push(path.to_path_buf());

        if let Some(reason) = self.failures.read().await.get(path) {
            return Err(ProbeError::malformed(reason.clone()));
        }
        if let Some(streams) = self.streams.read().await.get(path) {
            return Ok(streams.clone());
        }
        Ok(self.default_streams.read().await.clone())
    }
}
