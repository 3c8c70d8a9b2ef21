//! Types for torrent client operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Tag applied when every file converted.
pub const TAG_CONVERTED: &str = "playdv-converted";
/// Tag applied when some files converted.
pub const TAG_PARTIAL: &str = "playdv-partial";
/// Tag applied when no file converted.
pub const TAG_FAILED: &str = "playdv-failed";

/// Errors that can occur during torrent client operations.
#[derive(Debug, Error)]
pub enum TorrentClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Torrent not found: {0}")]
    TorrentNotFound(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Information about a torrent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentInfo {
    /// Info hash (lowercase hex).
    pub hash: String,
    pub name: String,
    /// Category/label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Directory files are stored under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_path: Option<PathBuf>,
    /// Root file or directory of the torrent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_path: Option<PathBuf>,
    /// Total size of the selected files in bytes.
    pub size_bytes: u64,
    /// Download progress (0.0 - 1.0).
    pub progress: f64,
    pub tags: Vec<String>,
}

/// One file of a torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentFile {
    /// Path relative to the torrent's save path.
    pub name: String,
    pub size_bytes: u64,
}

impl TorrentFile {
    pub fn absolute_path(&self, save_path: &Path) -> PathBuf {
        save_path.join(&self.name)
    }
}

/// Download-client operations used around a batch.
#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// Backend name, for logging.
    fn name(&self) -> &str;

    async fn get_torrent(&self, hash: &str) -> Result<TorrentInfo, TorrentClientError>;

    async fn list_files(&self, hash: &str) -> Result<Vec<TorrentFile>, TorrentClientError>;

    async fn add_tags(&self, hash: &str, tags: &[&str]) -> Result<(), TorrentClientError>;
}
