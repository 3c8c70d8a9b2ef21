//! Mock torrent client for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::torrent_client::{TorrentClient, TorrentClientError, TorrentFile, TorrentInfo};

/// Mock implementation of the TorrentClient trait.
///
/// Holds torrents and their file lists in memory and applies tags to them.
/// A configured error is returned by the next call and then cleared.
///
/// # Example
///
/// ```rust,ignore
/// let client = MockTorrentClient::new();
/// client.add_torrent(info, files).await;
///
/// client.add_tags("abc123", &[TAG_CONVERTED]).await?;
/// assert_eq!(client.tags_of("abc123").await, vec!["playdv-converted"]);
/// ```
#[derive(Debug)]
pub struct MockTorrentClient {
    torrents: Arc<RwLock<HashMap<String, TorrentInfo>>>,
    files: Arc<RwLock<HashMap<String, Vec<TorrentFile>>>>,
    next_error: Arc<RwLock<Option<TorrentClientError>>>,
}

impl Default for MockTorrentClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTorrentClient {
    pub fn new() -> Self {
        Self {
            torrents: Arc::new(RwLock::new(HashMap::new())),
            files: Arc::new(RwLock::new(HashMap::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Register a torrent with its files.
    pub async fn add_torrent(&self, info: TorrentInfo, files: Vec<TorrentFile>) {
        let hash = info.hash.to_lowercase();
        self.files.write().await.insert(hash.clone(), files);
        self.torrents.write().await.insert(hash, info);
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: TorrentClientError) {
        *self.next_error.write().await = Some(error);
    }

    /// Current tags of a torrent, empty when unknown.
    pub async fn tags_of(&self, hash: &str) -> Vec<String> {
        self.torrents
            .read()
            .await
            .get(&hash.to_lowercase())
            .map(|t| t.tags.clone())
            .unwrap_or_default()
    }

    async fn take_error(&self) -> Result<(), TorrentClientError> {
        match self.next_error.write().await.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TorrentClient for MockTorrentClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get_torrent(&self, hash: &str) -> Result<TorrentInfo, TorrentClientError> {
        self.take_error().await?;
        self.torrents
            .read()
            .await
            .get(&hash.to_lowercase())
            .cloned()
            .ok_or_else(|| TorrentClientError::TorrentNotFound(hash.to_string()))
    }

    async fn list_files(&self, hash: &str) -> Result<Vec<TorrentFile>, TorrentClientError> {
        self.take_error().await?;
        self.files
            .read()
            .await
            .get(&hash.to_lowercase())
            .cloned()
            .ok_or_else(|| TorrentClientError::TorrentNotFound(hash.to_string()))
    }

    async fn add_tags(&self, hash: &str, tags: &[&str]) -> Result<(), TorrentClientError> {
        self.take_error().await?;
        let mut torrents = self.torrents.write().await;
        let torrent = torrents
            .get_mut(&hash.to_lowercase())
            .ok_or_else(|| TorrentClientError::TorrentNotFound(hash.to_string()))?;
        for tag in tags {
            if !torrent.tags.iter().any(|t| t == tag) {
                torrent.tags.push(tag.to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::torrent_client::{TAG_CONVERTED, TAG_FAILED};
    use std::path::PathBuf;

    fn info(hash: &str) -> TorrentInfo {
        TorrentInfo {
            hash: hash.to_string(),
            name: "Show.S01.2160p.DV".to_string(),
            category: Some("tv".to_string()),
            save_path: Some(PathBuf::from("/downloads")),
            content_path: Some(PathBuf::from("/downloads/Show.S01.2160p.DV")),
            size_bytes: 10,
            progress: 1.0,
            tags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_tags_are_deduplicated() {
        let client = MockTorrentClient::new();
        client.add_torrent(info("abc"), Vec::new()).await;

        client.add_tags("ABC", &[TAG_CONVERTED]).await.unwrap();
        client.add_tags("abc", &[TAG_CONVERTED, TAG_FAILED]).await.unwrap();
        assert_eq!(client.tags_of("abc").await, vec![TAG_CONVERTED, TAG_FAILED]);
    }

    #[tokio::test]
    async fn test_next_error_applies_once() {
        let client = MockTorrentClient::new();
        client.add_torrent(info("abc"), Vec::new()).await;
        client.set_next_error(TorrentClientError::Timeout).await;

        assert!(matches!(
            client.get_torrent("abc").await,
            Err(TorrentClientError::Timeout)
        ));
        assert!(client.get_torrent("abc").await.is_ok());
        assert!(matches!(
            client.list_files("zzz").await,
            Err(TorrentClientError::TorrentNotFound(_))
        ));
    }
}
