//! Finished-download description.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::FilterConfig;

/// A finished torrent as reported by the download client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentJob {
    pub name: String,
    pub category: String,
    /// Root of the download: a single file or a directory.
    pub content_path: PathBuf,
    pub size_bytes: u64,
    /// Absolute paths of every file in the torrent.
    pub file_list: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl TorrentJob {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        content_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            content_path: content_path.into(),
            size_bytes: 0,
            file_list: Vec::new(),
            hash: None,
        }
    }

    pub fn with_files(mut self, files: Vec<PathBuf>) -> Self {
        self.file_list = files;
        self
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Files under `content_path` in path order, with their total size.
    ///
    /// A file path yields itself. Unreadable entries are skipped.
    pub fn scan_content_path(content_path: &Path) -> std::io::Result<(Vec<PathBuf>, u64)> {
        let metadata = std::fs::metadata(content_path)?;
        if metadata.is_file() {
            return Ok((vec![content_path.to_path_buf()], metadata.len()));
        }

        let mut files = Vec::new();
        let mut total = 0u64;
        for entry in WalkDir::new(content_path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            total += entry.metadata().map(|m| m.len()).unwrap_or(0);
            files.push(entry.into_path());
        }
        Ok((files, total))
    }

    /// Files with an allowed extension, in file-list order.
    pub fn media_files(&self, filters: &FilterConfig) -> Vec<PathBuf> {
        self.file_list
            .iter()
            .filter(|f| filters.allows_extension(f))
            .cloned()
            .collect()
    }
}
