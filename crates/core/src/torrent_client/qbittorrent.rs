//! qBittorrent WebUI (API v2) client.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::QBittorrentConfig;

use super::{TorrentClient, TorrentClientError, TorrentFile, TorrentInfo};

/// qBittorrent client implementation.
pub struct QBittorrentClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    /// Set once a login succeeded; the session cookie lives in the jar.
    session: Arc<RwLock<bool>>,
}

impl QBittorrentClient {
    /// Create a new qBittorrent client.
    pub fn new(config: &QBittorrentConfig) -> Result<Self, TorrentClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_secs)))
            .cookie_store(true)
            .build()
            .map_err(|e| {
                TorrentClientError::Internal(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            username: config.username.clone(),
            password: config.password.clone(),
            session: Arc::new(RwLock::new(false)),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Login and store session cookie.
    async fn login(&self) -> Result<(), TorrentClientError> {
        let params = [
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ];

        let response = self
            .client
            .post(self.url("/api/v2/auth/login"))
            .form(&params)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if body.contains("Ok.") {
            debug!("qBittorrent login successful");
            *self.session.write().await = true;
            Ok(())
        } else if body.contains("Fails.") || status == StatusCode::FORBIDDEN {
            Err(TorrentClientError::AuthenticationFailed(
                "Invalid credentials".to_string(),
            ))
        } else {
            Err(TorrentClientError::AuthenticationFailed(format!(
                "Unexpected response: {}",
                body.chars().take(100).collect::<String>()
            )))
        }
    }

    /// Ensure we have a valid session, logging in if needed.
    async fn ensure_authenticated(&self) -> Result<(), TorrentClientError> {
        if *self.session.read().await {
            return Ok(());
        }
        self.login().await
    }

    /// Send an authenticated request, logging in again once on 403.
    async fn send<F>(&self, hash: &str, build: F) -> Result<String, TorrentClientError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        self.ensure_authenticated().await?;

        let mut response = build(&self.client).send().await.map_err(map_request_error)?;
        if response.status() == StatusCode::FORBIDDEN {
            warn!("qBittorrent session expired, re-authenticating");
            *self.session.write().await = false;
            self.login().await?;
            response = build(&self.client).send().await.map_err(map_request_error)?;
        }

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TorrentClientError::TorrentNotFound(hash.to_string()));
        }
        if !status.is_success() {
            return Err(TorrentClientError::ApiError(format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| TorrentClientError::ApiError(e.to_string()))
    }
}

fn map_request_error(e: reqwest::Error) -> TorrentClientError {
    if e.is_timeout() {
        TorrentClientError::Timeout
    } else if e.is_connect() {
        TorrentClientError::ConnectionFailed(e.to_string())
    } else {
        TorrentClientError::ApiError(e.to_string())
    }
}

/// qBittorrent torrent info response.
#[derive(Debug, Deserialize)]
struct QBTorrentInfo {
    hash: String,
    name: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    save_path: String,
    #[serde(default)]
    content_path: String,
    #[serde(default)]
    size: i64,
    #[serde(default)]
    progress: f64,
    #[serde(default)]
    tags: String,
}

impl QBTorrentInfo {
    fn into_torrent_info(self) -> TorrentInfo {
        TorrentInfo {
            hash: self.hash.to_lowercase(),
            name: self.name,
            category: non_empty(self.category),
            save_path: non_empty(self.save_path).map(PathBuf::from),
            content_path: non_empty(self.content_path).map(PathBuf::from),
            size_bytes: self.size.max(0) as u64,
            progress: self.progress,
            tags: self
                .tags
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

/// qBittorrent file entry response.
#[derive(Debug, Deserialize)]
struct QBTorrentFile {
    name: String,
    #[serde(default)]
    size: i64,
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn parse_torrent_list(body: &str) -> Result<Vec<TorrentInfo>, TorrentClientError> {
    let torrents: Vec<QBTorrentInfo> = serde_json::from_str(body)
        .map_err(|e| TorrentClientError::ApiError(format!("Failed to parse response: {}", e)))?;
    Ok(torrents.into_iter().map(QBTorrentInfo::into_torrent_info).collect())
}

fn parse_file_list(body: &str) -> Result<Vec<TorrentFile>, TorrentClientError> {
    let files: Vec<QBTorrentFile> = serde_json::from_str(body)
        .map_err(|e| TorrentClientError::ApiError(format!("Failed to parse response: {}", e)))?;
    Ok(files
        .into_iter()
        .map(|f| TorrentFile {
            name: f.name,
            size_bytes: f.size.max(0) as u64,
        })
        .collect())
}

#[async_trait]
impl TorrentClient for QBittorrentClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn get_torrent(&self, hash: &str) -> Result<TorrentInfo, TorrentClientError> {
        let hash_lower = hash.to_lowercase();
        let url = self.url(&format!(
            "/api/v2/torrents/info?hashes={}",
            urlencoding::encode(&hash_lower)
        ));
        let body = self.send(hash, |client| client.get(&url)).await?;

        parse_torrent_list(&body)?
            .into_iter()
            .next()
            .ok_or_else(|| TorrentClientError::TorrentNotFound(hash.to_string()))
    }

    async fn list_files(&self, hash: &str) -> Result<Vec<TorrentFile>, TorrentClientError> {
        let hash_lower = hash.to_lowercase();
        let url = self.url(&format!(
            "/api/v2/torrents/files?hash={}",
            urlencoding::encode(&hash_lower)
        ));
        let body = self.send(hash, |client| client.get(&url)).await?;
        parse_file_list(&body)
    }

    async fn add_tags(&self, hash: &str, tags: &[&str]) -> Result<(), TorrentClientError> {
        let hash_lower = hash.to_lowercase();
        let joined = tags.join(",");
        let url = self.url("/api/v2/torrents/addTags");
        self.send(hash, |client| {
            client
                .post(&url)
                .form(&[("hashes", hash_lower.as_str()), ("tags", joined.as_str())])
        })
        .await?;
        debug!(hash = %hash_lower, tags = %joined, "Tagged torrent");
        Ok(())
    }
}
