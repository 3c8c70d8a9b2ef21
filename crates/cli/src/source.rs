//! Resolving the torrent's file list.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use playdv_core::{TorrentClient, TorrentJob};

use crate::args::Args;

/// Build the job for this invocation.
///
/// With a hash and a reachable client the file list comes from qBittorrent.
/// Otherwise, or when the client fails, the content path is walked.
pub async fn resolve_job(args: &Args, client: Option<&dyn TorrentClient>) -> Result<TorrentJob> {
    let from_client = match (client, args.hash.as_deref()) {
        (Some(client), Some(hash)) => match client_files(client, hash, &args.content_path).await {
            Ok(listing) => Some(listing),
            Err(e) => {
                warn!(hash, error = %e, "Could not list torrent files, walking content path");
                None
            }
        },
        _ => None,
    };

    let (files, listed_size) = match from_client {
        Some(listing) => listing,
        None => TorrentJob::scan_content_path(&args.content_path).with_context(|| {
            format!("Failed to read content path {}", args.content_path.display())
        })?,
    };

    let size = args.size.unwrap_or(listed_size);
    debug!(files = files.len(), size, "Resolved torrent contents");

    let mut job = TorrentJob::new(&args.name, &args.category, &args.content_path)
        .with_files(files)
        .with_size(size);
    if let Some(hash) = &args.hash {
        job = job.with_hash(hash);
    }
    Ok(job)
}

async fn client_files(
    client: &dyn TorrentClient,
    hash: &str,
    content_path: &Path,
) -> Result<(Vec<PathBuf>, u64)> {
    let info = client.get_torrent(hash).await?;
    let files = client.list_files(hash).await?;

    let save_path = info
        .save_path
        .or_else(|| content_path.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    let size = files.iter().map(|f| f.size_bytes).sum();
    let paths = files.iter().map(|f| f.absolute_path(&save_path)).collect();
    Ok((paths, size))
}
