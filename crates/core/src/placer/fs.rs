//! Filesystem placement.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use super::error::PlacerError;

/// Linux errno for cross-device links.
const EXDEV: i32 = 18;

/// How a file reached its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementMethod {
    Renamed,
    Copied,
}

impl PlacementMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementMethod::Renamed => "renamed",
            PlacementMethod::Copied => "copied",
        }
    }
}

/// Move `source` to `destination`, replacing any existing file.
pub async fn place(source: &Path, destination: &Path) -> Result<PlacementMethod, PlacerError> {
    if source == destination {
        return Ok(PlacementMethod::Renamed);
    }
    if !fs::try_exists(source).await.unwrap_or(false) {
        return Err(PlacerError::SourceNotFound {
            path: source.to_path_buf(),
        });
    }

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| PlacerError::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }

    if try_rename(source, destination).await? {
        debug!(from = %source.display(), to = %destination.display(), "Renamed output");
        return Ok(PlacementMethod::Renamed);
    }

    let partial = partial_path(destination);
    if let Err(error) = fs::copy(source, &partial).await {
        discard(&partial).await;
        return Err(PlacerError::CopyFailed {
            from: source.to_path_buf(),
            to: partial,
            error,
        });
    }
    if let Err(error) = fs::rename(&partial, destination).await {
        discard(&partial).await;
        return Err(PlacerError::MoveFailed {
            from: partial,
            to: destination.to_path_buf(),
            error,
        });
    }
    if let Err(e) = fs::remove_file(source).await {
        warn!(path = %source.display(), error = %e, "Failed to remove staged file after copy");
    }

    debug!(
        from = %source.display(),
        to = %destination.display(),
        "Copied output across filesystems"
    );
    Ok(PlacementMethod::Copied)
}

/// Delete a source file that was converted successfully.
pub async fn delete_source(path: &Path) -> Result<(), PlacerError> {
    fs::remove_file(path)
        .await
        .map_err(|error| PlacerError::DeleteFailed {
            path: path.to_path_buf(),
            error,
        })
}

/// Remove a leftover staging or partial file. A missing file is not an error.
pub async fn discard(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed leftover file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove leftover file"),
    }
}

/// Returns `Ok(false)` when the rename crosses filesystems.
async fn try_rename(source: &Path, destination: &Path) -> Result<bool, PlacerError> {
    match fs::rename(source, destination).await {
        Ok(()) => Ok(true),
        Err(e)
            if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(EXDEV) =>
        {
            Ok(false)
        }
        Err(error) => Err(PlacerError::MoveFailed {
            from: source.to_path_buf(),
            to: destination.to_path_buf(),
            error,
        }),
    }
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(".partial");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_place_renames_into_new_directory() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("staging/job/a.mp4");
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        std::fs::write(&source, b"converted").unwrap();

        let destination = dir.path().join("library/Show/a.mp4");
        let method = place(&source, &destination).await.unwrap();

        assert_eq!(method, PlacementMethod::Renamed);
        assert!(!source.exists());
        assert_eq!(std::fs::read(&destination).unwrap(), b"converted");
        assert!(!partial_path(&destination).exists());
    }

    #[tokio::test]
    async fn test_place_replaces_existing_destination() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("new.mp4");
        let destination = dir.path().join("out.mp4");
        std::fs::write(&source, b"new").unwrap();
        std::fs::write(&destination, b"old").unwrap();

        place(&source, &destination).await.unwrap();
        assert_eq!(std::fs::read(&destination).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_place_missing_source() {
        let dir = TempDir::new().unwrap();
        let result = place(&dir.path().join("missing.mp4"), &dir.path().join("out.mp4")).await;
        assert!(matches!(result, Err(PlacerError::SourceNotFound { .. })));
    }

    #[tokio::test]
    async fn test_place_same_path_is_noop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.mp4");
        std::fs::write(&path, b"x").unwrap();
        assert_eq!(place(&path, &path).await.unwrap(), PlacementMethod::Renamed);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_delete_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.mkv");
        std::fs::write(&path, b"x").unwrap();

        delete_source(&path).await.unwrap();
        assert!(!path.exists());
        assert!(matches!(
            delete_source(&path).await,
            Err(PlacerError::DeleteFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_discard_removes_file_and_ignores_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.mp4");
        std::fs::write(&path, b"partial").unwrap();

        discard(&path).await;
        assert!(!path.exists());
        discard(&path).await;
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("/lib/a.mp4")),
            PathBuf::from("/lib/a.mp4.partial")
        );
    }
}
